use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One row of the mesh -> image substitution table.
///
/// A mesh file such as `Matis_drc0/Matis_00001_qp08_qt06_cl10.drc` maps to
/// `Matis_jp00/Matis_00001_jp00.jpg` by replacing `marker` with
/// `image_marker` and then `quality_suffix` with `image_suffix`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PairingRule {
    pub marker: String,
    pub image_marker: String,
    pub quality_suffix: String,
    pub image_suffix: String,
}

impl PairingRule {
    pub fn new(marker: &str, image_marker: &str, quality_suffix: &str, image_suffix: &str) -> Self {
        Self {
            marker: marker.to_string(),
            image_marker: image_marker.to_string(),
            quality_suffix: quality_suffix.to_string(),
            image_suffix: image_suffix.to_string(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        !self.marker.is_empty() && path.contains(&self.marker)
    }

    /// Replace-all of the marker, then replace-all of the quality suffix.
    pub fn apply(&self, path: &str) -> String {
        path.replace(&self.marker, &self.image_marker)
            .replace(&self.quality_suffix, &self.image_suffix)
    }
}

/// Ordered rule list; the first rule whose marker occurs in a path wins.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct PairingTable {
    pub rules: Vec<PairingRule>,
}

impl PairingTable {
    pub fn new(rules: Vec<PairingRule>) -> Self {
        Self { rules }
    }

    /// Encoder/quality levels shipped with the Draco-Jpeg dataset.
    pub fn dataset() -> Self {
        Self::new(vec![
            PairingRule::new("_drc0", "_jp00", "_qp08_qt06_cl10.drc", "_jp00.jpg"),
            PairingRule::new("_drc1", "_jp10", "_qp10_qt10_cl10.drc", "_jp10.jpg"),
            PairingRule::new("_drc3", "_jp30", "_qp12_qt10_cl10.drc", "_jp30.jpg"),
            PairingRule::new("_drc4", "_jp55", "_qp12_qt12_cl10.drc", "_jp55.jpg"),
        ])
    }

    pub fn rule_for(&self, path: &str) -> Option<&PairingRule> {
        self.rules.iter().find(|r| r.matches(path))
    }

    /// Expected image path for a compressed mesh path, or `None` when the
    /// path carries no known encoder marker.
    pub fn counterpart(&self, mesh: &Path) -> Option<PathBuf> {
        let s = mesh.to_string_lossy();
        self.rule_for(&s).map(|r| PathBuf::from(r.apply(&s)))
    }
}

impl Default for PairingTable {
    fn default() -> Self {
        Self::dataset()
    }
}
