use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::pairing::PairingTable;

pub const DEFAULT_TOTAL: usize = 1200;
pub const DEFAULT_MAP_OUTPUT: &str = "filepath_to_size_mapping_600f.js";

const SEQUENCES: [&str; 2] = ["Matis", "Rafa2"];
const MAP_VARIANTS: [&str; 8] = ["drc0", "drc1", "drc3", "drc4", "jp00", "jp10", "jp30", "jp55"];

/// Dataset-specific defaults, optionally loaded from a JSON file.
///
/// Every field may be left out of the file and falls back to the values for
/// the vsenseVVDB2 Draco-Jpeg set.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DatasetProfile {
    pub pairing: PairingTable,
    /// Roots scanned by the pair-size reports.
    pub report_dirs: Vec<PathBuf>,
    /// Roots scanned by the max/min reports, the lowest quality level only.
    pub extreme_dirs: Vec<PathBuf>,
    /// Directories recorded by the size-map exporter.
    pub map_dirs: Vec<PathBuf>,
}

impl Default for DatasetProfile {
    fn default() -> Self {
        let report_dirs = SEQUENCES
            .iter()
            .map(|s| PathBuf::from(format!("vsenseVVDB2/{s}_obj_Draco-Jpeg")))
            .collect();
        let extreme_dirs = SEQUENCES
            .iter()
            .map(|s| PathBuf::from(format!("vsenseVVDB2/{s}_obj_Draco-Jpeg/{s}_drc0")))
            .collect();
        let map_dirs = SEQUENCES
            .iter()
            .flat_map(|s| {
                MAP_VARIANTS
                    .iter()
                    .map(move |v| PathBuf::from(format!("vsenseVVDB2_600f/{s}_obj_Draco-Jpeg/{s}_{v}")))
            })
            .collect();
        Self { pairing: PairingTable::dataset(), report_dirs, extreme_dirs, map_dirs }
    }
}

impl DatasetProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("open profile {}", path.display()))?;
        serde_json::from_reader(f).with_context(|| format!("parse profile {}", path.display()))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
