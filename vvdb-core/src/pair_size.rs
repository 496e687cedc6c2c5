use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::DatasetError;
use crate::pairing::PairingTable;
use crate::walk::{files_under, FileEntry};

/// What to do when a mesh file's image counterpart is absent.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingCounterpart {
    /// Abort the scan with `DatasetError::MissingCounterpart`.
    #[default]
    Fatal,
    /// Leave the pair out of every aggregate.
    Skip,
    /// Count the pair with an image size of zero.
    Zero,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FilePair {
    pub mesh: FileEntry,
    pub image: FileEntry,
}

impl FilePair {
    pub fn combined(&self) -> u64 {
        self.mesh.size + self.image.size
    }
}

/// Aggregates of one pass over a directory tree.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PairScan {
    pub pairs_seen: u64,
    pub total_bytes: u64,
    pub largest: Option<FilePair>,
    pub smallest: Option<FilePair>,
    pub skipped_missing: u64,
}

impl PairScan {
    pub fn push(&mut self, pair: FilePair) {
        let c = pair.combined();
        self.pairs_seen += 1;
        self.total_bytes += c;
        // strict comparisons keep the first pair on ties
        if self.largest.as_ref().map_or(true, |p| c > p.combined()) {
            self.largest = Some(pair.clone());
        }
        if self.smallest.as_ref().map_or(true, |p| c < p.combined()) {
            self.smallest = Some(pair);
        }
    }

    pub fn average(&self) -> Option<f64> {
        if self.pairs_seen == 0 {
            None
        } else {
            Some(self.total_bytes as f64 / self.pairs_seen as f64)
        }
    }
}

/// Walk `root`, pair every mesh file with its image and aggregate combined sizes.
///
/// A root that does not exist scans as empty.
pub fn scan(root: &Path, table: &PairingTable, missing: MissingCounterpart) -> Result<PairScan> {
    let mut out = PairScan::default();
    if !root.exists() {
        warn!("directory not found: {}", root.display());
        return Ok(out);
    }
    for mesh in files_under(root)? {
        let Some(image_path) = table.counterpart(&mesh.path) else {
            continue;
        };
        let image = match std::fs::metadata(&image_path) {
            Ok(md) => FileEntry { path: image_path, size: md.len() },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => match missing {
                MissingCounterpart::Fatal => {
                    return Err(DatasetError::MissingCounterpart {
                        mesh: mesh.path,
                        image: image_path,
                    }
                    .into());
                }
                MissingCounterpart::Skip => {
                    debug!("skipping {}: no {}", mesh.path.display(), image_path.display());
                    out.skipped_missing += 1;
                    continue;
                }
                MissingCounterpart::Zero => FileEntry { path: image_path, size: 0 },
            },
            Err(e) => return Err(anyhow::Error::new(e).context(format!("stat {}", image_path.display()))),
        };
        out.push(FilePair { mesh, image });
    }
    if out.skipped_missing > 0 {
        warn!(
            "{} pair(s) under {} skipped for missing images",
            out.skipped_missing,
            root.display()
        );
    }
    Ok(out)
}

/// Mean combined size over all pairs. Fails with `DatasetError::NoPairs`
/// when nothing was paired.
pub fn average(root: &Path, table: &PairingTable, missing: MissingCounterpart) -> Result<f64> {
    let s = scan(root, table, missing)?;
    s.average().ok_or_else(|| DatasetError::NoPairs(root.to_path_buf()).into())
}

pub fn max(root: &Path, table: &PairingTable, missing: MissingCounterpart) -> Result<Option<FilePair>> {
    Ok(scan(root, table, missing)?.largest)
}

pub fn min(root: &Path, table: &PairingTable, missing: MissingCounterpart) -> Result<Option<FilePair>> {
    Ok(scan(root, table, missing)?.smallest)
}
