use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

impl FileEntry {
    pub fn stat(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        Ok(Self { path: path.to_path_buf(), size })
    }
}

/// How a walk treats entries it cannot read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnWalkError {
    /// Abort with the first error.
    #[default]
    Fail,
    /// Log the entry, remember its path and keep walking.
    Skip,
}

#[derive(Clone, Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<FileEntry>,
    /// Entries left out under `OnWalkError::Skip`.
    pub unreadable: Vec<PathBuf>,
}

/// Regular files under `root`, recursively, in a stable order (entries
/// sorted by file name within each directory). Symlinks to files are listed
/// under their own path with the size of their target.
pub fn files_under(root: &Path) -> Result<Vec<FileEntry>> {
    Ok(walk_files(root, OnWalkError::Fail)?.files)
}

pub fn walk_files(root: &Path, on_error: OnWalkError) -> Result<WalkOutcome> {
    let mut out = WalkOutcome::default();
    for ent in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let ent = match ent {
            Ok(ent) => ent,
            Err(e) if on_error == OnWalkError::Skip => {
                let path = e.path().unwrap_or(root).to_path_buf();
                warn!("skipping unreadable {}: {}", path.display(), e);
                out.unreadable.push(path);
                continue;
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("walk {}", root.display()))),
        };
        let ft = ent.file_type();
        if !(ft.is_file() || (ft.is_symlink() && ent.path().is_file())) {
            continue;
        }
        match FileEntry::stat(ent.path()) {
            Ok(fe) => out.files.push(fe),
            Err(e) if on_error == OnWalkError::Skip => {
                warn!("skipping unreadable {}: {:#}", ent.path().display(), e);
                out.unreadable.push(ent.path().to_path_buf());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Render a path with `/` separators, as used for map keys and glob matching.
pub fn slash_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}
