use std::path::PathBuf;
use thiserror::Error;

/// Domain failures that callers may want to tell apart.
///
/// These travel inside `anyhow::Error`; use `err.downcast_ref::<DatasetError>()`
/// to match on them.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("source folder {dir:?} must contain exactly {expected} files, found {found}")]
    SourceCount { dir: PathBuf, expected: usize, found: usize },

    #[error("total {total} is not a positive multiple of cycle length {cycle_length}")]
    TotalNotMultiple { total: usize, cycle_length: usize },

    #[error("counterpart image {image:?} for {mesh:?} not found")]
    MissingCounterpart { mesh: PathBuf, image: PathBuf },

    #[error("no drc-jp file pairs found under {0:?}")]
    NoPairs(PathBuf),

    #[error("copy of {src:?} to {dst:?} does not match its source")]
    CopyMismatch { src: PathBuf, dst: PathBuf },
}
