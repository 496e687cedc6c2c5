//! Extend a fixed-length frame sequence into a longer one.
//!
//! The source folder holds exactly one cycle of frames. Output cycles
//! alternate between forward and reverse order so that playback loops
//! without a jump. Every copy is renamed with a 5-digit running number.

use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::DatasetError;
use crate::progress::Progress;

pub const DEFAULT_CYCLE_LENGTH: usize = 300;

#[derive(Clone, Debug)]
pub struct DuplicateConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub total: usize,
    pub cycle_length: usize,
    /// Compare blake3 digests of every copy with its source afterwards.
    pub verify: bool,
}

impl DuplicateConfig {
    pub fn new(input: &Path, output: &Path, total: usize) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            total,
            cycle_length: DEFAULT_CYCLE_LENGTH,
            verify: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyStep {
    pub cycle: usize,
    pub source_index: usize,
    /// 1-based running number across all cycles.
    pub number: usize,
    pub src: PathBuf,
    pub dst: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct DuplicateReport {
    pub copied: usize,
    pub cycles: usize,
    pub verified: usize,
}

/// Keep the first `_` token, replace the second with `number` (5 digits,
/// zero padded) and keep the rest as is.
pub fn renumber(name: &str, number: usize) -> String {
    let parts: Vec<&str> = name.split('_').collect();
    let rest = parts.get(2..).map(|r| r.join("_")).unwrap_or_default();
    format!("{}_{:05}_{}", parts[0], number, rest)
}

/// Source index feeding output position `i` of `cycle`.
pub fn source_index(cycle: usize, i: usize, cycle_length: usize) -> usize {
    if cycle % 2 == 0 {
        i
    } else {
        cycle_length - 1 - i
    }
}

/// `<dataset>_<total>f/<sequence>/<variant>` next to the source dataset, for an
/// input laid out as `<dataset>/<sequence>/<variant>`.
pub fn default_output_dir(input: &Path, total: usize) -> Result<PathBuf> {
    let variant = input
        .file_name()
        .ok_or_else(|| anyhow!("input {:?} has no folder name", input))?;
    let sequence_dir = input
        .parent()
        .ok_or_else(|| anyhow!("input {:?} has no parent", input))?;
    let sequence = sequence_dir
        .file_name()
        .ok_or_else(|| anyhow!("input {:?} has no sequence folder", input))?;
    let dataset_dir = sequence_dir
        .parent()
        .ok_or_else(|| anyhow!("input {:?} has no dataset folder", input))?;
    let dataset = dataset_dir
        .file_name()
        .ok_or_else(|| anyhow!("input {:?} has no dataset folder", input))?;

    let mut extended = dataset.to_os_string();
    extended.push(format!("_{}f", total));
    let base = dataset_dir.parent().unwrap_or_else(|| Path::new(""));
    Ok(base.join(extended).join(sequence).join(variant))
}

fn sorted_source_names(input: &Path) -> Result<Vec<OsString>> {
    let mut names = Vec::new();
    for ent in fs::read_dir(input).with_context(|| format!("list {}", input.display()))? {
        names.push(ent?.file_name());
    }
    names.sort();
    Ok(names)
}

/// Check the preconditions and lay out every copy. Touches nothing but the
/// source listing.
pub fn plan(cfg: &DuplicateConfig) -> Result<Vec<CopyStep>> {
    if cfg.cycle_length == 0 || cfg.total == 0 || cfg.total % cfg.cycle_length != 0 {
        return Err(DatasetError::TotalNotMultiple {
            total: cfg.total,
            cycle_length: cfg.cycle_length,
        }
        .into());
    }
    let names = sorted_source_names(&cfg.input)?;
    if names.len() != cfg.cycle_length {
        return Err(DatasetError::SourceCount {
            dir: cfg.input.clone(),
            expected: cfg.cycle_length,
            found: names.len(),
        }
        .into());
    }

    let cycles = cfg.total / cfg.cycle_length;
    let mut steps = Vec::with_capacity(cfg.total);
    for cycle in 0..cycles {
        for i in 0..cfg.cycle_length {
            let si = source_index(cycle, i, cfg.cycle_length);
            let number = cycle * cfg.cycle_length + i + 1;
            let name = &names[si];
            steps.push(CopyStep {
                cycle,
                source_index: si,
                number,
                src: cfg.input.join(name),
                dst: cfg.output.join(renumber(&name.to_string_lossy(), number)),
            });
        }
    }
    Ok(steps)
}

fn copy_preserving_mtime(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).with_context(|| format!("copy {} -> {}", src.display(), dst.display()))?;
    let modified = fs::metadata(src)?.modified()?;
    // fs::copy carries the source permissions over, so the copy may be read-only
    let f = open_for_times(dst).with_context(|| format!("open {}", dst.display()))?;
    f.set_modified(modified)
        .with_context(|| format!("set mtime on {}", dst.display()))?;
    Ok(())
}

#[cfg(not(windows))]
fn open_for_times(path: &Path) -> io::Result<File> {
    File::open(path)
}

#[cfg(windows)]
fn open_for_times(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    const FILE_WRITE_ATTRIBUTES: u32 = 0x0100;
    File::options().access_mode(FILE_WRITE_ATTRIBUTES).open(path)
}

fn digest(path: &Path) -> Result<blake3::Hash> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut h = blake3::Hasher::new();
    io::copy(&mut f, &mut h)?;
    Ok(h.finalize())
}

/// Run a plan produced by [`plan`]. Existing destinations are overwritten.
pub fn execute(cfg: &DuplicateConfig, steps: &[CopyStep], progress: &mut Progress) -> Result<DuplicateReport> {
    fs::create_dir_all(&cfg.output).with_context(|| format!("create {}", cfg.output.display()))?;

    progress.set_stage("Copying");
    progress.set_total(steps.len());
    let mut report = DuplicateReport {
        cycles: steps.last().map(|s| s.cycle + 1).unwrap_or(0),
        ..Default::default()
    };
    for step in steps {
        debug!("{} -> {}", step.src.display(), step.dst.display());
        copy_preserving_mtime(&step.src, &step.dst)?;
        report.copied += 1;
        progress.inc();
    }

    if cfg.verify {
        progress.set_stage("Verifying");
        progress.set_total(steps.len());
        for step in steps {
            if digest(&step.src)? != digest(&step.dst)? {
                return Err(DatasetError::CopyMismatch {
                    src: step.src.clone(),
                    dst: step.dst.clone(),
                }
                .into());
            }
            report.verified += 1;
            progress.inc();
        }
    }
    info!(
        "copied {} file(s) in {} cycle(s) into {}",
        report.copied,
        report.cycles,
        cfg.output.display()
    );
    Ok(report)
}

/// `plan` + `execute`.
pub fn duplicate(cfg: &DuplicateConfig, progress: &mut Progress) -> Result<DuplicateReport> {
    let steps = plan(cfg)?;
    execute(cfg, &steps, progress)
}
