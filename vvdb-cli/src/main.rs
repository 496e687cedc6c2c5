use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vvdb_core::duplicate::{self, DuplicateConfig, DEFAULT_CYCLE_LENGTH};
use vvdb_core::pair_size::{self, FilePair, MissingCounterpart};
use vvdb_core::profile::{DatasetProfile, DEFAULT_MAP_OUTPUT, DEFAULT_TOTAL};
use vvdb_core::progress::Progress;
use vvdb_core::prompt::{confirm, CONTINUE_PROMPT};
use vvdb_core::size_map::{self, PathFilter};

const EMPTY_DIR: &str = "The directory is empty or contains no files.";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Missing { Fatal, Skip, Zero }

impl From<Missing> for MissingCounterpart {
    fn from(m: Missing) -> Self {
        match m {
            Missing::Fatal => MissingCounterpart::Fatal,
            Missing::Skip => MissingCounterpart::Skip,
            Missing::Zero => MissingCounterpart::Zero,
        }
    }
}

#[derive(Parser)]
#[command(name = "vvdb", version, about = "Maintenance tools for the volumetric-video test dataset")]
struct Cli {
    /// JSON dataset profile overriding the pairing table and directory lists
    #[arg(long, global = true)]
    profile: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Warnings and errors only
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// What to do when a mesh has no image counterpart
    #[arg(long, value_enum, default_value_t = Missing::Fatal)]
    missing: Missing,
    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Roots to scan (defaults to the profile's dirs for this report)
    dirs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Extend a one-cycle frame folder into a longer forward/reverse sequence
    Duplicate {
        /// Folder holding exactly one cycle of frames
        #[arg(long)]
        input: PathBuf,
        /// Destination folder (defaults to <dataset>_<total>f/<sequence>/<variant>)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of output files, a multiple of the cycle length
        #[arg(long, default_value_t = DEFAULT_TOTAL)]
        total: usize,
        #[arg(long, default_value_t = DEFAULT_CYCLE_LENGTH)]
        cycle_length: usize,
        /// Do not ask for confirmation
        #[arg(short, long, default_value_t = false)]
        yes: bool,
        /// Hash every copy against its source afterwards
        #[arg(long, default_value_t = false)]
        verify: bool,
    },
    /// Average combined size of drc-jp file pairs
    Avg(ReportArgs),
    /// Largest drc-jp file pair
    Max(ReportArgs),
    /// Smallest drc-jp file pair
    Min(ReportArgs),
    /// Export a path -> size mapping as a JS module (or JSON with a .json output)
    SizeMap {
        #[arg(long, default_value = DEFAULT_MAP_OUTPUT)]
        output: PathBuf,
        #[arg(long)] include: Vec<String>,
        #[arg(long)] exclude: Vec<String>,
        /// Re-read the written file and check the entry count
        #[arg(long, default_value_t = false)]
        check: bool,
        /// Directories to record (defaults to the profile's map dirs)
        dirs: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy)]
enum Extreme { Max, Min }

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose { "debug" } else if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let profile = DatasetProfile::load_or_default(cli.profile.as_deref())?;
    match cli.cmd {
        Cmd::Duplicate { input, output, total, cycle_length, yes, verify } => {
            duplicate_cmd(&input, output, total, cycle_length, yes, verify)?
        }
        Cmd::Avg(args) => average_cmd(&profile, args)?,
        Cmd::Max(args) => extreme_cmd(&profile, args, Extreme::Max)?,
        Cmd::Min(args) => extreme_cmd(&profile, args, Extreme::Min)?,
        Cmd::SizeMap { output, include, exclude, check, dirs } => {
            size_map_cmd(&profile, &output, &include, &exclude, check, dirs)?
        }
    }
    Ok(())
}

fn duplicate_cmd(input: &Path, output: Option<PathBuf>, total: usize, cycle_length: usize, yes: bool, verify: bool) -> Result<()> {
    let output = match output {
        Some(o) => o,
        None => duplicate::default_output_dir(input, total)?,
    };
    println!();
    println!("input_folder: {}", input.display());
    println!("output_folder: {}", output.display());
    println!();

    let cfg = DuplicateConfig {
        input: input.to_path_buf(),
        output,
        total,
        cycle_length,
        verify,
    };
    let steps = duplicate::plan(&cfg)?;

    if !yes && !confirm(CONTINUE_PROMPT, io::stdin().lock(), io::stdout())? {
        println!("Aborted.");
        return Ok(());
    }

    let mut prog = Progress::new(true).every(cycle_length.max(1));
    let report = duplicate::execute(&cfg, &steps, &mut prog)?;
    if verify {
        info!("verified {} copies", report.verified);
    }
    println!("Files duplicated and saved successfully.");
    Ok(())
}

fn dirs_or(defaults: &[PathBuf], dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    if dirs.is_empty() { defaults.to_vec() } else { dirs }
}

fn pair_label(p: &FilePair) -> String {
    format!("['{}', '{}']", p.mesh.path.display(), p.image.path.display())
}

fn average_cmd(profile: &DatasetProfile, args: ReportArgs) -> Result<()> {
    let missing = args.missing.into();
    let mut rows = Vec::new();
    for dir in dirs_or(&profile.report_dirs, args.dirs) {
        let avg = pair_size::average(&dir, &profile.pairing, missing)?;
        if args.json {
            rows.push(serde_json::json!({ "dir": dir, "avg_bytes": avg }));
        } else {
            println!("\nChecking dir: {}", dir.display());
            println!("Avg. size across drc-jp file pairs of all levels: {:?} bytes", avg);
        }
    }
    if args.json {
        print_json(&rows)?;
    }
    Ok(())
}

fn extreme_cmd(profile: &DatasetProfile, args: ReportArgs, which: Extreme) -> Result<()> {
    let missing = args.missing.into();
    let mut rows = Vec::new();
    for dir in dirs_or(&profile.extreme_dirs, args.dirs) {
        let found = match which {
            Extreme::Max => pair_size::max(&dir, &profile.pairing, missing)?,
            Extreme::Min => pair_size::min(&dir, &profile.pairing, missing)?,
        };
        if args.json {
            rows.push(serde_json::json!({
                "dir": dir,
                "pair": found,
                "bytes": found.as_ref().map(FilePair::combined),
            }));
            continue;
        }
        let Some(pair) = found else {
            println!("{EMPTY_DIR}");
            continue;
        };
        let (adj, abbr) = match which {
            Extreme::Max => ("largest", "Max."),
            Extreme::Min => ("smallest", "Min."),
        };
        println!("\nChecking dir: {}", dir.display());
        println!("The {} file pair is: {}", adj, pair_label(&pair));
        println!("{} size across drc-jp file pairs: {} bytes", abbr, pair.combined());
    }
    if args.json {
        print_json(&rows)?;
    }
    Ok(())
}

fn print_json(rows: &[serde_json::Value]) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, rows)?;
    writeln!(out)?;
    Ok(())
}

fn size_map_cmd(profile: &DatasetProfile, output: &Path, include: &[String], exclude: &[String], check: bool, dirs: Vec<PathBuf>) -> Result<()> {
    let dirs = dirs_or(&profile.map_dirs, dirs);
    let filter = PathFilter::new(include, exclude)?;
    let map = size_map::collect(&dirs, &filter)?;
    for d in &map.missing {
        println!("Directory not found: {}", d.display());
    }
    size_map::write_file(&map, output)?;

    if check {
        let text = std::fs::read_to_string(output).with_context(|| format!("read back {}", output.display()))?;
        let n = if output.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&text)?.len()
        } else {
            size_map::parse_js(&text)?.len()
        };
        anyhow::ensure!(n == map.entries.len(), "wrote {} entries but read back {}", map.entries.len(), n);
        info!("checked {} entries in {}", n, output.display());
    }
    println!("File sizes have been saved to {}", output.display());
    Ok(())
}
