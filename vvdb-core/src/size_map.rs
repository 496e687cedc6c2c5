use anyhow::{anyhow, bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::walk::{slash_path, walk_files, OnWalkError};

pub const JS_VAR: &str = "fileSizesByFilePath";

/// Include/exclude globs over `/`-separated paths. No includes means "all".
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl PathFilter {
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self> {
        let mut incb = GlobSetBuilder::new();
        let mut excb = GlobSetBuilder::new();
        for g in includes {
            incb.add(Glob::new(g).with_context(|| format!("bad include glob {g:?}"))?);
        }
        for g in excludes {
            excb.add(Glob::new(g).with_context(|| format!("bad exclude glob {g:?}"))?);
        }
        Ok(Self { include: incb.build()?, exclude: excb.build()? })
    }

    pub fn all() -> Self {
        Self { include: GlobSet::empty(), exclude: GlobSet::empty() }
    }

    pub fn accepts(&self, path: &str) -> bool {
        (self.include.is_empty() || self.include.is_match(path)) && !self.exclude.is_match(path)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SizeMap {
    pub entries: BTreeMap<String, u64>,
    /// Input directories that were not on disk.
    pub missing: Vec<PathBuf>,
    /// Entries inside existing directories that could not be read.
    #[serde(default)]
    pub unreadable: Vec<PathBuf>,
}

/// Record the size of every file under each existing directory. Missing
/// directories and unreadable entries are noted and skipped.
pub fn collect(dirs: &[PathBuf], filter: &PathFilter) -> Result<SizeMap> {
    let mut map = SizeMap::default();
    for dir in dirs {
        if !dir.exists() {
            debug!("directory not found: {}", dir.display());
            map.missing.push(dir.clone());
            continue;
        }
        let before = map.entries.len();
        let walked = walk_files(dir, OnWalkError::Skip)?;
        map.unreadable.extend(walked.unreadable);
        for fe in walked.files {
            let key = slash_path(&fe.path);
            if filter.accepts(&key) {
                map.entries.insert(key, fe.size);
            }
        }
        debug!("{}: {} file(s)", dir.display(), map.entries.len() - before);
    }
    if !map.unreadable.is_empty() {
        warn!("{} unreadable entries left out of the size map", map.unreadable.len());
    }
    Ok(map)
}

fn js_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Write the map as a CommonJS module exporting `fileSizesByFilePath`.
pub fn write_js<W: Write>(map: &SizeMap, mut w: W) -> Result<()> {
    writeln!(w, "const {JS_VAR} = {{")?;
    for (path, size) in &map.entries {
        writeln!(w, "  {}: {},", js_quote(path), size)?;
    }
    writeln!(w, "}};")?;
    writeln!(w, "module.exports = {{ {JS_VAR} }};")?;
    Ok(())
}

pub fn write_json<W: Write>(map: &SizeMap, w: W) -> Result<()> {
    serde_json::to_writer_pretty(w, &map.entries)?;
    Ok(())
}

fn parse_entry(line: &str) -> Result<(String, u64)> {
    let mut chars = line.chars();
    if chars.next() != Some('\'') {
        bail!("expected quoted key in {line:?}");
    }
    let mut key = String::new();
    loop {
        match chars.next() {
            Some('\\') => match chars.next() {
                Some('n') => key.push('\n'),
                Some('r') => key.push('\r'),
                Some(c) => key.push(c),
                None => bail!("dangling escape in {line:?}"),
            },
            Some('\'') => break,
            Some(c) => key.push(c),
            None => bail!("unterminated key in {line:?}"),
        }
    }
    let rest: String = chars.collect();
    let value = rest
        .trim()
        .strip_prefix(':')
        .and_then(|v| v.trim().strip_suffix(','))
        .ok_or_else(|| anyhow!("expected `: <size>,` in {line:?}"))?;
    let size = value
        .trim()
        .parse()
        .with_context(|| format!("bad size in {line:?}"))?;
    Ok((key, size))
}

/// Read back a module produced by [`write_js`].
pub fn parse_js(text: &str) -> Result<BTreeMap<String, u64>> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let open = format!("const {JS_VAR} = {{");
    if lines.next() != Some(open.as_str()) {
        bail!("missing `{open}` header");
    }
    let mut out = BTreeMap::new();
    for line in lines.by_ref() {
        if line == "};" {
            break;
        }
        let (k, v) = parse_entry(line)?;
        out.insert(k, v);
    }
    let export = format!("module.exports = {{ {JS_VAR} }};");
    if lines.next() != Some(export.as_str()) {
        bail!("missing `{export}` footer");
    }
    Ok(out)
}

/// Write `map` to `out` in the format picked by its extension: `.json` gives
/// JSON, anything else the JS module.
pub fn write_file(map: &SizeMap, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let f = std::fs::File::create(out).with_context(|| format!("create {}", out.display()))?;
    let w = std::io::BufWriter::new(f);
    if out.extension().map(|e| e == "json").unwrap_or(false) {
        write_json(map, w)
    } else {
        write_js(map, w)
    }
}
