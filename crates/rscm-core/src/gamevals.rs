//! Restricted scanner for `gamevals.toml` fragments
//!
//! This is intentionally not a general TOML parser. The recognized grammar is
//! exactly: a section header `[gamevals.<prefix>]` on its own line, `#`
//! comment lines, blank lines, and flat `key = value` pairs attached to the
//! most recent section. Anything else is skipped, never fatal.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Lines matching this open a new prefix context.
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[gamevals\.([^\]]+)\]$").unwrap());

/// One key/value pair found in a gamevals fragment, with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    pub prefix: String,
    pub key: String,
    pub value: String,
    /// 0-based line index of the `key = value` line in the scanned file.
    pub line: usize,
}

/// Result of scanning one `gamevals.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GamevalScan {
    /// Every prefix whose section header appeared, in order of first
    /// appearance. A section with no pairs still registers its prefix.
    pub sections: Vec<String>,
    pub entries: Vec<ScannedEntry>,
}

/// Scan one file's contents for `[gamevals.*]` sections.
///
/// A single pass yields both values and per-entry position, so provenance
/// bookkeeping can never disagree with value bookkeeping. Key/value lines
/// before any section header, and lines without `=`, are skipped.
pub fn scan_gamevals(contents: &str) -> GamevalScan {
    let mut scan = GamevalScan::default();
    let mut current_prefix: Option<String> = None;

    for (line_index, raw) in contents.lines().enumerate() {
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(captures) = SECTION_RE.captures(trimmed) {
            let prefix = captures[1].to_string();
            if !scan.sections.contains(&prefix) {
                scan.sections.push(prefix.clone());
            }
            current_prefix = Some(prefix);
            continue;
        }

        let Some(prefix) = &current_prefix else {
            continue;
        };
        let Some((key, value)) = trimmed.split_once('=') else {
            // Unparseable fragment line: skip, keep scanning.
            continue;
        };
        scan.entries.push(ScannedEntry {
            prefix: prefix.clone(),
            key: key.trim().to_string(),
            value: value.trim().to_string(),
            line: line_index,
        });
    }

    scan
}

/// Recursively collect every file literally named `gamevals.toml` under a
/// directory, sorted lexicographically by full path.
///
/// The sort gives a deterministic merge order across platforms; filesystem
/// enumeration order is not stable and must not leak into merge results.
pub fn find_gamevals_files(directory: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(directory)
        .standard_filters(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| path.file_name().is_some_and(|name| name == "gamevals.toml"))
        .collect();
    files.sort();
    files
}
