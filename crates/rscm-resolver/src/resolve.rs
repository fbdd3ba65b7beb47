//! Reference resolution: `prefix:key` occurrences to navigation targets

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rscm_core::scan_gamevals;
use serde::Serialize;
use tracing::debug;

use crate::provider::{Entry, EntrySource};
use crate::registry::ProviderRegistry;

/// The fixed separator between prefix and key in source text.
pub const SEPARATOR: char = ':';

/// A parsed textual reference. The key may be empty or partial while the user
/// is still typing; completion treats it as a key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub prefix: String,
    pub key: String,
}

impl Reference {
    /// Split `prefix:key` on the first separator. `None` when the separator
    /// is absent or the prefix is empty.
    pub fn parse(text: &str) -> Option<Reference> {
        let (prefix, key) = text.split_once(SEPARATOR)?;
        if prefix.is_empty() {
            return None;
        }
        Some(Reference {
            prefix: prefix.to_string(),
            key: key.to_string(),
        })
    }
}

/// A resolved navigation destination. Pure data: the caller performs the
/// actual editor action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// Open a real file at a position (mapping file, or TOML provenance).
    RealFile {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    /// Open the binary table viewer on a `.dat` file, scrolled to the table
    /// and key.
    BinaryView {
        path: PathBuf,
        prefix: String,
        key: String,
    },
    /// No navigable file exists; show the prefix's entries inline instead.
    Listing {
        prefix: String,
        entries: Vec<(String, String)>,
    },
}

/// One autocompletion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub key: String,
    pub value: String,
    /// Origin label for disambiguation in the UI (file name or synthesized
    /// document name).
    pub source: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// More than one target where the caller expected exactly one. Carries
    /// all candidates; nothing is auto-picked.
    #[error("ambiguous reference: {} candidate targets", .0.len())]
    Ambiguous(Vec<Target>),
}

/// Resolves textual references against the provider registry.
pub struct ReferenceResolver {
    registry: Arc<ProviderRegistry>,
}

impl ReferenceResolver {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        ReferenceResolver { registry }
    }

    /// Apply referential aliases (e.g. `component` -> `interface`) before
    /// querying providers.
    fn canonical_prefix(&self, prefix: &str) -> String {
        let aliases = self.registry.settings().effective().referential_aliases;
        aliases.get(prefix).cloned().unwrap_or_else(|| prefix.to_string())
    }

    /// All targets for a reference, in provider order. "No match" is an
    /// empty list, not an error.
    pub fn resolve(&self, reference: &Reference) -> Vec<Target> {
        let prefix = self.canonical_prefix(&reference.prefix);
        if !self.registry.supports(&prefix) {
            return Vec::new();
        }
        self.registry
            .for_key(&prefix, &reference.key)
            .into_iter()
            .map(|entry| self.target_for(&prefix, entry))
            .collect()
    }

    /// The single best match: `Ok(None)` for no target, `Err(Ambiguous)` when
    /// several exist and the caller wanted exactly one.
    pub fn resolve_single(&self, reference: &Reference) -> Result<Option<Target>, ResolveError> {
        let mut targets = self.resolve(reference);
        match targets.len() {
            0 => Ok(None),
            1 => Ok(Some(targets.remove(0))),
            _ => Err(ResolveError::Ambiguous(targets)),
        }
    }

    /// Candidates whose key starts with the reference's (partial) key.
    pub fn complete(&self, reference: &Reference) -> Vec<Candidate> {
        let prefix = self.canonical_prefix(&reference.prefix);
        if !self.registry.supports(&prefix) {
            return Vec::new();
        }
        self.registry
            .all(&prefix)
            .into_iter()
            .filter(|entry| entry.key.starts_with(&reference.key))
            .map(|entry| Candidate {
                source: entry.source.label(&prefix),
                key: entry.key,
                value: entry.value,
            })
            .collect()
    }

    fn target_for(&self, prefix: &str, entry: Entry) -> Target {
        match entry.source {
            EntrySource::MappingFile { path, line } => {
                let column = mapping_key_column(&path, line, &entry.key);
                Target::RealFile { path, line, column }
            }
            EntrySource::Toml { path } => {
                let (line, column) = locate_in_gamevals(&path, prefix, &entry.key);
                Target::RealFile { path, line, column }
            }
            EntrySource::Binary => match self.find_dat_file(prefix) {
                Some(path) => Target::BinaryView {
                    path,
                    prefix: prefix.to_string(),
                    key: entry.key,
                },
                None => {
                    debug!(prefix, "no .dat file located, falling back to listing");
                    Target::Listing {
                        prefix: prefix.to_string(),
                        entries: self
                            .registry
                            .all(prefix)
                            .into_iter()
                            .map(|e| (e.key, e.value))
                            .collect(),
                    }
                }
            },
        }
    }

    /// Locate the binary file a prefix's tables most plausibly came from:
    /// `<prefix>.dat`, then `gamevals_<prefix>.dat`, across the mapping
    /// directories in configuration order.
    fn find_dat_file(&self, prefix: &str) -> Option<PathBuf> {
        let directories = self.registry.settings().effective().mapping_directories;
        let candidates = [format!("{prefix}.dat"), format!("gamevals_{prefix}.dat")];
        for name in &candidates {
            for directory in &directories {
                let path = directory.join(name);
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }
}

/// Find the exact line/column of `key` inside the `[gamevals.<prefix>]`
/// section of a TOML file, by re-scanning with the same section semantics the
/// merge used. A key under a different prefix section never matches. Falls
/// back to the top of the file when the key has vanished since the snapshot
/// was built.
fn locate_in_gamevals(path: &Path, prefix: &str, key: &str) -> (usize, usize) {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return (0, 0);
    };
    let Some(line) = scan_gamevals(&contents)
        .entries
        .iter()
        .find(|entry| entry.prefix == prefix && entry.key == key)
        .map(|entry| entry.line)
    else {
        return (0, 0);
    };
    let column = contents
        .lines()
        .nth(line)
        .and_then(|raw| raw.find(key))
        .unwrap_or(0);
    (line, column)
}

/// Column of the key on a known mapping-file line, 0 when the file has
/// changed underneath us.
fn mapping_key_column(path: &Path, line: usize, key: &str) -> usize {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|contents| contents.lines().nth(line).and_then(|raw| raw.find(key)))
        .unwrap_or(0)
}
