//! Provider capability trait shared by all entry sources

use std::path::PathBuf;

use serde::Serialize;

/// Where an [`Entry`] came from, which in turn decides how navigation to it
/// behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EntrySource {
    /// A real `<prefix>.rscm` mapping file, at a known line.
    MappingFile { path: PathBuf, line: usize },
    /// A `gamevals.toml` fragment. The line is recovered on demand by
    /// re-scanning the file, not stored here.
    Toml { path: PathBuf },
    /// A binary `.dat` table. No provenance is recorded for these.
    Binary,
}

impl EntrySource {
    /// Human-visible origin label, shown next to completion candidates.
    pub fn label(&self, prefix: &str) -> String {
        match self {
            EntrySource::MappingFile { path, .. } | EntrySource::Toml { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            EntrySource::Binary => rscm_core::virtualdoc::synthesized_file_name(prefix),
        }
    }
}

/// One key/value pair a provider knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub prefix: String,
    pub key: String,
    pub value: String,
    pub source: EntrySource,
}

/// A pluggable source of prefix/key data.
///
/// Providers are held as trait objects in the registry's ordered list;
/// whether a provider participates in a query is decided by effective
/// settings at call time, never baked into the instance.
pub trait Provider: Send + Sync {
    /// Stable name used in logs and settings.
    fn name(&self) -> &'static str;

    fn supports_prefix(&self, prefix: &str) -> bool;

    fn all_entries(&self, prefix: &str) -> anyhow::Result<Vec<Entry>>;

    fn entries_for_key(&self, prefix: &str, key: &str) -> anyhow::Result<Vec<Entry>> {
        Ok(self
            .all_entries(prefix)?
            .into_iter()
            .filter(|entry| entry.key == key)
            .collect())
    }
}
