//! Core data structures for merged gameval tables

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File extension of plain-text mapping files (`<prefix>.rscm`).
pub const MAPPING_EXTENSION: &str = "rscm";

/// One complete, immutable generation of merged table data plus provenance.
///
/// A snapshot is produced by a single scan of every configured mapping
/// directory and published whole; readers never observe a partially merged
/// state. `tables` maps prefix -> key -> value. `provenance` maps
/// `"prefix:key"` to the `gamevals.toml` file that last set that key, and is
/// only populated for TOML-sourced entries — binary-sourced entries carry no
/// provenance at all.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub tables: BTreeMap<String, BTreeMap<String, String>>,
    pub provenance: BTreeMap<String, PathBuf>,
    /// Monotonic reload counter, bumped on every publish.
    pub generation: u64,
}

impl Snapshot {
    /// All key/value pairs for a prefix, if the prefix is known.
    pub fn table(&self, prefix: &str) -> Option<&BTreeMap<String, String>> {
        self.tables.get(prefix)
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.tables.contains_key(prefix)
    }

    /// The TOML file that last set `prefix:key`, or `None` for binary-sourced
    /// (or unknown) entries.
    pub fn toml_source(&self, prefix: &str, key: &str) -> Option<&PathBuf> {
        self.provenance.get(&provenance_key(prefix, key))
    }
}

/// Composite lookup key used by the provenance index.
pub fn provenance_key(prefix: &str, key: &str) -> String {
    format!("{prefix}:{key}")
}
