//! Provider backed by the merged gameval symbol store

use std::sync::Arc;

use rscm_core::{SymbolStore, VirtualDocuments};

use crate::provider::{Entry, EntrySource, Provider};

/// Serves entries from the current [`SymbolStore`] snapshot. An entry whose
/// key has TOML provenance points at its source file; everything else is
/// binary-sourced and navigates through the synthetic `.dat` view instead.
pub struct GamevalProvider {
    store: Arc<SymbolStore>,
    docs: Arc<VirtualDocuments>,
}

impl GamevalProvider {
    pub fn new(store: Arc<SymbolStore>, docs: Arc<VirtualDocuments>) -> Self {
        GamevalProvider { store, docs }
    }

    pub fn store(&self) -> &Arc<SymbolStore> {
        &self.store
    }

    /// The synthesized document backing this prefix, if the prefix is known.
    pub fn document(&self, prefix: &str) -> Option<Arc<rscm_core::VirtualDocument>> {
        self.docs.get(prefix)
    }
}

impl Provider for GamevalProvider {
    fn name(&self) -> &'static str {
        "gameval"
    }

    fn supports_prefix(&self, prefix: &str) -> bool {
        self.store.current_snapshot().contains_prefix(prefix)
    }

    fn all_entries(&self, prefix: &str) -> anyhow::Result<Vec<Entry>> {
        let snapshot = self.store.current_snapshot();
        let Some(table) = snapshot.table(prefix) else {
            return Ok(Vec::new());
        };
        Ok(table
            .iter()
            .map(|(key, value)| {
                let source = match snapshot.toml_source(prefix, key) {
                    Some(path) => EntrySource::Toml { path: path.clone() },
                    None => EntrySource::Binary,
                };
                Entry {
                    prefix: prefix.to_string(),
                    key: key.clone(),
                    value: value.clone(),
                    source,
                }
            })
            .collect())
    }
}
