//! Synthesized in-memory documents for prefixes without a real mapping file
//!
//! A virtual document is the mapping-file rendering (`key=value` lines) of a
//! prefix's current table, named `temp_<prefix>.rscm` after the convention of
//! the editor tooling this data feeds. Documents are cached per prefix and
//! regenerated lazily after [`VirtualDocuments::invalidate_all`].

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::Snapshot;
use crate::store::SymbolStore;

/// A read-only, non-persisted text view standing in for one prefix.
#[derive(Debug, PartialEq, Eq)]
pub struct VirtualDocument {
    pub prefix: String,
    pub text: String,
    /// Snapshot generation the text was rendered from.
    pub generation: u64,
}

impl VirtualDocument {
    /// Synthesized file name, e.g. `temp_item.rscm`.
    pub fn file_name(&self) -> String {
        synthesized_file_name(&self.prefix)
    }
}

pub fn synthesized_file_name(prefix: &str) -> String {
    format!("temp_{prefix}.{}", crate::model::MAPPING_EXTENSION)
}

/// Per-prefix cache of synthesized documents.
///
/// Within one snapshot generation, repeated `get` calls for a prefix return
/// the identical `Arc`, so identity-based bookkeeping by callers stays stable
/// until the next invalidation.
pub struct VirtualDocuments {
    store: Arc<SymbolStore>,
    docs: DashMap<String, Arc<VirtualDocument>>,
}

impl VirtualDocuments {
    pub fn new(store: Arc<SymbolStore>) -> Self {
        VirtualDocuments {
            store,
            docs: DashMap::new(),
        }
    }

    /// Get or synthesize the document for a prefix. `None` when the current
    /// snapshot has no table for it.
    ///
    /// A cached document is only served while its generation matches the
    /// current snapshot. Rendering and inserting are not atomic relative to
    /// [`VirtualDocuments::invalidate_all`], so an entry rendered from an
    /// older generation can land in the cache after the clear; the generation
    /// check repairs that on the next access instead of serving it forever.
    pub fn get(&self, prefix: &str) -> Option<Arc<VirtualDocument>> {
        let snapshot = self.store.current_snapshot();
        if let Some(doc) = self.docs.get(prefix) {
            if doc.generation == snapshot.generation {
                return Some(Arc::clone(doc.value()));
            }
        }

        let Some(doc) = render(prefix, &snapshot) else {
            // The prefix vanished; drop any stale document for it.
            self.docs.remove(prefix);
            return None;
        };
        let doc = Arc::new(doc);
        let entry = self
            .docs
            .entry(prefix.to_string())
            .and_modify(|existing| {
                if existing.generation != doc.generation {
                    *existing = Arc::clone(&doc);
                }
            })
            // A racing insert for the same generation may have beaten us;
            // keep the cached one so callers keep seeing a single instance.
            .or_insert_with(|| Arc::clone(&doc));
        Some(Arc::clone(entry.value()))
    }

    /// Drop every cached document. Called after each store reload; the next
    /// access regenerates from the new snapshot.
    pub fn invalidate_all(&self) {
        self.docs.clear();
    }

    pub fn cached_count(&self) -> usize {
        self.docs.len()
    }
}

fn render(prefix: &str, snapshot: &Snapshot) -> Option<VirtualDocument> {
    let table = snapshot.table(prefix)?;
    let text = table
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");
    Some(VirtualDocument {
        prefix: prefix.to_string(),
        text,
        generation: snapshot.generation,
    })
}
