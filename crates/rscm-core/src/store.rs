//! Merged symbol store with atomic snapshot publication

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use tracing::{debug, info, warn};

use crate::gamevals::{find_gamevals_files, scan_gamevals};
use crate::model::{Snapshot, provenance_key};
use crate::settings::Settings;
use crate::{dat, virtualdoc::VirtualDocuments};

/// Thread-safe cache of every prefix's merged key/value data.
///
/// `reload` scans all configured mapping directories, merges `.dat` and
/// `gamevals.toml` sources, and publishes the result with a single atomic
/// swap. Readers call [`SymbolStore::current_snapshot`] and keep the returned
/// `Arc` for the duration of one query, so a request always sees one
/// internally consistent generation even while a reload races it.
pub struct SymbolStore {
    settings: Arc<Settings>,
    snapshot: ArcSwap<Snapshot>,
    generation: AtomicU64,
}

impl SymbolStore {
    /// Create an empty store. Call [`SymbolStore::reload`] to populate it.
    pub fn new(settings: Arc<Settings>) -> Self {
        SymbolStore {
            settings,
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Lock-free read of the latest published snapshot.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Rescan every configured mapping directory and publish a fresh
    /// snapshot. Per-file decode failures are logged and skipped; one corrupt
    /// file never aborts the reload.
    pub fn reload(&self) -> Arc<Snapshot> {
        let directories = self.settings.effective().mapping_directories;
        let mut snapshot = Snapshot::default();

        for directory in &directories {
            if !directory.is_dir() {
                debug!("skipping missing mapping directory {}", directory.display());
                continue;
            }
            // Within a directory: binary tables first, then TOML fragments,
            // so a TOML definition of the same prefix/key wins.
            self.merge_dat_files(directory, &mut snapshot);
            self.merge_gamevals_files(directory, &mut snapshot);
        }

        snapshot.generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let published = Arc::new(snapshot);
        self.snapshot.store(Arc::clone(&published));
        info!(
            generation = published.generation,
            prefixes = published.tables.len(),
            "published gameval snapshot"
        );
        published
    }

    /// Reload and then invalidate the virtual-document cache, so the next
    /// document access regenerates from the new snapshot.
    pub fn reload_and_invalidate(&self, docs: &VirtualDocuments) -> Arc<Snapshot> {
        let snapshot = self.reload();
        docs.invalidate_all();
        snapshot
    }

    /// Non-recursive `.dat` scan of one directory, file-name order.
    fn merge_dat_files(&self, directory: &Path, snapshot: &mut Snapshot) {
        let entries = match std::fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot list {}: {e}", directory.display());
                return;
            }
        };
        let mut dat_files: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "dat"))
            .collect();
        dat_files.sort();

        for path in dat_files {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("cannot read {}: {e}", path.display());
                    continue;
                }
            };
            let tables = match dat::decode_dat(&bytes) {
                Ok(tables) => tables,
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            for (prefix, entries) in tables {
                let table = snapshot.tables.entry(prefix.clone()).or_default();
                for (key, value) in entries {
                    table.insert(key.clone(), value);
                    // Binary sources carry no provenance; last write wins, so
                    // the key drops any provenance from an earlier source.
                    snapshot.provenance.remove(&provenance_key(&prefix, &key));
                }
            }
        }
    }

    /// Recursive `gamevals.toml` scan of one directory, path order.
    fn merge_gamevals_files(&self, directory: &Path, snapshot: &mut Snapshot) {
        for path in find_gamevals_files(directory) {
            let contents = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    warn!("cannot read {}: {e}", path.display());
                    continue;
                }
            };
            let scan = scan_gamevals(&contents);
            // A section header alone registers its prefix, even with no pairs.
            for prefix in scan.sections {
                snapshot.tables.entry(prefix).or_default();
            }
            for entry in scan.entries {
                snapshot
                    .tables
                    .entry(entry.prefix.clone())
                    .or_default()
                    .insert(entry.key.clone(), entry.value);
                snapshot
                    .provenance
                    .insert(provenance_key(&entry.prefix, &entry.key), path.clone());
            }
        }
    }
}
