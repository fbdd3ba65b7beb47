//! Filesystem watcher implementation
//!
//! The notify callback does nothing but filter and forward onto an unbounded
//! channel; decoding and snapshot publication happen on the async consumer
//! side, so the thread delivering a change event is never blocked.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rscm_core::{SymbolStore, VirtualDocuments};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the file watcher, already filtered to relevant files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Modified(p) | WatchEvent::Removed(p) => p,
        }
    }
}

/// Watches the configured mapping directories for `.dat` / `.toml` changes.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    watched: Vec<PathBuf>,
}

impl FileWatcher {
    /// Create a watcher filtering to the given mapping directories. Watching
    /// starts after [`FileWatcher::watch_all`].
    pub fn new(mapping_directories: Vec<PathBuf>) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let normalized_dirs: Vec<String> = mapping_directories
            .iter()
            .map(|dir| normalize_path(dir))
            .collect();

        let watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    debug!("filesystem event: {event:?}");
                    handle_notify_event(event, &normalized_dirs, &event_tx);
                }
                Err(e) => {
                    error!("filesystem watch error: {e}");
                }
            })?;

        Ok(FileWatcher {
            watcher,
            event_rx,
            watched: mapping_directories,
        })
    }

    /// Start watching every configured directory recursively. Missing
    /// directories are skipped with a warning.
    pub fn watch_all(&mut self) -> Result<()> {
        for dir in self.watched.clone() {
            if !dir.is_dir() {
                warn!("not watching missing directory {}", dir.display());
                continue;
            }
            info!("watching {}", dir.display());
            self.watcher.watch(&dir, RecursiveMode::Recursive)?;
        }
        Ok(())
    }

    pub fn event_receiver(&mut self) -> &mut mpsc::UnboundedReceiver<WatchEvent> {
        &mut self.event_rx
    }
}

fn handle_notify_event(
    event: notify::Event,
    normalized_dirs: &[String],
    event_tx: &mpsc::UnboundedSender<WatchEvent>,
) {
    let make: fn(PathBuf) -> WatchEvent = match event.kind {
        notify::EventKind::Create(_) => WatchEvent::Created,
        notify::EventKind::Modify(_) => WatchEvent::Modified,
        notify::EventKind::Remove(_) => WatchEvent::Removed,
        _ => return,
    };
    for path in event.paths {
        if !is_relevant(&path, normalized_dirs) {
            continue;
        }
        if let Err(e) = event_tx.send(make(path)) {
            warn!("failed to forward watch event: {e}");
        }
    }
}

/// A `.dat` or `.toml` file under one of the mapping directories. Comparison
/// is on normalized paths (separators unified, case folded) so it holds
/// across platforms.
fn is_relevant(path: &Path, normalized_dirs: &[String]) -> bool {
    let relevant_extension = path
        .extension()
        .is_some_and(|ext| ext == "dat" || ext == "toml");
    if !relevant_extension {
        return false;
    }
    let normalized = normalize_path(path);
    normalized_dirs.iter().any(|dir| normalized.starts_with(dir))
}

fn normalize_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/").to_lowercase()
}

/// Consumes watch events and performs background reloads.
///
/// Bursts of events (a build regenerating many files) are coalesced through a
/// short debounce window into one reload. An in-flight reload is never
/// cancelled; a change arriving during one simply schedules the next.
pub struct ReloadService {
    store: Arc<SymbolStore>,
    docs: Arc<VirtualDocuments>,
    debounce: Duration,
}

impl ReloadService {
    pub fn new(store: Arc<SymbolStore>, docs: Arc<VirtualDocuments>) -> Self {
        ReloadService {
            store,
            docs,
            debounce: Duration::from_millis(250),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Run until the event channel closes. Each batch of events triggers one
    /// `reload` + virtual-document invalidation on this task.
    pub async fn run(&self, mut watcher: FileWatcher) -> Result<()> {
        watcher.watch_all()?;
        let event_rx = watcher.event_receiver();

        while let Some(event) = event_rx.recv().await {
            debug!("reload triggered by {:?}", event.path());
            // Drain the burst before reloading once.
            tokio::time::sleep(self.debounce).await;
            let mut coalesced = 1usize;
            while event_rx.try_recv().is_ok() {
                coalesced += 1;
            }

            let snapshot = self.store.reload_and_invalidate(&self.docs);
            info!(
                events = coalesced,
                generation = snapshot.generation,
                "reloaded mappings after filesystem change"
            );
        }
        Ok(())
    }
}
