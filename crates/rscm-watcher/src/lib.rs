//! RSCM Watcher — filesystem change monitoring and background reloads

pub mod watcher;

pub use watcher::{FileWatcher, ReloadService, WatchEvent};
