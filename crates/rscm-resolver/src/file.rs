//! Provider backed by plain `<prefix>.rscm` mapping files

use std::path::PathBuf;
use std::sync::Arc;

use rscm_core::{MAPPING_EXTENSION, Settings};

use crate::provider::{Entry, EntrySource, Provider};

/// Reads one real mapping file per prefix on demand. No caching here; the
/// files are small and the filesystem cache does the rest.
pub struct FileProvider {
    settings: Arc<Settings>,
}

impl FileProvider {
    pub fn new(settings: Arc<Settings>) -> Self {
        FileProvider { settings }
    }

    /// First `<prefix>.rscm` found across the mapping directories, in
    /// configuration order.
    pub fn mapping_file(&self, prefix: &str) -> Option<PathBuf> {
        let file_name = format!("{prefix}.{MAPPING_EXTENSION}");
        self.settings
            .effective()
            .mapping_directories
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }
}

impl Provider for FileProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    fn supports_prefix(&self, prefix: &str) -> bool {
        self.mapping_file(prefix).is_some()
    }

    fn all_entries(&self, prefix: &str) -> anyhow::Result<Vec<Entry>> {
        let Some(path) = self.mapping_file(prefix) else {
            return Ok(Vec::new());
        };
        let contents = std::fs::read_to_string(&path)?;
        Ok(parse_mapping_lines(prefix, &path, &contents))
    }
}

/// Parse `key=value` lines of a mapping file. Same line grammar the virtual
/// documents are rendered with: blank and `#` lines skipped, split on the
/// first `=`, no trimming inside key or value.
pub(crate) fn parse_mapping_lines(prefix: &str, path: &PathBuf, contents: &str) -> Vec<Entry> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(line, raw)| {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let (key, value) = trimmed.split_once('=')?;
            Some(Entry {
                prefix: prefix.to_string(),
                key: key.to_string(),
                value: value.to_string(),
                source: EntrySource::MappingFile {
                    path: path.clone(),
                    line,
                },
            })
        })
        .collect()
}
