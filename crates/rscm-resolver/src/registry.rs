//! Ordered registry fanning queries out over enabled providers

use std::sync::Arc;

use rscm_core::Settings;
use tracing::warn;

use crate::provider::{Entry, Provider};

/// Holds every known provider in a fixed order and combines their results.
///
/// The enabled subset is recomputed from effective settings on every call —
/// settings can change between calls and must take effect immediately.
/// Results are concatenated in provider order without deduplication: callers
/// such as completion lists want to show the same key once per source.
pub struct ProviderRegistry {
    settings: Arc<Settings>,
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new(settings: Arc<Settings>, providers: Vec<Arc<dyn Provider>>) -> Self {
        ProviderRegistry {
            settings,
            providers,
        }
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    fn enabled_providers(&self) -> Vec<&Arc<dyn Provider>> {
        let effective = self.settings.effective();
        self.providers
            .iter()
            .filter(|provider| match provider.name() {
                "file" => effective.file_provider_enabled,
                "gameval" => effective.gameval_provider_enabled,
                _ => true,
            })
            .collect()
    }

    /// True if any enabled provider knows the prefix.
    pub fn supports(&self, prefix: &str) -> bool {
        self.enabled_providers()
            .iter()
            .any(|provider| provider.supports_prefix(prefix))
    }

    pub fn all(&self, prefix: &str) -> Vec<Entry> {
        self.collect(prefix, |provider| provider.all_entries(prefix))
    }

    pub fn for_key(&self, prefix: &str, key: &str) -> Vec<Entry> {
        self.collect(prefix, |provider| provider.entries_for_key(prefix, key))
    }

    /// Query each enabled, supporting provider; a failure in one provider is
    /// logged and contributes nothing, it never suppresses the others.
    fn collect(
        &self,
        prefix: &str,
        query: impl Fn(&dyn Provider) -> anyhow::Result<Vec<Entry>>,
    ) -> Vec<Entry> {
        let mut result = Vec::new();
        for provider in self.enabled_providers() {
            if !provider.supports_prefix(prefix) {
                continue;
            }
            match query(provider.as_ref()) {
                Ok(entries) => result.extend(entries),
                Err(e) => {
                    warn!(provider = provider.name(), prefix, "provider query failed: {e}");
                }
            }
        }
        result
    }
}
