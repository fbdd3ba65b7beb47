//! Settings resolution: host-persisted state vs. external settings file
//!
//! Effective settings are recomputed on every read. When an external settings
//! file is configured and parses, it is authoritative for every field; there
//! is no per-field merging with host state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Host-persisted project state, the stand-in for editor-managed settings
/// storage. Loaded from a JSON state file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectState {
    pub mappings_paths: Vec<String>,
    /// Legacy single-directory field, migrated into `mappings_paths` on load.
    pub mappings_path: String,
    pub enable_file_provider: bool,
    pub enable_gameval_provider: bool,
    /// `"alias=canonical,alias2=canonical2"` pairs.
    pub referential_mappings: String,
    /// Path of the external settings file, empty when none is configured.
    pub settings_file_path: String,
}

impl ProjectState {
    pub fn new() -> Self {
        ProjectState {
            enable_file_provider: true,
            enable_gameval_provider: true,
            ..ProjectState::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let mut state: ProjectState = serde_json::from_str(&contents).map_err(|e| {
            Error::SettingsParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        state.migrate();
        Ok(state)
    }

    /// Fold the legacy single-path field into the directory list.
    fn migrate(&mut self) {
        if self.mappings_paths.is_empty() && !self.mappings_path.is_empty() {
            self.mappings_paths.push(std::mem::take(&mut self.mappings_path));
        }
    }
}

/// The one merged settings value every component consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub mapping_directories: Vec<PathBuf>,
    pub file_provider_enabled: bool,
    pub gameval_provider_enabled: bool,
    /// alias prefix -> canonical prefix.
    pub referential_aliases: BTreeMap<String, String>,
    pub from_settings_file: bool,
}

/// Settings resolver. Holds host state; `effective()` re-checks the external
/// settings file on every call so edits to it take effect without restart.
#[derive(Debug, Clone)]
pub struct Settings {
    state: ProjectState,
}

impl Settings {
    pub fn new(state: ProjectState) -> Self {
        Settings { state }
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    /// Compute the effective settings: external settings file if configured
    /// and parseable, otherwise host state. Never cached.
    pub fn effective(&self) -> EffectiveSettings {
        if !self.state.settings_file_path.is_empty() {
            let path = Path::new(&self.state.settings_file_path);
            match parse_settings_file(path) {
                Ok(parsed) => return parsed,
                Err(e) => {
                    tracing::warn!("settings file ignored, using host state: {e}");
                }
            }
        }

        EffectiveSettings {
            mapping_directories: self
                .state
                .mappings_paths
                .iter()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect(),
            file_provider_enabled: self.state.enable_file_provider,
            gameval_provider_enabled: self.state.enable_gameval_provider,
            referential_aliases: parse_pair_list(&self.state.referential_mappings),
            from_settings_file: false,
        }
    }
}

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

/// Parse the external `[rscm]` settings file.
///
/// Hand-parsed line by line rather than with a TOML parser: the file only has
/// to look TOML-ish, and the original format tolerates fragments a strict
/// parser would reject. `mappings_directories` arrays may span multiple
/// lines; relative directories resolve against the settings file's own
/// directory.
pub fn parse_settings_file(path: &Path) -> Result<EffectiveSettings, Error> {
    let settings_parse = |reason: &str| Error::SettingsParse {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if !path.is_file() {
        return Err(settings_parse("not a file"));
    }
    let base_dir = path
        .parent()
        .ok_or_else(|| settings_parse("no parent directory"))?
        .to_path_buf();
    let contents = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = contents.lines().collect();

    let mut in_rscm_section = false;
    let mut mapping_directories = Vec::new();
    let mut file_provider_enabled = true;
    let mut gameval_provider_enabled = true;
    let mut referential = String::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() || line.starts_with('#') {
            i += 1;
            continue;
        }
        if line == "[rscm]" {
            in_rscm_section = true;
            i += 1;
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            if in_rscm_section {
                break;
            }
            i += 1;
            continue;
        }

        if in_rscm_section {
            if line.starts_with("mappings_directories") {
                if let Some(array_start) = line.find('[') {
                    let mut array = line[array_start + 1..].to_string();
                    // Arrays may span multiple lines; keep appending until
                    // the closing bracket shows up.
                    while !array.contains(']') {
                        i += 1;
                        let Some(next) = lines.get(i) else { break };
                        array.push(' ');
                        array.push_str(next.trim());
                    }
                    let array = array.split(']').next().unwrap_or("");
                    for captures in QUOTED_RE.captures_iter(array) {
                        let dir = Path::new(&captures[1]);
                        let resolved = if dir.is_absolute() {
                            dir.to_path_buf()
                        } else {
                            base_dir.join(dir)
                        };
                        mapping_directories.push(resolved);
                    }
                }
            } else if line.starts_with("enable_file_provider") {
                file_provider_enabled = parse_bool_value(line);
            } else if line.starts_with("enable_alter_constant_provider") {
                gameval_provider_enabled = parse_bool_value(line);
            } else if line.starts_with("referential_mappings") {
                referential = unquote(line.split_once('=').map_or("", |(_, v)| v.trim())).to_string();
            }
        }

        i += 1;
    }

    Ok(EffectiveSettings {
        mapping_directories,
        file_provider_enabled,
        gameval_provider_enabled,
        referential_aliases: parse_pair_list(&referential),
        from_settings_file: true,
    })
}

fn parse_bool_value(line: &str) -> bool {
    line.split_once('=')
        .map(|(_, v)| unquote(v.trim()).eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse `"a=b,c=d"` into a map. Entries without `=` are dropped.
pub fn parse_pair_list(value: &str) -> BTreeMap<String, String> {
    value
        .split(',')
        .filter_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            Some((k.to_string(), v.to_string()))
        })
        .collect()
}
