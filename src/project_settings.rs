use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::subscriber::{
    ExtractionRules, KeyConvention, AFTER_INIT_RESOURCE_MARKER, DEFAULT_SEPARATOR,
    INIT_RESOURCE_MARKER, SUBSCRIBED_EVENTS_METHOD,
};

/// Name of the per-project directory holding settings
pub const SETTINGS_DIR: &str = ".subscriber-index";

/// Error type for settings persistence
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings file does not exist")]
    Missing,
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-project settings stored in .subscriber-index/settings.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerSettings {
    /// Project-level switch; a disabled project indexes every file as empty
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Method whose returned array declares subscriptions
    #[serde(default = "default_method_name")]
    pub method_name: String,
    /// Key prefixes recognised as subscription markers
    #[serde(default = "default_key_markers")]
    pub key_markers: Vec<String>,
    /// Splits the event namespace from the service name
    #[serde(default = "default_key_separator")]
    pub key_separator: char,
    /// Honour .gitignore files during discovery
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
    /// Directory names never descended into
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
    /// Indexing worker threads, 0 = one per available core
    #[serde(default)]
    pub workers: usize,
    /// Quiet period before watched changes are applied
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            method_name: default_method_name(),
            key_markers: default_key_markers(),
            key_separator: default_key_separator(),
            respect_gitignore: true,
            ignored_dirs: default_ignored_dirs(),
            workers: 0,
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl IndexerSettings {
    pub fn extraction_rules(&self) -> ExtractionRules {
        ExtractionRules {
            method_name: self.method_name.clone(),
            convention: KeyConvention::new(self.key_markers.clone(), self.key_separator),
        }
    }

    /// Worker count with 0 resolved to the machine's parallelism
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|d| d == name)
    }
}

fn default_true() -> bool {
    true
}

fn default_method_name() -> String {
    SUBSCRIBED_EVENTS_METHOD.to_string()
}

fn default_key_markers() -> Vec<String> {
    vec![
        INIT_RESOURCE_MARKER.to_string(),
        AFTER_INIT_RESOURCE_MARKER.to_string(),
    ]
}

fn default_key_separator() -> char {
    DEFAULT_SEPARATOR
}

fn default_ignored_dirs() -> Vec<String> {
    ["vendor", "node_modules", "var", "cache", ".git", SETTINGS_DIR]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_watch_debounce_ms() -> u64 {
    2000
}

/// Get the settings directory path for a project
pub fn get_settings_dir(project_path: &Path) -> PathBuf {
    project_path.join(SETTINGS_DIR)
}

/// Get the settings file path for a project
pub fn get_settings_path(project_path: &Path) -> PathBuf {
    get_settings_dir(project_path).join("settings.json")
}

/// Load project settings from disk
/// Returns error if settings file doesn't exist
pub fn load_settings(project_path: &Path) -> Result<IndexerSettings, SettingsError> {
    let settings_path = get_settings_path(project_path);

    if !settings_path.exists() {
        return Err(SettingsError::Missing);
    }

    let content = fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load project settings from disk, returning defaults if not found or invalid
pub fn load_settings_or_default(project_path: &Path) -> IndexerSettings {
    match load_settings(project_path) {
        Ok(settings) => settings,
        Err(SettingsError::Missing) => IndexerSettings::default(),
        Err(e) => {
            tracing::warn!("[SETTINGS] {}, using defaults", e);
            IndexerSettings::default()
        }
    }
}

/// Save project settings to disk
pub fn save_settings(project_path: &Path, settings: &IndexerSettings) -> Result<(), SettingsError> {
    let settings_dir = get_settings_dir(project_path);
    fs::create_dir_all(&settings_dir)?;

    let settings_path = get_settings_path(project_path);
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&settings_path, json)?;

    tracing::debug!("[SETTINGS] Saved settings to {:?}", settings_path);
    Ok(())
}
