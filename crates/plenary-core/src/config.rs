//! Configuration resolution for Plenary.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/plenary/settings.json`)
//! 3. Environment variables
//! 4. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Plenary configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the legislature REST API.
    pub base_url: String,
    /// Fixed per-request timeout (seconds). A timeout is reported as a network error.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3333".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory holding the durable key-value store. Defaults to the
    /// platform data directory when unset.
    pub data_dir: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Resolved data directory: explicit setting, else `<data dir>/plenary`.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(default_data_dir)
    }

    /// Default `tracing` filter derived from the configured level.
    pub fn log_filter(&self) -> String {
        format!("plenary={0},plenary_core={0},plenary_cli={0}", self.logging.level)
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plenary").join("settings.json"))
}

/// Default location of the durable store directory.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("plenary"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    base.api = overlay.api;
    if overlay.storage.data_dir.is_some() {
        base.storage.data_dir = overlay.storage.data_dir;
    }
    base.logging = overlay.logging;
}

/// Apply `PLENARY_*` overrides. `lookup` abstracts the environment so the
/// resolution can be exercised without touching process state.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("PLENARY_API_URL") {
        config.api.base_url = val;
    }
    if let Some(val) = lookup("PLENARY_TIMEOUT_SECS") {
        if let Ok(n) = val.parse() {
            config.api.timeout_secs = n;
        }
    }
    if let Some(val) = lookup("PLENARY_DATA_DIR") {
        config.storage.data_dir = Some(PathBuf::from(val));
    }
    if let Some(val) = lookup("PLENARY_LOG_LEVEL") {
        config.logging.level = val;
    }
}
