//! # Configuration Loader
//!
//! Reads the TOML application file into [`AppConfig`]. Missing sections and keys
//! fall back to empty values; paths and the device id are resolved later during
//! wiring.
//!
//! ```toml
//! [storage]
//! database_path = "/var/lib/clipsync/clipsync.db"
//!
//! [device]
//! id = "laptop-1"
//!
//! [auth]
//! token = "secret"
//!
//! [logging]
//! level = "debug"
//!
//! # Written to the configuration store only when it holds no configuration yet.
//! [sync]
//! sync_type = "Server"
//! enabled = true
//!
//! [sync.settings]
//! serverUrl = "https://sync.example.com/api"
//! syncIntervalMinutes = 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use cs_core::{SyncConfiguration, SyncSettings};

const APP_DIR_NAME: &str = "clipsync";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageSection,
    pub device: DeviceSection,
    pub auth: AuthSection,
    pub logging: LoggingSection,
    pub sync: Option<SyncSeed>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Empty means `<data dir>/clipsync/clipsync.db`.
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Empty means a generated id, persisted next to the database.
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

/// Initial sync configuration, in the same camelCase shape the store persists.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncSeed {
    pub sync_type: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub settings: toml::Table,
}

fn enabled_by_default() -> bool {
    true
}

impl SyncSeed {
    pub fn to_configuration(&self, now: DateTime<Utc>) -> anyhow::Result<SyncConfiguration> {
        let config_data =
            serde_json::to_string(&self.settings).context("Failed to encode [sync.settings]")?;
        let settings = SyncSettings::decode(&self.sync_type, &config_data)
            .with_context(|| format!("Invalid [sync] seed for {}", self.sync_type))?;
        Ok(SyncConfiguration::new(settings, self.enabled, now))
    }
}

/// `<config dir>/clipsync/config.toml`
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Per-user data directory holding the database and the generated device id.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir().context("Could not determine the user data directory")?;
    Ok(base.join(APP_DIR_NAME))
}

/// Load configuration from a TOML file
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

/// An explicit path must exist; a missing file at the default location means defaults.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = default_config_path()?;
            if path.exists() {
                load_config(&path)
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}
