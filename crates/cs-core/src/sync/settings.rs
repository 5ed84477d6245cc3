use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::conflict::ConflictStrategy;
use crate::ids::DeviceId;

pub const DEFAULT_SNAPSHOT_FILE_NAME: &str = "clipboard_sync.json";

pub const SYNC_INTERVAL_MINUTES: RangeInclusive<u32> = 1..=60;
pub const MAX_BACKUP_FILES: RangeInclusive<u32> = 1..=20;
pub const CONNECTION_TIMEOUT_SECONDS: RangeInclusive<u32> = 5..=120;
pub const MAX_RETRY_ATTEMPTS: RangeInclusive<u32> = 0..=10;

/// Discriminant stored next to the opaque config payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncType {
    LocalFile,
    Server,
    Other(String),
}

impl SyncType {
    pub fn as_str(&self) -> &str {
        match self {
            SyncType::LocalFile => "LocalFile",
            SyncType::Server => "Server",
            SyncType::Other(name) => name,
        }
    }
}

impl Display for SyncType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SyncType {
    fn from(s: &str) -> Self {
        match s {
            "LocalFile" => SyncType::LocalFile,
            "Server" => SyncType::Server,
            other => SyncType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncDirection {
    PushOnly,
    PullOnly,
    #[default]
    Bidirectional,
}

/// Payload of a `LocalFile` configuration: a snapshot shared through a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalFileSyncConfig {
    pub sync_folder_path: PathBuf,
    pub snapshot_file_name: String,
    pub sync_interval_minutes: u32,
    pub auto_sync_on_clipboard_change: bool,
    pub enable_conflict_resolution: bool,
    pub conflict_strategy: ConflictStrategy,
    pub max_backup_files: u32,
    pub last_auto_sync_time: Option<DateTime<Utc>>,
}

impl Default for LocalFileSyncConfig {
    fn default() -> Self {
        Self {
            sync_folder_path: PathBuf::new(),
            snapshot_file_name: DEFAULT_SNAPSHOT_FILE_NAME.to_string(),
            sync_interval_minutes: 5,
            auto_sync_on_clipboard_change: false,
            enable_conflict_resolution: true,
            conflict_strategy: ConflictStrategy::KeepNewer,
            max_backup_files: 5,
            last_auto_sync_time: None,
        }
    }
}

impl LocalFileSyncConfig {
    /// Full path of the shared snapshot, or `None` when no folder is configured.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        if self.sync_folder_path.as_os_str().is_empty() {
            return None;
        }

        let file_name = if self.snapshot_file_name.trim().is_empty() {
            DEFAULT_SNAPSHOT_FILE_NAME
        } else {
            self.snapshot_file_name.trim()
        };

        Some(self.sync_folder_path.join(file_name))
    }

    /// Strategy applied on import; collisions are plain skips when resolution is off.
    pub fn effective_strategy(&self) -> ConflictStrategy {
        if self.enable_conflict_resolution {
            self.conflict_strategy
        } else {
            ConflictStrategy::KeepLocal
        }
    }

    pub fn interval(&self) -> Duration {
        minutes(self.sync_interval_minutes)
    }

    fn normalized(mut self) -> Self {
        self.sync_interval_minutes = clamp_field(
            "syncIntervalMinutes",
            self.sync_interval_minutes,
            SYNC_INTERVAL_MINUTES,
        );
        self.max_backup_files =
            clamp_field("maxBackupFiles", self.max_backup_files, MAX_BACKUP_FILES);
        self
    }
}

/// Payload of a `Server` configuration: exchanges with a remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSyncConfig {
    pub server_url: String,
    pub device_id: DeviceId,
    pub sync_direction: SyncDirection,
    pub sync_interval_minutes: u32,
    pub connection_timeout_seconds: u32,
    pub max_retry_attempts: u32,
    pub conflict_strategy: ConflictStrategy,
    pub sync_on_clipboard_change: bool,
    /// Server clock at the last successful exchange; sent back as the pull watermark.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Highest local record id already pushed; local ids only grow.
    pub push_cursor: Option<i64>,
}

impl Default for ServerSyncConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            device_id: DeviceId::default(),
            sync_direction: SyncDirection::Bidirectional,
            sync_interval_minutes: 5,
            connection_timeout_seconds: 30,
            max_retry_attempts: 3,
            conflict_strategy: ConflictStrategy::KeepNewer,
            sync_on_clipboard_change: false,
            last_sync_time: None,
            push_cursor: None,
        }
    }
}

impl ServerSyncConfig {
    pub fn interval(&self) -> Duration {
        minutes(self.sync_interval_minutes)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connection_timeout_seconds))
    }

    fn normalized(mut self) -> Self {
        self.sync_interval_minutes = clamp_field(
            "syncIntervalMinutes",
            self.sync_interval_minutes,
            SYNC_INTERVAL_MINUTES,
        );
        self.connection_timeout_seconds = clamp_field(
            "connectionTimeoutSeconds",
            self.connection_timeout_seconds,
            CONNECTION_TIMEOUT_SECONDS,
        );
        self.max_retry_attempts =
            clamp_field("maxRetryAttempts", self.max_retry_attempts, MAX_RETRY_ATTEMPTS);
        self
    }
}

#[derive(Debug, Error)]
pub enum SettingsDecodeError {
    #[error("invalid {sync_type} config payload: {source}")]
    InvalidPayload {
        sync_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode sync config payload: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decoded configuration payload, tagged by sync type.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncSettings {
    LocalFile(LocalFileSyncConfig),
    Server(ServerSyncConfig),
    /// A type this engine cannot drive; the raw payload is kept so saving round-trips it.
    Unsupported {
        sync_type: String,
        config_data: String,
    },
}

impl SyncSettings {
    /// Decode the opaque `config_data` column for the given `sync_type`.
    ///
    /// An empty payload decodes to the type's defaults. Numeric fields are clamped
    /// into their documented ranges.
    pub fn decode(sync_type: &str, config_data: &str) -> Result<Self, SettingsDecodeError> {
        let payload = if config_data.trim().is_empty() {
            "{}"
        } else {
            config_data
        };

        let invalid = |source| SettingsDecodeError::InvalidPayload {
            sync_type: sync_type.to_string(),
            source,
        };

        match SyncType::from(sync_type) {
            SyncType::LocalFile => {
                let config: LocalFileSyncConfig = serde_json::from_str(payload).map_err(invalid)?;
                Ok(SyncSettings::LocalFile(config.normalized()))
            }
            SyncType::Server => {
                let config: ServerSyncConfig = serde_json::from_str(payload).map_err(invalid)?;
                Ok(SyncSettings::Server(config.normalized()))
            }
            SyncType::Other(name) => Ok(SyncSettings::Unsupported {
                sync_type: name,
                config_data: config_data.to_string(),
            }),
        }
    }

    /// Serialize back to the `config_data` column.
    pub fn encode(&self) -> Result<String, SettingsDecodeError> {
        match self {
            SyncSettings::LocalFile(config) => {
                serde_json::to_string(config).map_err(SettingsDecodeError::Encode)
            }
            SyncSettings::Server(config) => {
                serde_json::to_string(config).map_err(SettingsDecodeError::Encode)
            }
            SyncSettings::Unsupported { config_data, .. } => Ok(config_data.clone()),
        }
    }

    pub fn sync_type(&self) -> SyncType {
        match self {
            SyncSettings::LocalFile(_) => SyncType::LocalFile,
            SyncSettings::Server(_) => SyncType::Server,
            SyncSettings::Unsupported { sync_type, .. } => SyncType::Other(sync_type.clone()),
        }
    }

    /// Timer period, `None` for types the scheduler cannot drive.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            SyncSettings::LocalFile(config) => Some(config.interval()),
            SyncSettings::Server(config) => Some(config.interval()),
            SyncSettings::Unsupported { .. } => None,
        }
    }

    pub fn syncs_on_clipboard_change(&self) -> bool {
        match self {
            SyncSettings::LocalFile(config) => config.auto_sync_on_clipboard_change,
            SyncSettings::Server(config) => config.sync_on_clipboard_change,
            SyncSettings::Unsupported { .. } => false,
        }
    }

    fn record_success(&mut self, at: DateTime<Utc>) {
        match self {
            SyncSettings::LocalFile(config) => config.last_auto_sync_time = Some(at),
            SyncSettings::Server(config) => config.last_sync_time = Some(at),
            SyncSettings::Unsupported { .. } => {}
        }
    }
}

/// The active sync configuration; the store always serves the most recently created row.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfiguration {
    /// `None` until the configuration store has persisted the row.
    pub id: Option<i64>,
    pub is_enabled: bool,
    pub settings: SyncSettings,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncConfiguration {
    pub fn new(settings: SyncSettings, is_enabled: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            is_enabled,
            settings,
            last_sync_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sync_type(&self) -> SyncType {
        self.settings.sync_type()
    }

    /// Advance both the row watermark and the payload's own sync time.
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_sync_time = Some(at);
        self.updated_at = at;
        self.settings.record_success(at);
    }
}

fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value) * 60)
}

fn clamp_field(name: &'static str, value: u32, range: RangeInclusive<u32>) -> u32 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            setting = name,
            value,
            clamped,
            "sync config value out of range, clamping"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = name;
    }
    clamped
}
