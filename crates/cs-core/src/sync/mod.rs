//! Sync domain models: configuration, conflict policy, history, status and wire format.

pub mod backup;
pub mod conflict;
pub mod history;
pub mod protocol;
pub mod settings;
pub mod snapshot;
pub mod status;

pub use conflict::{ConflictStrategy, MergeDecision};
pub use history::{SyncHistory, SyncHistoryEntry, SyncOperation, SYNC_HISTORY_CAPACITY};
pub use settings::{
    LocalFileSyncConfig, ServerSyncConfig, SettingsDecodeError, SyncConfiguration, SyncDirection,
    SyncSettings, SyncType,
};
pub use snapshot::SnapshotEntry;
pub use status::{AutoSyncStatus, SyncStatusEvent, SyncStatusKind, SyncTrigger};
