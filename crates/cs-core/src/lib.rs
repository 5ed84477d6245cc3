//! # cs-core
//!
//! Core domain models and port definitions for the ClipSync synchronization engine.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! clipboard records, sync configuration, conflict policy, history, the remote
//! exchange wire format and the ports that adapters implement.

pub mod clipboard;
pub mod ids;
pub mod ports;
pub mod sync;

// Re-export commonly used types at the crate root
pub use clipboard::{ClipboardRecord, NewClipboardRecord, RecordError, MAX_CONTENT_CHARS};
pub use ids::{DeviceId, RecordId};
pub use sync::{
    AutoSyncStatus, ConflictStrategy, LocalFileSyncConfig, MergeDecision, ServerSyncConfig,
    SyncConfiguration, SyncDirection, SyncHistory, SyncHistoryEntry, SyncOperation, SyncSettings,
    SyncStatusEvent, SyncStatusKind, SyncTrigger, SyncType,
};
