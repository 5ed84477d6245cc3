use cs_core::ports::{ConfigurationStoreError, SnapshotError, StoreError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no sync configuration has been saved")]
    NotConfigured,

    #[error("sync is disabled")]
    Disabled,

    #[error("sync type {0} is not supported")]
    UnsupportedType(String),

    #[error("local file sync has no folder path configured")]
    MissingFolderPath,

    #[error("server sync has no server url configured")]
    MissingServerUrl,

    #[error("failed to load sync configuration: {0}")]
    ConfigurationUnavailable(#[source] ConfigurationStoreError),

    #[error("remote sync requires a server sync configuration")]
    NotServerSync,

    #[error("another sync attempt is in progress")]
    AlreadySyncing,

    #[error("item store error: {0}")]
    Store(#[from] StoreError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("remote exchange failed: {0}")]
    Transport(#[from] TransportError),
}

impl SyncError {
    /// Configuration problems abort before any I/O and never count as failed attempts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::NotConfigured
                | SyncError::Disabled
                | SyncError::UnsupportedType(_)
                | SyncError::MissingFolderPath
                | SyncError::MissingServerUrl
                | SyncError::ConfigurationUnavailable(_)
                | SyncError::NotServerSync
        )
    }
}
