use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::clipboard::ClipboardRecord;
use crate::ports::errors::SnapshotError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// JSON snapshot files shared between devices through a folder.
#[async_trait]
pub trait SnapshotFilePort: Send + Sync {
    /// Atomically replace `path` with the given records as a JSON array.
    async fn write_snapshot(
        &self,
        path: &Path,
        records: &[ClipboardRecord],
    ) -> Result<(), SnapshotError>;

    /// Raw array elements; decoding each one is left to the caller.
    async fn read_snapshot(&self, path: &Path) -> Result<Vec<serde_json::Value>, SnapshotError>;

    /// True iff the file exists and parses as a JSON array.
    async fn validate_format(&self, path: &Path) -> bool;

    async fn exists(&self, path: &Path) -> bool;

    /// Copy `path` to its timestamped backup next to it.
    async fn create_backup(
        &self,
        path: &Path,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, SnapshotError>;

    /// Keep only the newest `keep` backups of `path`. Individual deletions are best-effort.
    async fn prune_backups(&self, path: &Path, keep: usize) -> Result<PruneReport, SnapshotError>;
}
