use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, warn, Instrument};

use cs_core::ports::{ClipboardStorePort, ClockPort, SnapshotFilePort};
use cs_core::sync::SnapshotEntry;
use cs_core::{ConflictStrategy, NewClipboardRecord};

use super::error::SyncError;
use super::merge::{MergeRecords, MergeReport};

pub const DEFAULT_MAX_BACKUP_FILES: usize = 5;

/// Moves the whole item set to and from a shared JSON snapshot file.
pub struct LocalFileSync {
    store: Arc<dyn ClipboardStorePort>,
    files: Arc<dyn SnapshotFilePort>,
    clock: Arc<dyn ClockPort>,
    merge: MergeRecords,
}

impl LocalFileSync {
    pub fn new(
        store: Arc<dyn ClipboardStorePort>,
        files: Arc<dyn SnapshotFilePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            merge: MergeRecords::new(store.clone()),
            store,
            files,
            clock,
        }
    }

    /// Back up the current snapshot, then atomically replace it with every stored item.
    ///
    /// Returns the number of records written. An empty store writes `[]`.
    pub async fn export(&self, path: &Path, max_backup_files: usize) -> Result<usize, SyncError> {
        let span = info_span!("usecase.sync.export", path = %path.display());

        async move {
            if self.files.exists(path).await {
                let backup = self.files.create_backup(path, self.clock.now()).await?;
                debug!(backup = %backup.display(), "snapshot backed up");

                match self.files.prune_backups(path, max_backup_files.max(1)).await {
                    Ok(report) if !report.failed.is_empty() => {
                        warn!(
                            deleted = report.deleted.len(),
                            failed = report.failed.len(),
                            "some expired backups could not be removed"
                        );
                    }
                    Ok(report) => debug!(deleted = report.deleted.len(), "backups pruned"),
                    Err(err) => warn!(error = %err, "backup cleanup skipped"),
                }
            }

            let records = self.store.get_all(None, 0).await?;
            self.files.write_snapshot(path, &records).await?;

            info!(count = records.len(), "snapshot exported");
            Ok(records.len())
        }
        .instrument(span)
        .await
    }

    /// Merge every decodable entry of the snapshot into the store.
    ///
    /// Undecodable or invalid entries are logged and counted as failed; they never
    /// abort the import.
    pub async fn import(
        &self,
        path: &Path,
        strategy: ConflictStrategy,
    ) -> Result<MergeReport, SyncError> {
        let span = info_span!("usecase.sync.import", path = %path.display(), ?strategy);

        async move {
            let values = self.files.read_snapshot(path).await?;
            let total = values.len();
            let fallback_time = self.clock.now();

            let mut rejected = 0;
            let mut dated = Vec::new();
            let mut undated = Vec::new();
            for (index, value) in values.into_iter().enumerate() {
                match decode_entry(value, fallback_time) {
                    Ok((record, true)) => dated.push(record),
                    Ok((record, false)) => undated.push(record),
                    Err(err) => {
                        warn!(index, error = %err, "skipping snapshot entry");
                        rejected += 1;
                    }
                }
            }

            // Entries without a creation time only fill gaps; the import time they
            // were stamped with must not win a conflict.
            let mut report = self.merge.merge(dated, strategy).await;
            let gaps = self.merge.merge(undated, ConflictStrategy::KeepLocal).await;
            report.inserted += gaps.inserted;
            report.skipped += gaps.skipped;
            report.failed += gaps.failed + rejected;

            info!(
                total,
                inserted = report.inserted,
                replaced = report.replaced,
                skipped = report.skipped,
                failed = report.failed,
                "snapshot imported"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// True iff the file exists and parses as a JSON array.
    pub async fn validate(&self, path: &Path) -> bool {
        self.files.validate_format(path).await
    }

    pub async fn exists(&self, path: &Path) -> bool {
        self.files.exists(path).await
    }
}

/// Decoded record plus whether the entry carried its own creation time.
fn decode_entry(
    value: serde_json::Value,
    fallback_time: DateTime<Utc>,
) -> Result<(NewClipboardRecord, bool), String> {
    let entry = SnapshotEntry::from_value(value).map_err(|e| e.to_string())?;
    let dated = entry.created_at.is_some();
    let record = entry
        .into_new_record(fallback_time)
        .map_err(|e| e.to_string())?;
    Ok((record, dated))
}
