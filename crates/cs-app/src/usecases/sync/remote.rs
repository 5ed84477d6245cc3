use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use cs_core::ports::{ClipboardStorePort, RemoteEndpoint, RemoteSyncPort};
use cs_core::sync::protocol::{LocalItem, SyncExchangeRequest};
use cs_core::{DeviceId, NewClipboardRecord, ServerSyncConfig, SyncOperation};

use super::error::SyncError;
use super::merge::{MergeRecords, MergeReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSyncReport {
    pub sent: usize,
    pub uploaded: usize,
    pub merge: MergeReport,
    /// Server clock at the exchange; becomes the next pull watermark.
    pub sync_time: DateTime<Utc>,
    /// Highest local id covered by this exchange's push.
    pub push_cursor: Option<i64>,
}

impl RemoteSyncReport {
    pub fn record_count(&self) -> usize {
        self.uploaded + self.merge.applied()
    }
}

/// Push, pull or both against the remote authority, in a single exchange.
pub struct RemoteSync {
    store: Arc<dyn ClipboardStorePort>,
    transport: Arc<dyn RemoteSyncPort>,
    merge: MergeRecords,
}

impl RemoteSync {
    pub fn new(store: Arc<dyn ClipboardStorePort>, transport: Arc<dyn RemoteSyncPort>) -> Self {
        Self {
            merge: MergeRecords::new(store.clone()),
            store,
            transport,
        }
    }

    /// `operation` must be `Push`, `Pull` or `Bidirectional`.
    ///
    /// Pushes send every local record with an id above `push_cursor` (everything when
    /// there is none). `watermark` is the server time of the previous exchange and
    /// only scopes the pull. Remote items are merged only when the operation pulls.
    pub async fn execute(
        &self,
        operation: SyncOperation,
        config: &ServerSyncConfig,
        device_id: &DeviceId,
        watermark: Option<DateTime<Utc>>,
        push_cursor: Option<i64>,
        cancel: CancellationToken,
    ) -> Result<RemoteSyncReport, SyncError> {
        let span = info_span!(
            "usecase.sync.remote",
            operation = ?operation,
            server_url = %config.server_url,
            device_id = %device_id,
        );

        async move {
            let pushes = matches!(operation, SyncOperation::Push | SyncOperation::Bidirectional);
            let pulls = matches!(operation, SyncOperation::Pull | SyncOperation::Bidirectional);

            let local_items = if pushes {
                self.pending_since(push_cursor).await?
            } else {
                Vec::new()
            };
            let sent = local_items.len();
            let next_cursor = local_items
                .iter()
                .filter_map(|item| item.local_id)
                .max()
                .max(push_cursor);

            let request = SyncExchangeRequest {
                device_id: device_id.clone(),
                last_sync_time: watermark,
                local_items,
            };
            let endpoint = RemoteEndpoint {
                server_url: config.server_url.clone(),
                timeout: config.connection_timeout(),
                max_retry_attempts: config.max_retry_attempts,
            };

            let data = self.transport.exchange(&endpoint, &request, cancel).await?;

            for failed in data.uploaded.iter().filter(|result| !result.success) {
                warn!(
                    local_id = ?failed.local_id,
                    error = failed.error.as_deref().unwrap_or("unknown"),
                    "server rejected pushed item"
                );
            }

            let merge = if pulls {
                let mut rejected = 0;
                let incoming: Vec<NewClipboardRecord> = data
                    .remote_items
                    .iter()
                    .filter_map(|item| match item.to_new_record() {
                        Ok(record) => Some(record),
                        Err(err) => {
                            warn!(remote_id = %item.id, error = %err, "skipping remote item");
                            rejected += 1;
                            None
                        }
                    })
                    .collect();

                let mut report = self.merge.merge(incoming, config.conflict_strategy).await;
                report.failed += rejected;
                report
            } else {
                MergeReport::default()
            };

            let report = RemoteSyncReport {
                sent,
                uploaded: data.uploaded_count(),
                merge,
                sync_time: data.sync_time,
                push_cursor: next_cursor,
            };
            info!(
                sent = report.sent,
                uploaded = report.uploaded,
                merged = report.merge.applied(),
                "remote sync finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn pending_since(&self, cursor: Option<i64>) -> Result<Vec<LocalItem>, SyncError> {
        let records = self.store.get_all(None, 0).await?;

        let mut pending: Vec<LocalItem> = records
            .iter()
            .filter(|record| cursor.map_or(true, |sent| record.id.value() > sent))
            .map(LocalItem::from)
            .collect();
        pending.reverse();
        Ok(pending)
    }
}
