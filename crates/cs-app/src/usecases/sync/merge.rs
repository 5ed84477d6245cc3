use std::sync::Arc;

use tracing::{debug, warn};

use cs_core::ports::{AddItemOutcome, ClipboardStorePort, StoreError};
use cs_core::{ConflictStrategy, MergeDecision, NewClipboardRecord};

/// Records handled between cooperative yield points.
pub const MERGE_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl MergeReport {
    /// Records that changed the local store.
    pub fn applied(&self) -> usize {
        self.inserted + self.replaced
    }
}

enum Merged {
    Inserted,
    Replaced,
    Skipped,
}

/// Folds incoming records into the item store under a conflict strategy.
///
/// Identity is exact content equality; the strategy only matters when the store
/// already holds the same content.
#[derive(Clone)]
pub struct MergeRecords {
    store: Arc<dyn ClipboardStorePort>,
}

impl MergeRecords {
    pub fn new(store: Arc<dyn ClipboardStorePort>) -> Self {
        Self { store }
    }

    pub async fn merge(
        &self,
        incoming: Vec<NewClipboardRecord>,
        strategy: ConflictStrategy,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        let mut batches = incoming.into_iter().peekable();
        while batches.peek().is_some() {
            for record in batches.by_ref().take(MERGE_BATCH_SIZE) {
                match self.merge_one(record, strategy).await {
                    Ok(Merged::Inserted) => report.inserted += 1,
                    Ok(Merged::Replaced) => report.replaced += 1,
                    Ok(Merged::Skipped) => report.skipped += 1,
                    Err(err) => {
                        warn!(error = %err, "failed to merge record, continuing");
                        report.failed += 1;
                    }
                }
            }
            tokio::task::yield_now().await;
        }

        debug!(?report, ?strategy, "merge finished");
        report
    }

    async fn merge_one(
        &self,
        record: NewClipboardRecord,
        strategy: ConflictStrategy,
    ) -> Result<Merged, StoreError> {
        let existing = self.store.find_duplicate_by_content(&record.content).await?;

        match strategy.resolve(existing.as_ref(), &record) {
            MergeDecision::Skip => Ok(Merged::Skipped),
            MergeDecision::Insert => match self.store.add_item(record).await? {
                AddItemOutcome::Inserted(_) => Ok(Merged::Inserted),
                AddItemOutcome::Duplicate(_) => Ok(Merged::Skipped),
            },
            MergeDecision::Replace { existing } => {
                // Insert before delete; a failed insert leaves the local row untouched.
                let outcome = self.store.add_item(record).await?;
                if outcome.id() != existing {
                    self.store.delete_item(existing).await?;
                }
                Ok(Merged::Replaced)
            }
        }
    }
}
