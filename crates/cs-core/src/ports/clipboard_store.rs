use async_trait::async_trait;

use crate::clipboard::{ClipboardRecord, NewClipboardRecord};
use crate::ids::RecordId;
use crate::ports::errors::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddItemOutcome {
    Inserted(RecordId),
    /// A row with the same content, device and creation time already exists.
    Duplicate(RecordId),
}

impl AddItemOutcome {
    pub fn id(self) -> RecordId {
        match self {
            AddItemOutcome::Inserted(id) | AddItemOutcome::Duplicate(id) => id,
        }
    }

    pub fn is_inserted(self) -> bool {
        matches!(self, AddItemOutcome::Inserted(_))
    }
}

/// Local clipboard history, the single source of local truth.
#[async_trait]
pub trait ClipboardStorePort: Send + Sync {
    async fn add_item(&self, record: NewClipboardRecord) -> Result<AddItemOutcome, StoreError>;

    /// Newest first. `limit = None` returns everything from `offset`.
    async fn get_all(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<ClipboardRecord>, StoreError>;

    /// Oldest row whose content is exactly `content`.
    async fn find_duplicate_by_content(
        &self,
        content: &str,
    ) -> Result<Option<ClipboardRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_item(&self, id: RecordId) -> Result<bool, StoreError>;
}
