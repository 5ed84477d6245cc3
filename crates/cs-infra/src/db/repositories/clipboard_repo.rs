use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug;

use cs_core::ports::{AddItemOutcome, ClipboardStorePort, StoreError};
use cs_core::{ClipboardRecord, NewClipboardRecord, RecordId};

use crate::db::{
    models::{ClipboardHistoryRow, NewClipboardHistoryRow},
    pool::{DbPool, PooledConn},
    schema::t_clipboard_history::dsl::*,
};

pub struct DieselClipboardRepository {
    pool: DbPool,
}

impl DieselClipboardRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConn, StoreError> {
        self.pool
            .get()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

fn storage(e: diesel::result::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

#[async_trait]
impl ClipboardStorePort for DieselClipboardRepository {
    async fn add_item(&self, record: NewClipboardRecord) -> Result<AddItemOutcome, StoreError> {
        let mut conn = self.conn()?;
        let row = NewClipboardHistoryRow::from(&record);

        conn.immediate_transaction(|conn| {
            let mut existing = t_clipboard_history
                .select(id)
                .filter(content.eq(row.content))
                .filter(created_at.eq(row.created_at))
                .into_boxed();
            existing = match row.device_id {
                Some(device) => existing.filter(device_id.eq(device)),
                None => existing.filter(device_id.is_null()),
            };

            if let Some(existing_id) = existing.first::<i64>(conn).optional()? {
                return Ok(AddItemOutcome::Duplicate(RecordId::new(existing_id)));
            }

            let new_id = diesel::insert_into(t_clipboard_history)
                .values(&row)
                .returning(id)
                .get_result::<i64>(conn)?;

            Ok(AddItemOutcome::Inserted(RecordId::new(new_id)))
        })
        .map_err(storage)
    }

    async fn get_all(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<ClipboardRecord>, StoreError> {
        let mut conn = self.conn()?;

        let mut query = t_clipboard_history
            .select(ClipboardHistoryRow::as_select())
            .order((created_at.desc(), id.desc()))
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if offset > 0 {
            query = query.offset(i64::try_from(offset).unwrap_or(i64::MAX));
        }

        let rows = query.load::<ClipboardHistoryRow>(&mut conn).map_err(storage)?;
        debug!(count = rows.len(), ?limit, offset, "loaded clipboard history");

        Ok(rows.into_iter().map(ClipboardRecord::from).collect())
    }

    async fn find_duplicate_by_content(
        &self,
        needle: &str,
    ) -> Result<Option<ClipboardRecord>, StoreError> {
        let mut conn = self.conn()?;

        let row = t_clipboard_history
            .select(ClipboardHistoryRow::as_select())
            .filter(content.eq(needle))
            .order((created_at.asc(), id.asc()))
            .first::<ClipboardHistoryRow>(&mut conn)
            .optional()
            .map_err(storage)?;

        Ok(row.map(ClipboardRecord::from))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;

        let total = t_clipboard_history
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(storage)?;

        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn delete_item(&self, record_id: RecordId) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;

        let deleted = diesel::delete(t_clipboard_history.filter(id.eq(record_id.value())))
            .execute(&mut conn)
            .map_err(storage)?;

        Ok(deleted > 0)
    }
}

