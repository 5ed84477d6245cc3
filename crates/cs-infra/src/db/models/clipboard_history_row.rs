use cs_core::{ClipboardRecord, DeviceId, NewClipboardRecord, RecordId};
use diesel::prelude::*;

use super::{from_millis, to_millis};
use crate::db::schema::t_clipboard_history;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = t_clipboard_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClipboardHistoryRow {
    pub id: i64,
    pub content: String,
    pub device_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = t_clipboard_history)]
pub struct NewClipboardHistoryRow<'a> {
    pub content: &'a str,
    pub device_id: Option<&'a str>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl<'a> From<&'a NewClipboardRecord> for NewClipboardHistoryRow<'a> {
    fn from(record: &'a NewClipboardRecord) -> Self {
        Self {
            content: &record.content,
            device_id: record.device_id.as_ref().map(DeviceId::as_str),
            created_at: to_millis(record.created_at),
            updated_at: to_millis(record.updated_at),
        }
    }
}

impl From<ClipboardHistoryRow> for ClipboardRecord {
    fn from(row: ClipboardHistoryRow) -> Self {
        ClipboardRecord {
            id: RecordId::new(row.id),
            content: row.content,
            device_id: row.device_id.map(DeviceId::new),
            created_at: from_millis(row.created_at),
            updated_at: from_millis(row.updated_at),
        }
    }
}
