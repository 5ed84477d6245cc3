mod clipboard_history_row;
mod sync_configuration_row;

pub use clipboard_history_row::{ClipboardHistoryRow, NewClipboardHistoryRow};
pub use sync_configuration_row::{NewSyncConfigurationRow, SyncConfigurationRow};

use chrono::{DateTime, Utc};

/// Timestamps are stored as epoch milliseconds.
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}
