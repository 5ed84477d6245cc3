use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::clipboard::{NewClipboardRecord, RecordError};
use crate::ids::DeviceId;

/// One element of a snapshot file, decoded leniently.
///
/// Only `content` is required; any structurally valid array element that carries
/// it is accepted. Missing timestamps fall back to the import time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub id: Option<i64>,
    pub content: String,
    pub device_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SnapshotEntry {
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn into_new_record(self, fallback: DateTime<Utc>) -> Result<NewClipboardRecord, RecordError> {
        let created_at = self.created_at.unwrap_or(fallback);
        let device_id = self
            .device_id
            .filter(|id| !id.trim().is_empty())
            .map(DeviceId::new);

        Ok(NewClipboardRecord::new(self.content, device_id, created_at)?
            .with_updated_at(self.updated_at.unwrap_or(created_at)))
    }
}
