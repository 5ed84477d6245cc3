//! Wire format of the combined push/pull exchange with a remote authority.
//!
//! `POST {serverUrl}/clipboard/sync` carries a [`SyncExchangeRequest`] and answers
//! with an [`ApiEnvelope`] whose `data` decodes to [`SyncExchangeData`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clipboard::{ClipboardRecord, NewClipboardRecord, RecordError};
use crate::ids::DeviceId;

pub const SYNC_EXCHANGE_PATH: &str = "clipboard/sync";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncExchangeRequest {
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub local_items: Vec<LocalItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<i64>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&ClipboardRecord> for LocalItem {
    fn from(record: &ClipboardRecord) -> Self {
        Self {
            local_id: Some(record.id.value()),
            content: record.content.clone(),
            created_at: Some(record.created_at),
        }
    }
}

/// `data` of a successful exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncExchangeData {
    pub sync_time: DateTime<Utc>,
    #[serde(default)]
    pub uploaded: Vec<UploadResult>,
    #[serde(default)]
    pub remote_items: Vec<RemoteRecord>,
}

impl SyncExchangeData {
    pub fn uploaded_count(&self) -> usize {
        self.uploaded.iter().filter(|result| result.success).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(default)]
    pub local_id: Option<i64>,
    /// Server ids are opaque; numeric and string forms both occur.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<Value>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A record held by the remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub id: Value,
    pub content: String,
    #[serde(default)]
    pub device_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteRecord {
    pub fn to_new_record(&self) -> Result<NewClipboardRecord, RecordError> {
        let device_id = self
            .device_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(DeviceId::new);

        Ok(
            NewClipboardRecord::new(self.content.clone(), device_id, self.created_at)?
                .with_updated_at(self.updated_at.unwrap_or(self.created_at)),
        )
    }
}

/// Response envelope shared by success and failure bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Vec<Value>,
}
