use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DeviceId, RecordId};

/// Upper bound on synchronized clipboard text, in characters.
pub const MAX_CONTENT_CHARS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("clipboard content is empty")]
    EmptyContent,

    #[error("clipboard content has {chars} characters, limit is {MAX_CONTENT_CHARS}")]
    ContentTooLong { chars: usize },
}

/// A stored clipboard history item.
///
/// Two records with identical `content` are the same logical item for dedup
/// purposes, whatever their id, device or timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardRecord {
    pub id: RecordId,
    pub content: String,
    pub device_id: Option<DeviceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClipboardRecord {
    /// Whether `incoming` carries exactly this record's origin metadata.
    pub fn has_same_origin(&self, incoming: &NewClipboardRecord) -> bool {
        self.device_id == incoming.device_id && self.created_at == incoming.created_at
    }
}

/// Validated insert form of a clipboard record; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClipboardRecord {
    pub content: String,
    pub device_id: Option<DeviceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewClipboardRecord {
    pub fn new(
        content: impl Into<String>,
        device_id: Option<DeviceId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let content = content.into();
        validate_content(&content)?;

        Ok(Self {
            content,
            device_id,
            created_at,
            updated_at: created_at,
        })
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }
}

impl From<&ClipboardRecord> for NewClipboardRecord {
    fn from(record: &ClipboardRecord) -> Self {
        Self {
            content: record.content.clone(),
            device_id: record.device_id.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn validate_content(content: &str) -> Result<(), RecordError> {
    if content.is_empty() {
        return Err(RecordError::EmptyContent);
    }

    let chars = content.chars().count();
    if chars > MAX_CONTENT_CHARS {
        return Err(RecordError::ContentTooLong { chars });
    }

    Ok(())
}
