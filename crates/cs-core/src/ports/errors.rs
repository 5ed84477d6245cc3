use std::path::PathBuf;

use thiserror::Error;

use crate::clipboard::RecordError;
use crate::sync::SettingsDecodeError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum ConfigurationStoreError {
    #[error("stored sync configuration is corrupt: {0}")]
    Corrupt(#[from] SettingsDecodeError),

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("snapshot {} is not a JSON array: {message}", path.display())]
    InvalidFormat { path: PathBuf, message: String },

    #[error("snapshot path {} has no usable file name", .0.display())]
    InvalidPath(PathBuf),

    #[error("snapshot io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(String),
}

/// Failure of a remote exchange. Each variant maps to a distinct cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("unauthorized: credential missing or rejected")]
    Unauthorized,

    #[error("http status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("rejected by server ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("exchange cancelled")]
    Cancelled,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl TransportError {
    /// Only transient failures are worth another attempt.
    pub fn should_retry(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Network(_))
    }
}
