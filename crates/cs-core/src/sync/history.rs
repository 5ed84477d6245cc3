use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SYNC_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncOperation {
    Export,
    Import,
    Push,
    Pull,
    Bidirectional,
    Validate,
}

/// Outcome of one orchestrated attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub operation_type: SyncOperation,
    pub record_count: usize,
    pub success: bool,
    pub error_message: Option<String>,
    /// Snapshot path or server URL.
    pub target: String,
}

impl SyncHistoryEntry {
    pub fn succeeded(
        operation_type: SyncOperation,
        target: impl Into<String>,
        record_count: usize,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            operation_type,
            record_count,
            success: true,
            error_message: None,
            target: target.into(),
        }
    }

    pub fn failed(
        operation_type: SyncOperation,
        target: impl Into<String>,
        error: impl ToString,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            operation_type,
            record_count: 0,
            success: false,
            error_message: Some(error.to_string()),
            target: target.into(),
        }
    }
}

/// Bounded, process-local history; evicts the oldest entry once full.
#[derive(Debug, Clone)]
pub struct SyncHistory {
    entries: VecDeque<SyncHistoryEntry>,
    capacity: usize,
}

impl SyncHistory {
    pub fn new() -> Self {
        Self::with_capacity(SYNC_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: SyncHistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries oldest first.
    pub fn entries(&self) -> Vec<SyncHistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for SyncHistory {
    fn default() -> Self {
        Self::new()
    }
}
