use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of a sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTrigger {
    Timer,
    ClipboardChange,
    Manual(String),
}

impl SyncTrigger {
    pub fn describe(&self) -> String {
        match self {
            SyncTrigger::Timer => "timer".to_string(),
            SyncTrigger::ClipboardChange => "clipboard change".to_string(),
            SyncTrigger::Manual(reason) => format!("manual: {reason}"),
        }
    }

    /// Automatic triggers are suppressed while the scheduler is stopped.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, SyncTrigger::Manual(_))
    }
}

/// Snapshot of the auto-sync controller state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSyncStatus {
    pub is_running: bool,
    pub is_syncing: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub next_sync_time: Option<DateTime<Utc>>,
    pub error_count: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatusKind {
    Started,
    Stopped,
    SyncStarted,
    SyncSucceeded,
    SyncFailed,
    /// Attempt not started because of a configuration problem.
    Skipped,
    /// Error budget exhausted; the scheduler stopped itself.
    Halted,
}

/// Push-style notification emitted on every controller transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusEvent {
    pub kind: SyncStatusKind,
    pub message: String,
    pub is_syncing: bool,
    pub timestamp: DateTime<Utc>,
}

impl SyncStatusEvent {
    pub fn new(
        kind: SyncStatusKind,
        message: impl Into<String>,
        is_syncing: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            is_syncing,
            timestamp,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SyncStatusKind::Halted
    }
}
