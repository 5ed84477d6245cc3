use serde::{Deserialize, Serialize};

use crate::clipboard::{ClipboardRecord, NewClipboardRecord};
use crate::ids::RecordId;

/// How a content collision between a local and an incoming record is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConflictStrategy {
    /// Prefer whichever side was created later.
    #[default]
    KeepNewer,
    /// Keep both rows; identity becomes content + device + creation time.
    KeepBoth,
    /// Discard the incoming side.
    KeepLocal,
    /// Overwrite local metadata with the incoming side.
    KeepRemote,
}

/// What the merge step must ask of the item store for one incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    Insert,
    Skip,
    /// Delete `existing`, then insert the incoming record.
    Replace { existing: RecordId },
}

impl ConflictStrategy {
    /// Decide the fate of `incoming` given the local record sharing its content, if any.
    pub fn resolve(
        self,
        existing: Option<&ClipboardRecord>,
        incoming: &NewClipboardRecord,
    ) -> MergeDecision {
        let Some(existing) = existing else {
            return MergeDecision::Insert;
        };

        match self {
            ConflictStrategy::KeepLocal => MergeDecision::Skip,
            ConflictStrategy::KeepNewer => {
                if incoming.created_at > existing.created_at {
                    MergeDecision::Replace {
                        existing: existing.id,
                    }
                } else {
                    MergeDecision::Skip
                }
            }
            ConflictStrategy::KeepRemote => {
                if existing.has_same_origin(incoming) {
                    MergeDecision::Skip
                } else {
                    MergeDecision::Replace {
                        existing: existing.id,
                    }
                }
            }
            // The store rejects exact compound duplicates, so repeated imports stay idempotent.
            ConflictStrategy::KeepBoth => {
                if existing.has_same_origin(incoming) {
                    MergeDecision::Skip
                } else {
                    MergeDecision::Insert
                }
            }
        }
    }
}
