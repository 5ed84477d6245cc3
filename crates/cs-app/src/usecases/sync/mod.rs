mod error;
mod local_file;
mod merge;
mod orchestrator;
mod remote;

pub use error::SyncError;
pub use local_file::{LocalFileSync, DEFAULT_MAX_BACKUP_FILES};
pub use merge::{MergeRecords, MergeReport, MERGE_BATCH_SIZE};
pub use orchestrator::{SyncOrchestrator, SyncOrchestratorDeps, SyncSummary};
pub use remote::{RemoteSync, RemoteSyncReport};
