//! ClipSync application layer
//!
//! Sync use cases (local snapshot files, remote exchange, merge), the orchestrator
//! that runs one attempt end-to-end, and the auto-sync controller that decides
//! when attempts happen.

pub mod usecases;

pub use usecases::auto_sync::{AttemptOutcome, AutoSyncController, SyncAttemptRunner};
pub use usecases::sync::{SyncError, SyncOrchestrator, SyncOrchestratorDeps, SyncSummary};
