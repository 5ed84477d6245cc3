//! Use cases
//!
//! [AutoSyncController]   timer / clipboard change / manual
//!         ↓
//! SyncOrchestrator       one attempt, history, watermark
//!         ↓
//! LocalFileSync | RemoteSync
//!         ↓
//! MergeRecords           dedup + conflict policy into the item store

pub mod auto_sync;
pub mod sync;
