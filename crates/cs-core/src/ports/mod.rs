//! Port interfaces for the sync use cases.
//!
//! Ports define the contract between the engine and its infrastructure. The
//! item store, configuration store, snapshot files and remote transport are all
//! reached through these traits so the use cases stay free of I/O details.

mod clipboard_store;
mod clock;
mod credentials;
pub mod errors;
mod remote_sync;
mod snapshot_file;
mod sync_configuration;

pub use clipboard_store::{AddItemOutcome, ClipboardStorePort};
pub use clock::ClockPort;
pub use credentials::CredentialPort;
pub use errors::{ConfigurationStoreError, SnapshotError, StoreError, TransportError};
pub use remote_sync::{RemoteEndpoint, RemoteSyncPort};
pub use snapshot_file::{PruneReport, SnapshotFilePort};
pub use sync_configuration::SyncConfigurationPort;
