pub mod auth;
pub mod db;
pub mod fs;
pub mod remote;
pub mod time;

pub use auth::StaticCredentials;
pub use fs::JsonSnapshotFile;
pub use remote::HttpSyncTransport;
pub use time::SystemClock;
