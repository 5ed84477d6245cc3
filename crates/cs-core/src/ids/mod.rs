//! ID type wrappers for type safety.

pub mod device_id;
pub mod record_id;

pub use device_id::DeviceId;
pub use record_id::RecordId;
