mod clipboard_repo;
mod sync_configuration_repo;

pub use clipboard_repo::DieselClipboardRepository;
pub use sync_configuration_repo::DieselSyncConfigurationRepository;
