use async_trait::async_trait;

use crate::ports::errors::ConfigurationStoreError;
use crate::sync::SyncConfiguration;

#[async_trait]
pub trait SyncConfigurationPort: Send + Sync {
    /// Most recently created configuration, if any.
    async fn get_current(&self) -> Result<Option<SyncConfiguration>, ConfigurationStoreError>;

    /// Insert when `config.id` is `None`, update the row otherwise. Returns the row id.
    async fn save(&self, config: &SyncConfiguration) -> Result<i64, ConfigurationStoreError>;
}
