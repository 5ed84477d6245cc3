use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug;

use cs_core::ports::{ConfigurationStoreError, SyncConfigurationPort};
use cs_core::SyncConfiguration;

use crate::db::{
    models::{NewSyncConfigurationRow, SyncConfigurationRow},
    pool::{DbPool, PooledConn},
    schema::t_sync_configuration::dsl::*,
};

/// Configuration rows are append-mostly; the newest row is the active one.
pub struct DieselSyncConfigurationRepository {
    pool: DbPool,
}

impl DieselSyncConfigurationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConn, ConfigurationStoreError> {
        self.pool
            .get()
            .map_err(|e| ConfigurationStoreError::Storage(e.to_string()))
    }
}

fn storage(e: diesel::result::Error) -> ConfigurationStoreError {
    ConfigurationStoreError::Storage(e.to_string())
}

#[async_trait]
impl SyncConfigurationPort for DieselSyncConfigurationRepository {
    async fn get_current(&self) -> Result<Option<SyncConfiguration>, ConfigurationStoreError> {
        let mut conn = self.conn()?;

        let row = t_sync_configuration
            .select(SyncConfigurationRow::as_select())
            .order((created_at.desc(), id.desc()))
            .first::<SyncConfigurationRow>(&mut conn)
            .optional()
            .map_err(storage)?;

        row.map(SyncConfiguration::try_from).transpose()
    }

    async fn save(&self, config: &SyncConfiguration) -> Result<i64, ConfigurationStoreError> {
        let mut conn = self.conn()?;
        let row = NewSyncConfigurationRow::try_from(config)?;

        let saved_id = match config.id {
            Some(existing) => {
                let updated = diesel::update(t_sync_configuration.filter(id.eq(existing)))
                    .set(&row)
                    .execute(&mut conn)
                    .map_err(storage)?;
                if updated == 0 {
                    return Err(ConfigurationStoreError::Storage(format!(
                        "sync configuration {existing} no longer exists"
                    )));
                }
                existing
            }
            None => diesel::insert_into(t_sync_configuration)
                .values(&row)
                .returning(id)
                .get_result::<i64>(&mut conn)
                .map_err(storage)?,
        };

        debug!(id = saved_id, sync_type = %row.sync_type, "saved sync configuration");
        Ok(saved_id)
    }
}
