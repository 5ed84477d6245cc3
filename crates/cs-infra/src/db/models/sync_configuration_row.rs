use cs_core::ports::ConfigurationStoreError;
use cs_core::{SyncConfiguration, SyncSettings};
use diesel::prelude::*;

use super::{from_millis, to_millis};
use crate::db::schema::t_sync_configuration;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = t_sync_configuration)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncConfigurationRow {
    pub id: i64,
    pub sync_type: String,
    pub is_enabled: bool,
    pub config_data: String,
    pub last_sync_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert and update form; `id` stays with the table.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = t_sync_configuration)]
#[diesel(treat_none_as_null = true)]
pub struct NewSyncConfigurationRow {
    pub sync_type: String,
    pub is_enabled: bool,
    pub config_data: String,
    pub last_sync_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SyncConfiguration> for NewSyncConfigurationRow {
    type Error = ConfigurationStoreError;

    fn try_from(config: &SyncConfiguration) -> Result<Self, Self::Error> {
        Ok(Self {
            sync_type: config.sync_type().to_string(),
            is_enabled: config.is_enabled,
            config_data: config.settings.encode()?,
            last_sync_time: config.last_sync_time.map(to_millis),
            created_at: to_millis(config.created_at),
            updated_at: to_millis(config.updated_at),
        })
    }
}

impl TryFrom<SyncConfigurationRow> for SyncConfiguration {
    type Error = ConfigurationStoreError;

    fn try_from(row: SyncConfigurationRow) -> Result<Self, Self::Error> {
        let settings = SyncSettings::decode(&row.sync_type, &row.config_data)?;

        Ok(SyncConfiguration {
            id: Some(row.id),
            is_enabled: row.is_enabled,
            settings,
            last_sync_time: row.last_sync_time.map(from_millis),
            created_at: from_millis(row.created_at),
            updated_at: from_millis(row.updated_at),
        })
    }
}
