//! # Dependency Injection
//!
//! The only place that depends on cs-infra and cs-app at the same time. It builds
//! the concrete adapters, hands them to the use cases through their ports, and
//! seeds the configuration store from the `[sync]` section on first start.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use cs_app::{AutoSyncController, SyncOrchestrator, SyncOrchestratorDeps};
use cs_core::ports::{ClipboardStorePort, ClockPort, SyncConfigurationPort};
use cs_core::DeviceId;
use cs_infra::db::pool::init_db_pool;
use cs_infra::db::repositories::{DieselClipboardRepository, DieselSyncConfigurationRepository};
use cs_infra::{HttpSyncTransport, JsonSnapshotFile, StaticCredentials, SystemClock};

use super::config::{default_data_dir, AppConfig};

const DATABASE_FILE_NAME: &str = "clipsync.db";
const DEVICE_ID_FILE_NAME: &str = "device_id";

/// Everything the CLI commands need, assembled once at startup.
pub struct AppDeps {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub controller: AutoSyncController,
    pub store: Arc<dyn ClipboardStorePort>,
    pub config_store: Arc<dyn SyncConfigurationPort>,
    pub device_id: DeviceId,
}

pub async fn wire_dependencies(config: &AppConfig) -> anyhow::Result<AppDeps> {
    let data_dir = default_data_dir()?;
    let database_path = resolve_database_path(config, &data_dir);
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let database_url = database_path.to_string_lossy().into_owned();
    let pool = init_db_pool(&database_url)?;
    info!(database = %database_path.display(), "database ready");

    let device_id = resolve_device_id(config, &data_dir)?;
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);

    let store: Arc<dyn ClipboardStorePort> = Arc::new(DieselClipboardRepository::new(pool.clone()));
    let config_store: Arc<dyn SyncConfigurationPort> =
        Arc::new(DieselSyncConfigurationRepository::new(pool));
    seed_configuration(config, config_store.as_ref(), clock.as_ref()).await?;

    let credentials = Arc::new(StaticCredentials::new(config.auth.token.clone()));
    let transport = HttpSyncTransport::new(credentials).context("Failed to build HTTP client")?;

    let orchestrator = Arc::new(SyncOrchestrator::from_deps(SyncOrchestratorDeps {
        store: store.clone(),
        config_store: config_store.clone(),
        files: Arc::new(JsonSnapshotFile::new()),
        transport: Arc::new(transport),
        clock: clock.clone(),
        device_id: device_id.clone(),
    }));
    let controller = AutoSyncController::new(orchestrator.clone(), clock);

    Ok(AppDeps {
        orchestrator,
        controller,
        store,
        config_store,
        device_id,
    })
}

fn resolve_database_path(config: &AppConfig, data_dir: &Path) -> PathBuf {
    if config.storage.database_path.as_os_str().is_empty() {
        data_dir.join(DATABASE_FILE_NAME)
    } else {
        config.storage.database_path.clone()
    }
}

/// Configured id, else the one generated on a previous start, else a new one.
fn resolve_device_id(config: &AppConfig, data_dir: &Path) -> anyhow::Result<DeviceId> {
    let configured = DeviceId::new(config.device.id.trim());
    if !configured.is_empty() {
        if !configured.is_valid() {
            warn!(device_id = %configured, "configured device id has unexpected characters");
        }
        return Ok(configured);
    }

    let path = data_dir.join(DEVICE_ID_FILE_NAME);
    match std::fs::read_to_string(&path) {
        Ok(stored) if !stored.trim().is_empty() => return Ok(DeviceId::new(stored.trim())),
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    }

    let generated = DeviceId::generate();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    std::fs::write(&path, generated.as_str())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(device_id = %generated, "generated device id");
    Ok(generated)
}

async fn seed_configuration(
    config: &AppConfig,
    config_store: &dyn SyncConfigurationPort,
    clock: &dyn ClockPort,
) -> anyhow::Result<()> {
    let Some(seed) = &config.sync else {
        return Ok(());
    };

    let existing = config_store
        .get_current()
        .await
        .context("Failed to read the current sync configuration")?;
    if existing.is_some() {
        return Ok(());
    }

    let configuration = seed.to_configuration(clock.now())?;
    let id = config_store
        .save(&configuration)
        .await
        .context("Failed to store the seeded sync configuration")?;
    info!(id, sync_type = %configuration.sync_type(), "seeded sync configuration");
    Ok(())
}
