use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use cs_core::ports::{
    ClipboardStorePort, ClockPort, RemoteSyncPort, SnapshotFilePort, SyncConfigurationPort,
};
use cs_core::{
    DeviceId, LocalFileSyncConfig, ServerSyncConfig, SyncConfiguration,
    SyncDirection, SyncHistory, SyncHistoryEntry, SyncOperation, SyncSettings, SyncTrigger,
};

use super::error::SyncError;
use super::local_file::{LocalFileSync, DEFAULT_MAX_BACKUP_FILES};
use super::remote::RemoteSync;

/// Result of one successful attempt, as recorded in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub operation: SyncOperation,
    pub target: String,
    pub record_count: usize,
}

/// Dependency bundle for [`SyncOrchestrator::from_deps`].
pub struct SyncOrchestratorDeps {
    pub store: Arc<dyn ClipboardStorePort>,
    pub config_store: Arc<dyn SyncConfigurationPort>,
    pub files: Arc<dyn SnapshotFilePort>,
    pub transport: Arc<dyn RemoteSyncPort>,
    pub clock: Arc<dyn ClockPort>,
    /// Used when a server configuration does not name its own device.
    pub device_id: DeviceId,
}

/// Runs sync attempts end-to-end.
///
/// Every attempt that gets past configuration checks appends exactly one history
/// entry. Configuration-driven attempts advance the watermark on success only.
/// At most one attempt runs at a time, whichever entry point starts it; a
/// concurrent call fails with [`SyncError::AlreadySyncing`].
pub struct SyncOrchestrator {
    config_store: Arc<dyn SyncConfigurationPort>,
    local_file: LocalFileSync,
    remote: RemoteSync,
    clock: Arc<dyn ClockPort>,
    device_id: DeviceId,
    history: Mutex<SyncHistory>,
    attempt: Mutex<()>,
    shutdown: CancellationToken,
}

/// What a configuration-driven attempt will do, decided before any I/O.
enum SyncPlan {
    LocalFile {
        path: PathBuf,
        config: LocalFileSyncConfig,
    },
    Server {
        operation: SyncOperation,
        config: ServerSyncConfig,
    },
}

impl SyncOrchestrator {
    pub fn from_deps(deps: SyncOrchestratorDeps) -> Self {
        let SyncOrchestratorDeps {
            store,
            config_store,
            files,
            transport,
            clock,
            device_id,
        } = deps;

        Self {
            config_store,
            local_file: LocalFileSync::new(store.clone(), files, clock.clone()),
            remote: RemoteSync::new(store, transport),
            clock,
            device_id,
            history: Mutex::new(SyncHistory::new()),
            attempt: Mutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Most recently created configuration.
    pub async fn load_configuration(&self) -> Result<SyncConfiguration, SyncError> {
        match self.config_store.get_current().await {
            Ok(Some(config)) => Ok(config),
            Ok(None) => Err(SyncError::NotConfigured),
            Err(err) => Err(SyncError::ConfigurationUnavailable(err)),
        }
    }

    /// One scheduled attempt driven by the active configuration.
    ///
    /// LocalFile imports the shared snapshot (when present and valid) and exports
    /// the merged store back to it. Server runs the configured direction.
    pub async fn sync_now(&self, trigger: &SyncTrigger) -> Result<SyncSummary, SyncError> {
        let span = info_span!("usecase.sync.attempt", trigger = %trigger.describe());

        async move {
            let _attempt = self.begin_attempt()?;
            let config = self.load_configuration().await?;
            if !config.is_enabled {
                return Err(SyncError::Disabled);
            }

            match plan(&config)? {
                SyncPlan::LocalFile { path, config: local } => {
                    let result = self.local_round_trip(&path, &local).await;
                    self.finish(config, SyncOperation::Bidirectional, display(&path), result, None)
                        .await
                }
                SyncPlan::Server {
                    operation,
                    config: server,
                } => self.remote_attempt(config, operation, &server).await,
            }
        }
        .instrument(span)
        .await
    }

    /// Exchange with the configured server in `direction`, overriding the configured one.
    pub async fn run_remote(&self, direction: SyncDirection) -> Result<SyncSummary, SyncError> {
        let _attempt = self.begin_attempt()?;
        let config = self.load_configuration().await?;
        if !config.is_enabled {
            return Err(SyncError::Disabled);
        }
        let SyncSettings::Server(server) = &config.settings else {
            return Err(SyncError::NotServerSync);
        };
        let server = server.clone();
        if server.server_url.trim().is_empty() {
            return Err(SyncError::MissingServerUrl);
        }

        self.remote_attempt(config, operation_for(direction), &server)
            .await
    }

    /// Export the store to `path`, keeping the configured number of backups.
    pub async fn export_snapshot(&self, path: &Path) -> Result<SyncSummary, SyncError> {
        let _attempt = self.begin_attempt()?;
        let max_backups = self
            .local_settings()
            .await
            .map(|c| c.max_backup_files as usize)
            .unwrap_or(DEFAULT_MAX_BACKUP_FILES);

        let result = self.local_file.export(path, max_backups).await;
        self.record(SyncOperation::Export, display(path), result).await
    }

    /// Import `path` into the store under the configured conflict policy.
    pub async fn import_snapshot(&self, path: &Path) -> Result<SyncSummary, SyncError> {
        let _attempt = self.begin_attempt()?;
        let strategy = self
            .local_settings()
            .await
            .map(|c| c.effective_strategy())
            .unwrap_or_default();

        let result = self
            .local_file
            .import(path, strategy)
            .await
            .map(|report| report.applied());
        self.record(SyncOperation::Import, display(path), result).await
    }

    /// Whether `path` holds a readable snapshot. Recorded as a `Validate` entry.
    pub async fn validate_snapshot(&self, path: &Path) -> bool {
        let valid = self.local_file.validate(path).await;
        let now = self.clock.now();
        let entry = if valid {
            SyncHistoryEntry::succeeded(SyncOperation::Validate, display(path), 0, now)
        } else {
            SyncHistoryEntry::failed(
                SyncOperation::Validate,
                display(path),
                "missing or not a JSON array",
                now,
            )
        };
        self.history.lock().await.push(entry);
        valid
    }

    pub async fn history(&self) -> Vec<SyncHistoryEntry> {
        self.history.lock().await.entries()
    }

    /// Cancel in-flight remote exchanges; later exchanges fail immediately.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn begin_attempt(&self) -> Result<MutexGuard<'_, ()>, SyncError> {
        self.attempt.try_lock().map_err(|_| SyncError::AlreadySyncing)
    }

    async fn local_settings(&self) -> Option<LocalFileSyncConfig> {
        match self.load_configuration().await {
            Ok(SyncConfiguration {
                settings: SyncSettings::LocalFile(config),
                ..
            }) => Some(config),
            _ => None,
        }
    }

    async fn local_round_trip(
        &self,
        path: &Path,
        config: &LocalFileSyncConfig,
    ) -> Result<usize, SyncError> {
        let mut imported = 0;
        if self.local_file.exists(path).await {
            if self.local_file.validate(path).await {
                imported = self
                    .local_file
                    .import(path, config.effective_strategy())
                    .await?
                    .applied();
            } else {
                warn!(path = %path.display(), "shared snapshot is not a JSON array, overwriting after backup");
            }
        }

        let exported = self
            .local_file
            .export(path, config.max_backup_files as usize)
            .await?;

        debug!(imported, exported, "local file round trip finished");
        // History counts what changed locally; the export always rewrites everything.
        Ok(imported)
    }

    async fn remote_attempt(
        &self,
        mut config: SyncConfiguration,
        operation: SyncOperation,
        server: &ServerSyncConfig,
    ) -> Result<SyncSummary, SyncError> {
        let device_id = if server.device_id.is_empty() {
            self.device_id.clone()
        } else {
            server.device_id.clone()
        };
        let watermark = config.last_sync_time.or(server.last_sync_time);

        let result = self
            .remote
            .execute(
                operation,
                server,
                &device_id,
                watermark,
                server.push_cursor,
                self.shutdown.child_token(),
            )
            .await;

        let (count, sync_time) = match result {
            Ok(report) => {
                if let SyncSettings::Server(stored) = &mut config.settings {
                    stored.push_cursor = report.push_cursor;
                }
                (Ok(report.record_count()), Some(report.sync_time))
            }
            Err(err) => (Err(err), None),
        };
        self.finish(config, operation, server.server_url.clone(), count, sync_time)
            .await
    }

    /// Record history and, on success, persist the new watermark.
    async fn finish(
        &self,
        mut config: SyncConfiguration,
        operation: SyncOperation,
        target: String,
        result: Result<usize, SyncError>,
        sync_time: Option<DateTime<Utc>>,
    ) -> Result<SyncSummary, SyncError> {
        let summary = self.record(operation, target, result).await?;

        config.record_success(sync_time.unwrap_or_else(|| self.clock.now()));
        if let Err(err) = self.config_store.save(&config).await {
            error!(error = %err, "sync succeeded but the watermark could not be saved");
        }

        Ok(summary)
    }

    async fn record(
        &self,
        operation: SyncOperation,
        target: String,
        result: Result<usize, SyncError>,
    ) -> Result<SyncSummary, SyncError> {
        let now = self.clock.now();
        let mut history = self.history.lock().await;

        match result {
            Ok(record_count) => {
                history.push(SyncHistoryEntry::succeeded(
                    operation,
                    target.clone(),
                    record_count,
                    now,
                ));
                info!(?operation, %target, record_count, "sync attempt succeeded");
                Ok(SyncSummary {
                    operation,
                    target,
                    record_count,
                })
            }
            Err(err) => {
                history.push(SyncHistoryEntry::failed(operation, target.clone(), &err, now));
                warn!(?operation, %target, error = %err, "sync attempt failed");
                Err(err)
            }
        }
    }
}

fn plan(config: &SyncConfiguration) -> Result<SyncPlan, SyncError> {
    match &config.settings {
        SyncSettings::LocalFile(local) => {
            let path = local.snapshot_path().ok_or(SyncError::MissingFolderPath)?;
            Ok(SyncPlan::LocalFile {
                path,
                config: local.clone(),
            })
        }
        SyncSettings::Server(server) => {
            if server.server_url.trim().is_empty() {
                return Err(SyncError::MissingServerUrl);
            }
            Ok(SyncPlan::Server {
                operation: operation_for(server.sync_direction),
                config: server.clone(),
            })
        }
        SyncSettings::Unsupported { sync_type, .. } => {
            Err(SyncError::UnsupportedType(sync_type.clone()))
        }
    }
}

fn operation_for(direction: SyncDirection) -> SyncOperation {
    match direction {
        SyncDirection::PushOnly => SyncOperation::Push,
        SyncDirection::PullOnly => SyncOperation::Pull,
        SyncDirection::Bidirectional => SyncOperation::Bidirectional,
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

