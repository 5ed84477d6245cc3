//! In-memory port doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use cs_app::{SyncAttemptRunner, SyncError, SyncSummary};
use cs_core::ports::{
    AddItemOutcome, ClipboardStorePort, ClockPort, ConfigurationStoreError, RemoteEndpoint,
    RemoteSyncPort, StoreError, SyncConfigurationPort, TransportError,
};
use cs_core::sync::protocol::{SyncExchangeData, SyncExchangeRequest};
use cs_core::{
    ClipboardRecord, DeviceId, LocalFileSyncConfig, NewClipboardRecord, RecordId,
    ServerSyncConfig, SyncConfiguration, SyncOperation, SyncSettings, SyncTrigger,
};

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn new_record(content: &str, device: &str, secs: i64) -> NewClipboardRecord {
    NewClipboardRecord::new(content, Some(DeviceId::new(device)), ts(secs)).unwrap()
}

// ---------------------------------------------------------------------------
// Item store

#[derive(Default)]
pub struct InMemoryClipboardStore {
    rows: Mutex<Vec<ClipboardRecord>>,
    next_id: AtomicI64,
}

impl InMemoryClipboardStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed(&self, content: &str, device: &str, secs: i64) -> RecordId {
        self.add_item(new_record(content, device, secs))
            .await
            .unwrap()
            .id()
    }

    pub fn records(&self) -> Vec<ClipboardRecord> {
        self.rows.lock().unwrap().clone()
    }

    /// Sorted contents, for set comparisons.
    pub fn contents(&self) -> Vec<String> {
        let mut contents: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.content.clone())
            .collect();
        contents.sort();
        contents
    }
}

#[async_trait]
impl ClipboardStorePort for InMemoryClipboardStore {
    async fn add_item(&self, record: NewClipboardRecord) -> Result<AddItemOutcome, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|row| {
            row.content == record.content
                && row.device_id == record.device_id
                && row.created_at == record.created_at
        }) {
            return Ok(AddItemOutcome::Duplicate(existing.id));
        }

        let id = RecordId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        rows.push(ClipboardRecord {
            id,
            content: record.content,
            device_id: record.device_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        });
        Ok(AddItemOutcome::Inserted(id))
    }

    async fn get_all(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<ClipboardRecord>, StoreError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn find_duplicate_by_content(
        &self,
        content: &str,
    ) -> Result<Option<ClipboardRecord>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.content == content)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn delete_item(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() != before)
    }
}

// ---------------------------------------------------------------------------
// Configuration store

#[derive(Default)]
pub struct InMemoryConfigStore {
    rows: Mutex<Vec<SyncConfiguration>>,
    pub saves: AtomicUsize,
}

impl InMemoryConfigStore {
    pub fn with(config: SyncConfiguration) -> Arc<Self> {
        let store = Self::default();
        let mut config = config;
        config.id = Some(1);
        store.rows.lock().unwrap().push(config);
        Arc::new(store)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn current(&self) -> Option<SyncConfiguration> {
        self.rows.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SyncConfigurationPort for InMemoryConfigStore {
    async fn get_current(&self) -> Result<Option<SyncConfiguration>, ConfigurationStoreError> {
        Ok(self.current())
    }

    async fn save(&self, config: &SyncConfiguration) -> Result<i64, ConfigurationStoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        match config.id {
            Some(id) => {
                let row = rows
                    .iter_mut()
                    .find(|row| row.id == Some(id))
                    .ok_or_else(|| ConfigurationStoreError::Storage("missing row".into()))?;
                *row = config.clone();
                Ok(id)
            }
            None => {
                let id = rows.len() as i64 + 1;
                let mut config = config.clone();
                config.id = Some(id);
                rows.push(config);
                Ok(id)
            }
        }
    }
}

pub fn local_file_config(folder: &std::path::Path, max_backup_files: u32) -> SyncConfiguration {
    SyncConfiguration::new(
        SyncSettings::LocalFile(LocalFileSyncConfig {
            sync_folder_path: folder.to_path_buf(),
            max_backup_files,
            ..Default::default()
        }),
        true,
        ts(1_700_000_000),
    )
}

pub fn server_config(server_url: &str, device: &str) -> SyncConfiguration {
    SyncConfiguration::new(
        SyncSettings::Server(ServerSyncConfig {
            server_url: server_url.to_string(),
            device_id: DeviceId::new(device),
            max_retry_attempts: 0,
            ..Default::default()
        }),
        true,
        ts(1_700_000_000),
    )
}

// ---------------------------------------------------------------------------
// Clock

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Remote transport

mock! {
    pub Remote {}

    #[async_trait]
    impl RemoteSyncPort for Remote {
        async fn exchange(
            &self,
            endpoint: &RemoteEndpoint,
            request: &SyncExchangeRequest,
            cancel: CancellationToken,
        ) -> Result<SyncExchangeData, TransportError>;
    }
}

/// Answers every exchange with a fixed server time, recording the pushed contents.
pub struct RecordingRemote {
    sync_time: DateTime<Utc>,
    pub sent: Mutex<Vec<Vec<String>>>,
    pub entered: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingRemote {
    pub fn new(sync_time: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            sync_time,
            sent: Mutex::new(Vec::new()),
            entered: AtomicUsize::new(0),
            gate: None,
        })
    }

    /// Every exchange blocks until a permit is added to the returned semaphore.
    pub fn gated(sync_time: DateTime<Utc>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let remote = Arc::new(Self {
            sync_time,
            sent: Mutex::new(Vec::new()),
            entered: AtomicUsize::new(0),
            gate: Some(gate.clone()),
        });
        (remote, gate)
    }

    pub fn sent(&self) -> Vec<Vec<String>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSyncPort for RecordingRemote {
    async fn exchange(
        &self,
        _endpoint: &RemoteEndpoint,
        request: &SyncExchangeRequest,
        _cancel: CancellationToken,
    ) -> Result<SyncExchangeData, TransportError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(
            request
                .local_items
                .iter()
                .map(|item| item.content.clone())
                .collect(),
        );

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        Ok(SyncExchangeData {
            sync_time: self.sync_time,
            uploaded: Vec::new(),
            remote_items: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Attempt runner for controller tests

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerMode {
    Succeed,
    FailTransport,
    FailConfiguration,
    /// Another entry point holds the attempt slot.
    Busy,
}

pub struct ScriptedRunner {
    config: Mutex<Option<SyncConfiguration>>,
    mode: Mutex<RunnerMode>,
    pub calls: AtomicUsize,
    pub triggers: Mutex<Vec<SyncTrigger>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedRunner {
    pub fn new(config: Option<SyncConfiguration>) -> Arc<Self> {
        Arc::new(Self {
            config: Mutex::new(config),
            mode: Mutex::new(RunnerMode::Succeed),
            calls: AtomicUsize::new(0),
            triggers: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    /// Every attempt blocks until a permit is added to the returned semaphore.
    pub fn gated(config: SyncConfiguration) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let runner = Arc::new(Self {
            config: Mutex::new(Some(config)),
            mode: Mutex::new(RunnerMode::Succeed),
            calls: AtomicUsize::new(0),
            triggers: Mutex::new(Vec::new()),
            gate: Some(gate.clone()),
        });
        (runner, gate)
    }

    pub fn set_mode(&self, mode: RunnerMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncAttemptRunner for ScriptedRunner {
    async fn load_configuration(&self) -> Result<SyncConfiguration, SyncError> {
        self.config
            .lock()
            .unwrap()
            .clone()
            .ok_or(SyncError::NotConfigured)
    }

    async fn run_attempt(&self, trigger: &SyncTrigger) -> Result<SyncSummary, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.triggers.lock().unwrap().push(trigger.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let mode = *self.mode.lock().unwrap();
        match mode {
            RunnerMode::Succeed => Ok(SyncSummary {
                operation: SyncOperation::Bidirectional,
                target: "test".to_string(),
                record_count: 1,
            }),
            RunnerMode::FailTransport => Err(SyncError::Transport(TransportError::Timeout)),
            RunnerMode::FailConfiguration => Err(SyncError::MissingFolderPath),
            RunnerMode::Busy => Err(SyncError::AlreadySyncing),
        }
    }
}
