//! Auto-sync scheduling.
//!
//! The controller owns cadence: a periodic timer, a debounced clipboard-change
//! trigger and manual requests. Every trigger funnels into one guarded attempt;
//! a trigger that arrives while an attempt is in flight is dropped, not queued.
//! Status transitions are broadcast to subscribers in attempt-lifecycle order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use cs_core::ports::ClockPort;
use cs_core::{AutoSyncStatus, SyncConfiguration, SyncStatusEvent, SyncStatusKind, SyncTrigger};

use crate::usecases::sync::{SyncError, SyncOrchestrator, SyncSummary};

/// Quiet window after a clipboard change before an attempt starts.
pub const CLIPBOARD_DEBOUNCE: Duration = Duration::from_secs(3);

/// Consecutive failed attempts after which the scheduler stops itself.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

const STATUS_CHANNEL_CAPACITY: usize = 64;

/// What the controller drives. Implemented by [`SyncOrchestrator`].
#[async_trait]
pub trait SyncAttemptRunner: Send + Sync {
    async fn load_configuration(&self) -> Result<SyncConfiguration, SyncError>;

    async fn run_attempt(&self, trigger: &SyncTrigger) -> Result<SyncSummary, SyncError>;
}

#[async_trait]
impl SyncAttemptRunner for SyncOrchestrator {
    async fn load_configuration(&self) -> Result<SyncConfiguration, SyncError> {
        SyncOrchestrator::load_configuration(self).await
    }

    async fn run_attempt(&self, trigger: &SyncTrigger) -> Result<SyncSummary, SyncError> {
        self.sync_now(trigger).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Completed(SyncSummary),
    Failed(String),
    /// Configuration problem; nothing ran and the error budget is untouched.
    Skipped(String),
    /// Another attempt was in flight; this trigger was dropped.
    AlreadySyncing,
}

struct Inner {
    runner: Arc<dyn SyncAttemptRunner>,
    clock: Arc<dyn ClockPort>,
    state: Mutex<AutoSyncStatus>,
    timer: Mutex<Option<JoinHandle<()>>>,
    change_generation: AtomicU64,
    events: broadcast::Sender<SyncStatusEvent>,
    debounce: Duration,
    max_failures: u32,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}

/// Cheap to clone; clones share one scheduler.
#[derive(Clone)]
pub struct AutoSyncController {
    inner: Arc<Inner>,
}

impl AutoSyncController {
    pub fn new(runner: Arc<dyn SyncAttemptRunner>, clock: Arc<dyn ClockPort>) -> Self {
        Self::with_policy(runner, clock, CLIPBOARD_DEBOUNCE, MAX_CONSECUTIVE_FAILURES)
    }

    pub fn with_policy(
        runner: Arc<dyn SyncAttemptRunner>,
        clock: Arc<dyn ClockPort>,
        debounce: Duration,
        max_failures: u32,
    ) -> Self {
        let (events, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                runner,
                clock,
                state: Mutex::new(AutoSyncStatus::default()),
                timer: Mutex::new(None),
                change_generation: AtomicU64::new(0),
                events,
                debounce,
                max_failures: max_failures.max(1),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncStatusEvent> {
        self.inner.events.subscribe()
    }

    pub async fn status(&self) -> AutoSyncStatus {
        self.inner.state.lock().await.clone()
    }

    /// Arm the periodic timer from the active configuration.
    ///
    /// Returns whether the scheduler is running afterwards. A disabled, missing or
    /// non-schedulable configuration leaves it stopped and emits `Skipped`.
    /// Starting again re-arms the timer with the current interval.
    pub async fn start(&self) -> bool {
        let config = match self.inner.runner.load_configuration().await {
            Ok(config) => config,
            Err(err) => {
                self.stop_quietly().await;
                self.emit(SyncStatusKind::Skipped, err.to_string(), false);
                return false;
            }
        };

        if !config.is_enabled {
            self.stop_quietly().await;
            self.emit(SyncStatusKind::Skipped, SyncError::Disabled.to_string(), false);
            return false;
        }

        let Some(period) = config.settings.interval() else {
            self.stop_quietly().await;
            let reason = SyncError::UnsupportedType(config.sync_type().to_string());
            self.emit(SyncStatusKind::Skipped, reason.to_string(), false);
            return false;
        };

        self.arm_timer(period).await;

        let now = self.inner.clock.now();
        let is_syncing = {
            let mut state = self.inner.state.lock().await;
            state.is_running = true;
            state.error_count = 0;
            state.last_error = None;
            state.next_sync_time = Some(after(now, period));
            state.is_syncing
        };

        info!(
            sync_type = %config.sync_type(),
            interval_secs = period.as_secs(),
            "auto sync started"
        );
        self.emit(
            SyncStatusKind::Started,
            format!("auto sync every {} min", period.as_secs() / 60),
            is_syncing,
        );
        true
    }

    /// Disarm the timer. An attempt already in flight runs to completion.
    pub async fn stop(&self) {
        if self.stop_quietly().await {
            info!("auto sync stopped");
            let is_syncing = self.inner.state.lock().await.is_syncing;
            self.emit(SyncStatusKind::Stopped, "auto sync stopped", is_syncing);
        }
    }

    /// Schedule an attempt once the clipboard has been quiet for the debounce window.
    ///
    /// Ignored unless the scheduler is running and the configuration is enabled and
    /// opts into change-triggered sync. A newer change supersedes a pending one.
    pub async fn on_clipboard_changed(&self) {
        if !self.inner.state.lock().await.is_running {
            return;
        }

        match self.inner.runner.load_configuration().await {
            Ok(config) if config.is_enabled && config.settings.syncs_on_clipboard_change() => {}
            Ok(_) => return,
            Err(err) => {
                debug!(error = %err, "ignoring clipboard change");
                return;
            }
        }

        let generation = self.inner.change_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let controller = self.clone();

        tokio::spawn(async move {
            sleep(controller.inner.debounce).await;

            if controller.inner.change_generation.load(Ordering::SeqCst) != generation {
                debug!(generation, "clipboard change superseded");
                return;
            }
            controller.run_guarded(SyncTrigger::ClipboardChange).await;
        });
    }

    /// Run an attempt now, bypassing the timer but not the single-flight guard.
    pub async fn manual_sync(&self, reason: impl Into<String>) -> AttemptOutcome {
        self.run_guarded(SyncTrigger::Manual(reason.into())).await
    }

    async fn run_guarded(&self, trigger: SyncTrigger) -> AttemptOutcome {
        let config = match self.inner.runner.load_configuration().await {
            Ok(config) => config,
            Err(err) => return self.skip(err),
        };
        if !config.is_enabled {
            return self.skip(SyncError::Disabled);
        }

        {
            let mut state = self.inner.state.lock().await;
            if trigger.is_automatic() && !state.is_running {
                debug!(trigger = %trigger.describe(), "scheduler stopped, dropping trigger");
                return AttemptOutcome::Skipped("auto sync is not running".to_string());
            }
            if state.is_syncing {
                debug!(trigger = %trigger.describe(), "attempt in flight, dropping trigger");
                return AttemptOutcome::AlreadySyncing;
            }
            state.is_syncing = true;
        }
        self.emit(
            SyncStatusKind::SyncStarted,
            format!("sync started ({})", trigger.describe()),
            true,
        );

        let result = self.inner.runner.run_attempt(&trigger).await;

        let now = self.inner.clock.now();
        let mut events = Vec::new();
        let outcome = {
            let mut state = self.inner.state.lock().await;
            state.is_syncing = false;

            match result {
                Ok(summary) => {
                    state.error_count = 0;
                    state.last_error = None;
                    state.last_sync_time = Some(now);
                    if state.is_running {
                        state.next_sync_time =
                            config.settings.interval().map(|period| after(now, period));
                    }
                    events.push((
                        SyncStatusKind::SyncSucceeded,
                        format!("{:?} synced {} records", summary.operation, summary.record_count),
                    ));
                    AttemptOutcome::Completed(summary)
                }
                // A direct orchestrator call holds the attempt slot.
                Err(SyncError::AlreadySyncing) => {
                    debug!(trigger = %trigger.describe(), "orchestrator busy, dropping trigger");
                    events.push((
                        SyncStatusKind::Skipped,
                        SyncError::AlreadySyncing.to_string(),
                    ));
                    AttemptOutcome::AlreadySyncing
                }
                Err(err) if err.is_configuration() => {
                    let message = err.to_string();
                    debug!(reason = %message, "sync attempt skipped");
                    events.push((SyncStatusKind::Skipped, message.clone()));
                    AttemptOutcome::Skipped(message)
                }
                Err(err) => {
                    let message = err.to_string();
                    state.error_count += 1;
                    state.last_error = Some(message.clone());
                    warn!(
                        error_count = state.error_count,
                        error = %message,
                        "sync attempt failed"
                    );
                    events.push((SyncStatusKind::SyncFailed, message.clone()));

                    if state.is_running && state.error_count >= self.inner.max_failures {
                        self.disarm_timer().await;
                        state.is_running = false;
                        state.next_sync_time = None;
                        warn!(
                            error_count = state.error_count,
                            "too many consecutive failures, auto sync halted"
                        );
                        events.push((
                            SyncStatusKind::Halted,
                            format!(
                                "auto sync halted after {} consecutive failures",
                                state.error_count
                            ),
                        ));
                    }
                    AttemptOutcome::Failed(message)
                }
            }
        };

        for (kind, message) in events {
            self.emit(kind, message, false);
        }
        outcome
    }

    fn skip(&self, err: SyncError) -> AttemptOutcome {
        let message = err.to_string();
        debug!(reason = %message, "sync attempt skipped");
        self.emit(SyncStatusKind::Skipped, message.clone(), false);
        AttemptOutcome::Skipped(message)
    }

    async fn arm_timer(&self, period: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(run_timer(weak, period));

        if let Some(previous) = self.inner.timer.lock().await.replace(handle) {
            previous.abort();
        }
    }

    async fn disarm_timer(&self) {
        if let Some(handle) = self.inner.timer.lock().await.take() {
            handle.abort();
        }
    }

    /// Returns whether the scheduler was running.
    async fn stop_quietly(&self) -> bool {
        self.disarm_timer().await;

        let mut state = self.inner.state.lock().await;
        let was_running = state.is_running;
        state.is_running = false;
        state.next_sync_time = None;
        was_running
    }

    fn emit(&self, kind: SyncStatusKind, message: impl Into<String>, is_syncing: bool) {
        let event = SyncStatusEvent::new(kind, message, is_syncing, self.inner.clock.now());
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

/// Each tick runs its attempt on a separate task, so halting from inside an
/// attempt can abort this loop without cancelling the attempt itself.
async fn run_timer(inner: Weak<Inner>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };
        let controller = AutoSyncController { inner };
        tokio::spawn(async move {
            controller.run_guarded(SyncTrigger::Timer).await;
        });
    }
}

fn after(now: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(period)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now)
}
