mod support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;

use cs_app::{AttemptOutcome, AutoSyncController};
use cs_core::{
    LocalFileSyncConfig, SyncConfiguration, SyncSettings, SyncStatusEvent, SyncStatusKind,
    SyncTrigger,
};
use support::{ts, ManualClock, RunnerMode, ScriptedRunner};

fn config(interval_minutes: u32, on_change: bool, enabled: bool) -> SyncConfiguration {
    SyncConfiguration::new(
        SyncSettings::LocalFile(LocalFileSyncConfig {
            sync_folder_path: "/tmp/clipsync".into(),
            sync_interval_minutes: interval_minutes,
            auto_sync_on_clipboard_change: on_change,
            ..Default::default()
        }),
        enabled,
        ts(0),
    )
}

fn controller(runner: Arc<ScriptedRunner>) -> AutoSyncController {
    AutoSyncController::new(runner, ManualClock::at(ts(1_700_000_000)))
}

fn drain(rx: &mut broadcast::Receiver<SyncStatusEvent>) -> Vec<SyncStatusKind> {
    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.kind);
    }
    kinds
}

#[tokio::test(start_paused = true)]
async fn disabled_configuration_never_starts_or_syncs() {
    let runner = ScriptedRunner::new(Some(config(1, true, false)));
    let controller = controller(runner.clone());
    let mut events = controller.subscribe();

    assert!(!controller.start().await);
    controller.on_clipboard_changed().await;
    let outcome = controller.manual_sync("button").await;
    sleep(Duration::from_secs(600)).await;

    assert!(matches!(outcome, AttemptOutcome::Skipped(_)));
    assert_eq!(runner.calls(), 0);
    let status = controller.status().await;
    assert!(!status.is_running);
    assert!(!status.is_syncing);

    let kinds = drain(&mut events);
    assert!(!kinds.contains(&SyncStatusKind::SyncStarted));
    assert!(kinds.iter().all(|kind| *kind == SyncStatusKind::Skipped));
}

#[tokio::test(start_paused = true)]
async fn missing_configuration_leaves_scheduler_stopped() {
    let runner = ScriptedRunner::new(None);
    let controller = controller(runner.clone());

    assert!(!controller.start().await);
    assert!(matches!(
        controller.manual_sync("cli").await,
        AttemptOutcome::Skipped(_)
    ));
    assert_eq!(runner.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn timer_fires_every_interval() {
    let runner = ScriptedRunner::new(Some(config(1, false, true)));
    let controller = controller(runner.clone());

    assert!(controller.start().await);
    let status = controller.status().await;
    assert!(status.is_running);
    assert_eq!(
        status.next_sync_time,
        Some(ts(1_700_000_000 + 60)),
    );

    sleep(Duration::from_secs(59)).await;
    assert_eq!(runner.calls(), 0);

    sleep(Duration::from_secs(62)).await;
    assert_eq!(runner.calls(), 2);
    assert!(runner
        .triggers
        .lock()
        .unwrap()
        .iter()
        .all(|t| *t == SyncTrigger::Timer));
    assert!(controller.status().await.last_sync_time.is_some());
}

#[tokio::test(start_paused = true)]
async fn stop_disarms_timer() {
    let runner = ScriptedRunner::new(Some(config(1, false, true)));
    let controller = controller(runner.clone());
    let mut events = controller.subscribe();

    assert!(controller.start().await);
    controller.stop().await;
    sleep(Duration::from_secs(600)).await;

    assert_eq!(runner.calls(), 0);
    let status = controller.status().await;
    assert!(!status.is_running);
    assert_eq!(status.next_sync_time, None);
    assert_eq!(
        drain(&mut events),
        vec![SyncStatusKind::Started, SyncStatusKind::Stopped]
    );
}

#[tokio::test(start_paused = true)]
async fn clipboard_changes_collapse_into_one_attempt() {
    let runner = ScriptedRunner::new(Some(config(60, true, true)));
    let controller = controller(runner.clone());
    assert!(controller.start().await);

    for _ in 0..3 {
        controller.on_clipboard_changed().await;
        sleep(Duration::from_secs(1)).await;
    }
    assert_eq!(runner.calls(), 0);

    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(runner.calls(), 1);
    assert_eq!(
        runner.triggers.lock().unwrap().as_slice(),
        &[SyncTrigger::ClipboardChange]
    );

    // A change after the quiet window is a fresh attempt.
    controller.on_clipboard_changed().await;
    sleep(Duration::from_secs(4)).await;
    assert_eq!(runner.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn clipboard_changes_ignored_without_opt_in_or_when_stopped() {
    let runner = ScriptedRunner::new(Some(config(60, false, true)));
    let controller = controller(runner.clone());
    assert!(controller.start().await);

    controller.on_clipboard_changed().await;
    sleep(Duration::from_secs(10)).await;
    assert_eq!(runner.calls(), 0);

    let opted_in = ScriptedRunner::new(Some(config(60, true, true)));
    let stopped = AutoSyncController::new(opted_in.clone(), ManualClock::at(ts(0)));
    stopped.on_clipboard_changed().await;
    sleep(Duration::from_secs(10)).await;
    assert_eq!(opted_in.calls(), 0);
}

#[tokio::test]
async fn concurrent_triggers_run_exactly_once() {
    let (runner, gate) = ScriptedRunner::gated(config(60, false, true));
    let controller = controller(runner.clone());

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.manual_sync("first").await })
    };
    while runner.calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(controller.status().await.is_syncing);

    let mut dropped = Vec::new();
    for i in 0..5 {
        let controller = controller.clone();
        dropped.push(tokio::spawn(async move {
            controller.manual_sync(format!("extra-{i}")).await
        }));
    }
    for handle in dropped {
        assert_eq!(handle.await.unwrap(), AttemptOutcome::AlreadySyncing);
    }

    gate.add_permits(1);
    assert!(matches!(
        first.await.unwrap(),
        AttemptOutcome::Completed(_)
    ));
    assert_eq!(runner.calls(), 1);
    assert!(!controller.status().await.is_syncing);
}

#[tokio::test(start_paused = true)]
async fn three_consecutive_failures_halt_the_scheduler() {
    let runner = ScriptedRunner::new(Some(config(1, false, true)));
    runner.set_mode(RunnerMode::FailTransport);
    let controller = controller(runner.clone());
    let mut events = controller.subscribe();

    assert!(controller.start().await);
    sleep(Duration::from_secs(5 * 60 + 1)).await;

    assert_eq!(runner.calls(), 3);
    let status = controller.status().await;
    assert!(!status.is_running);
    assert_eq!(status.error_count, 3);
    assert!(status.last_error.is_some());

    let kinds = drain(&mut events);
    assert_eq!(
        kinds.iter().filter(|k| **k == SyncStatusKind::SyncFailed).count(),
        3
    );
    assert_eq!(kinds.last(), Some(&SyncStatusKind::Halted));
    assert_eq!(
        kinds.iter().filter(|k| **k == SyncStatusKind::Halted).count(),
        1
    );

    sleep(Duration::from_secs(10 * 60)).await;
    assert_eq!(runner.calls(), 3);

    // Only an explicit start resumes, with a fresh error budget.
    runner.set_mode(RunnerMode::Succeed);
    assert!(controller.start().await);
    assert_eq!(controller.status().await.error_count, 0);
    sleep(Duration::from_secs(61)).await;
    assert_eq!(runner.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn restart_after_halt_rearms_timer_with_fresh_budget() {
    let runner = ScriptedRunner::new(Some(config(1, false, true)));
    runner.set_mode(RunnerMode::FailTransport);
    let controller = controller(runner.clone());
    let mut events = controller.subscribe();

    assert!(controller.start().await);
    sleep(Duration::from_secs(3 * 60 + 1)).await;
    assert!(!controller.status().await.is_running);
    assert_eq!(drain(&mut events).last(), Some(&SyncStatusKind::Halted));

    runner.set_mode(RunnerMode::Succeed);
    assert!(controller.start().await);

    assert_eq!(drain(&mut events), vec![SyncStatusKind::Started]);
    let status = controller.status().await;
    assert!(status.is_running);
    assert_eq!(status.error_count, 0);
    assert!(status.last_error.is_none());
    assert!(status.next_sync_time.is_some());

    sleep(Duration::from_secs(2 * 60 + 1)).await;
    assert_eq!(runner.calls(), 5);
    let status = controller.status().await;
    assert!(status.is_running);
    assert_eq!(status.error_count, 0);
    assert!(status.last_sync_time.is_some());
    assert_eq!(
        drain(&mut events),
        vec![
            SyncStatusKind::SyncStarted,
            SyncStatusKind::SyncSucceeded,
            SyncStatusKind::SyncStarted,
            SyncStatusKind::SyncSucceeded,
        ]
    );
}

#[tokio::test]
async fn busy_runner_is_not_counted_as_a_failure() {
    let runner = ScriptedRunner::new(Some(config(60, false, true)));
    runner.set_mode(RunnerMode::Busy);
    let controller = controller(runner.clone());

    assert_eq!(controller.manual_sync("test").await, AttemptOutcome::AlreadySyncing);
    assert_eq!(controller.manual_sync("test").await, AttemptOutcome::AlreadySyncing);

    let status = controller.status().await;
    assert_eq!(status.error_count, 0);
    assert!(status.last_error.is_none());
    assert!(!status.is_syncing);
}

#[tokio::test]
async fn success_resets_error_budget() {
    let runner = ScriptedRunner::new(Some(config(60, false, true)));
    let controller = controller(runner.clone());

    runner.set_mode(RunnerMode::FailTransport);
    assert!(matches!(
        controller.manual_sync("retry").await,
        AttemptOutcome::Failed(_)
    ));
    assert_eq!(controller.status().await.error_count, 1);

    runner.set_mode(RunnerMode::Succeed);
    assert!(matches!(
        controller.manual_sync("retry").await,
        AttemptOutcome::Completed(_)
    ));
    let status = controller.status().await;
    assert_eq!(status.error_count, 0);
    assert_eq!(status.last_error, None);
    assert!(status.last_sync_time.is_some());
}

#[tokio::test]
async fn configuration_errors_do_not_count_as_failures() {
    let runner = ScriptedRunner::new(Some(config(60, false, true)));
    runner.set_mode(RunnerMode::FailConfiguration);
    let controller = controller(runner.clone());
    let mut events = controller.subscribe();

    for _ in 0..4 {
        assert!(matches!(
            controller.manual_sync("cli").await,
            AttemptOutcome::Skipped(_)
        ));
    }

    assert_eq!(controller.status().await.error_count, 0);
    let kinds = drain(&mut events);
    assert!(!kinds.contains(&SyncStatusKind::SyncFailed));
    assert!(!kinds.contains(&SyncStatusKind::Halted));
}

#[tokio::test]
async fn manual_attempt_emits_lifecycle_in_order() {
    let runner = ScriptedRunner::new(Some(config(60, false, true)));
    let controller = controller(runner.clone());
    let mut events = controller.subscribe();

    controller.manual_sync("button").await;

    let first = events.recv().await.unwrap();
    assert_eq!(first.kind, SyncStatusKind::SyncStarted);
    assert!(first.is_syncing);
    let second = events.recv().await.unwrap();
    assert_eq!(second.kind, SyncStatusKind::SyncSucceeded);
    assert!(!second.is_syncing);
}

#[tokio::test(start_paused = true)]
async fn listeners_can_read_status_when_an_event_arrives() {
    let runner = ScriptedRunner::new(Some(config(1, false, true)));
    runner.set_mode(RunnerMode::FailTransport);
    let controller = controller(runner.clone());
    let mut events = controller.subscribe();

    let listener = tokio::spawn({
        let controller = controller.clone();
        async move {
            let mut seen = Vec::new();
            while let Ok(event) = events.recv().await {
                let status = controller.status().await;
                seen.push((event.kind, status.error_count, status.is_running));
                if event.kind == SyncStatusKind::Halted {
                    break;
                }
            }
            seen
        }
    });

    assert!(controller.start().await);
    sleep(Duration::from_secs(3 * 60 + 1)).await;

    let seen = listener.await.unwrap();
    assert_eq!(seen.first().map(|s| s.0), Some(SyncStatusKind::Started));
    assert_eq!(seen.last(), Some(&(SyncStatusKind::Halted, 3, false)));
    let failures: Vec<u32> = seen
        .iter()
        .filter(|(kind, _, _)| *kind == SyncStatusKind::SyncFailed)
        .map(|(_, errors, _)| *errors)
        .collect();
    assert_eq!(failures.len(), 3);
    assert!(failures.iter().all(|errors| *errors >= 1));
}
