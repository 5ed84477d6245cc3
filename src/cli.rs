use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use cs_app::{AttemptOutcome, SyncSummary};
use cs_core::{SyncDirection, SyncSettings, SyncStatusEvent, SyncStatusKind};

use crate::bootstrap::AppDeps;

/// Clipboard history synchronization engine
#[derive(Parser, Debug)]
#[command(name = "clipsync")]
#[command(about, long_about = None, version)]
pub struct Cli {
    /// Use specific config file (default: <config dir>/clipsync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the auto-sync scheduler until interrupted
    Run,

    /// Run one sync attempt now
    Sync {
        /// Override the configured direction (server sync only)
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
    },

    /// Write the clipboard history to a snapshot file
    Export {
        /// Snapshot file path
        path: PathBuf,
    },

    /// Merge a snapshot file into the clipboard history
    Import {
        /// Snapshot file path
        path: PathBuf,
    },

    /// Check that a snapshot file is readable
    Validate {
        /// Snapshot file path
        path: PathBuf,
    },

    /// Show the active configuration and history size
    Status,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionArg {
    Push,
    Pull,
    Both,
}

impl From<DirectionArg> for SyncDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Push => SyncDirection::PushOnly,
            DirectionArg::Pull => SyncDirection::PullOnly,
            DirectionArg::Both => SyncDirection::Bidirectional,
        }
    }
}

pub async fn execute(command: Commands, deps: &AppDeps) -> anyhow::Result<()> {
    match command {
        Commands::Run => run_daemon(deps).await,
        Commands::Sync { direction } => sync_once(deps, direction).await,
        Commands::Export { path } => {
            let summary = deps.orchestrator.export_snapshot(&path).await?;
            print_summary(&summary);
            Ok(())
        }
        Commands::Import { path } => {
            let summary = deps.orchestrator.import_snapshot(&path).await?;
            print_summary(&summary);
            Ok(())
        }
        Commands::Validate { path } => {
            if deps.orchestrator.validate_snapshot(&path).await {
                println!("{} is a valid snapshot", path.display());
                Ok(())
            } else {
                bail!("{} is missing or not a JSON array", path.display())
            }
        }
        Commands::Status => print_status(deps).await,
    }
}

async fn sync_once(deps: &AppDeps, direction: Option<DirectionArg>) -> anyhow::Result<()> {
    if let Some(direction) = direction {
        let summary = deps.orchestrator.run_remote(direction.into()).await?;
        print_summary(&summary);
        return Ok(());
    }

    match deps.controller.manual_sync("command line").await {
        AttemptOutcome::Completed(summary) => {
            print_summary(&summary);
            Ok(())
        }
        AttemptOutcome::Failed(message) => bail!("sync failed: {message}"),
        AttemptOutcome::Skipped(reason) => bail!("sync skipped: {reason}"),
        AttemptOutcome::AlreadySyncing => bail!("a sync is already in progress"),
    }
}

async fn run_daemon(deps: &AppDeps) -> anyhow::Result<()> {
    let mut events = deps.controller.subscribe();

    if !deps.controller.start().await {
        warn!("auto-sync did not start; check the sync configuration");
        return Ok(());
    }
    info!(device_id = %deps.device_id, "auto-sync running, press Ctrl-C to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            signal = &mut shutdown => {
                if let Err(err) = signal {
                    error!(error = %err, "failed to listen for Ctrl-C");
                }
                break Ok(());
            }
            event = events.recv() => match event {
                Ok(event) => {
                    log_event(&event);
                    if event.kind == SyncStatusKind::Halted {
                        break Err(anyhow::anyhow!("auto-sync halted: {}", event.message));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status listener fell behind");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    deps.controller.stop().await;
    deps.orchestrator.shutdown();
    info!("auto-sync stopped");
    result
}

fn log_event(event: &SyncStatusEvent) {
    match event.kind {
        SyncStatusKind::SyncFailed | SyncStatusKind::Halted => {
            error!(kind = ?event.kind, "{}", event.message)
        }
        SyncStatusKind::Skipped => warn!(kind = ?event.kind, "{}", event.message),
        _ => info!(kind = ?event.kind, syncing = event.is_syncing, "{}", event.message),
    }
}

async fn print_status(deps: &AppDeps) -> anyhow::Result<()> {
    let items = deps
        .store
        .count()
        .await
        .context("Failed to count clipboard history")?;
    let current = deps
        .config_store
        .get_current()
        .await
        .context("Failed to read the sync configuration")?;

    println!("device:   {}", deps.device_id);
    println!("history:  {items} items");

    let Some(config) = current else {
        println!("sync:     not configured");
        return Ok(());
    };

    println!(
        "sync:     {} ({})",
        config.sync_type(),
        if config.is_enabled { "enabled" } else { "disabled" }
    );
    match &config.settings {
        SyncSettings::LocalFile(local) => match local.snapshot_path() {
            Some(path) => println!("target:   {}", path.display()),
            None => println!("target:   <no folder configured>"),
        },
        SyncSettings::Server(server) => {
            println!("target:   {} ({:?})", server.server_url, server.sync_direction)
        }
        SyncSettings::Unsupported { .. } => println!("target:   <unsupported type>"),
    }
    match config.last_sync_time {
        Some(at) => println!("last:     {}", at.to_rfc3339()),
        None => println!("last:     never"),
    }
    Ok(())
}

fn print_summary(summary: &SyncSummary) {
    println!(
        "{:?} {}: {} records",
        summary.operation, summary.target, summary.record_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_direction_override() {
        let cli = Cli::try_parse_from(["clipsync", "sync", "--direction", "pull"]).unwrap();

        match cli.command {
            Commands::Sync { direction } => {
                assert_eq!(direction, Some(DirectionArg::Pull));
                assert_eq!(
                    SyncDirection::from(DirectionArg::Pull),
                    SyncDirection::PullOnly
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_flag_follows_subcommand() {
        let cli =
            Cli::try_parse_from(["clipsync", "export", "out.json", "--config", "/etc/cs.toml"])
                .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/cs.toml")));
        assert!(matches!(cli.command, Commands::Export { ref path } if path == &PathBuf::from("out.json")));
    }
}
