//! CLI command handlers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use roomsync_core::GroupRoomMapping;
use roomsync_directory::WebexClient;
use roomsync_reconciler::{Reconciler, ReconcilerBuilder};
use tokio::signal;
use tracing::{error, info};

use crate::cli::{Commands, OutputFormat};
use crate::config::{AppConfig, SyncSettings};
use crate::report;

/// Execute a CLI command.
pub async fn execute_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Sync(args) => {
            let settings = AppConfig::load(config_path)?.resolve(args)?;
            cmd_sync(settings).await
        }
    }
}

async fn cmd_sync(settings: SyncSettings) -> Result<()> {
    let client = WebexClient::new(settings.directory.clone(), settings.token.clone())
        .context("Failed to create directory client")?;
    let reconciler = ReconcilerBuilder::new()
        .with_directory(Arc::new(client))
        .with_config(settings.reconciler.clone())
        .build()?;

    let Some(interval) = settings.interval else {
        return sync_once(&reconciler, &settings).await;
    };

    info!(interval_secs = interval.as_secs(), "Syncing periodically, press Ctrl+C to stop");
    run_periodically(interval, signal::ctrl_c(), || sync_once(&reconciler, &settings)).await;
    Ok(())
}

/// Run `job` on every tick of `interval` until `shutdown` resolves.
///
/// `shutdown` is created once and polled before each tick, so the Ctrl+C
/// handler is installed before the first run and a signal received during a
/// run stops the loop once that run finishes.
async fn run_periodically<S, F, Fut>(interval: Duration, shutdown: S, mut job: F)
where
    S: Future<Output = std::io::Result<()>>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            result = &mut shutdown => {
                match result {
                    Ok(()) => info!("Received Ctrl+C, stopping"),
                    Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
                }
                return;
            }
            _ = ticker.tick() => {
                // A failed run is reported and retried on the next tick.
                if let Err(e) = job().await {
                    error!(error = ?e, "Sync run failed");
                }
            }
        }
    }
}

/// Load the mapping and run (or plan) one reconciliation.
///
/// The mapping is re-read on every run so edits apply without a restart.
async fn sync_once(reconciler: &Reconciler, settings: &SyncSettings) -> Result<()> {
    let mapping = GroupRoomMapping::from_csv_path(&settings.mapping)
        .with_context(|| format!("Failed to load mapping {}", settings.mapping.display()))?;

    let output = if settings.dry_run {
        let plan = reconciler.plan_only(&mapping).await.context("Dry run failed")?;
        match settings.format {
            OutputFormat::Text => report::render_plan_text(&plan),
            OutputFormat::Json => report::render_json(&plan)?,
        }
    } else {
        let change_report = reconciler.run(&mapping).await.context("Sync failed")?;
        match settings.format {
            OutputFormat::Text => report::render_text(&change_report),
            OutputFormat::Json => report::render_json(&change_report)?,
        }
    };

    println!("{output}");
    Ok(())
}
