//! Watch command handler
//!
//! Runs the mirror poller until Ctrl-C.

use anyhow::Result;
use colored::*;
use mirror_core::domain::repo::RepoLocation;
use mirror_sync::RepoSyncGuard;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, WatchConfig};
use crate::scheduler::MirrorPoller;
use crate::scheduler::poller::PollStats;

/// Handle the watch command
pub async fn handle_watch(
    guard: RepoSyncGuard,
    location: RepoLocation,
    interval_secs: u64,
    config: &Config,
) -> Result<()> {
    let watch_config =
        WatchConfig::new(location).with_interval(Duration::from_secs(interval_secs));
    watch_config.validate()?;

    info!(
        "Watching {} ({}) into {}",
        watch_config.location.remote,
        watch_config.location.branch,
        watch_config.location.local_path.display()
    );

    let poller = MirrorPoller::new(watch_config, Arc::new(guard));
    let stats = poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    println!("{}", stop_summary(&stats, config.json)?);

    Ok(())
}

/// Summary printed when the watch loop stops
fn stop_summary(stats: &PollStats, json: bool) -> Result<String> {
    if json {
        let summary = serde_json::json!({
            "cycles": stats.cycles(),
            "succeeded": stats.succeeded,
            "failed": stats.failed,
        });
        return Ok(serde_json::to_string(&summary)?);
    }

    Ok(format!(
        "{} {} cycle(s): {} succeeded, {} failed",
        "Stopped after".bold(),
        stats.cycles(),
        stats.succeeded.to_string().green(),
        stats.failed.to_string().red()
    ))
}
