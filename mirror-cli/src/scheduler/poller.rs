//! Mirror poller
//!
//! Runs `ensure_cloned` on every tick. A failed cycle is logged and the
//! next tick tries again; nothing is retried within a cycle.

use mirror_core::domain::sync::SyncReport;
use mirror_sync::RepoSyncGuard;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::WatchConfig;

/// Outcome counters of a poller run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub succeeded: usize,
    pub failed: usize,
}

impl PollStats {
    pub fn cycles(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Keeps one mirror fresh on a fixed interval
pub struct MirrorPoller {
    config: WatchConfig,
    guard: Arc<RepoSyncGuard>,
}

impl MirrorPoller {
    /// Creates a new poller
    pub fn new(config: WatchConfig, guard: Arc<RepoSyncGuard>) -> Self {
        Self { config, guard }
    }

    /// Starts the polling loop and runs until `shutdown` completes
    ///
    /// The first cycle starts immediately. A cycle in flight when shutdown
    /// is requested runs to completion.
    pub async fn run<F>(&self, shutdown: F) -> PollStats
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting mirror poller (interval: {:?})",
            self.config.refresh_interval
        );

        let mut interval = time::interval(self.config.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut stats = PollStats::default();

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping poller after {} cycle(s)", stats.cycles());
                    return stats;
                }
                _ = interval.tick() => {}
            }

            debug!("Refreshing {}", self.config.location.local_path.display());

            match self.sync_once().await {
                Ok(report) => {
                    stats.succeeded += 1;
                    debug!("Cycle finished with {:?}", report.action);
                }
                Err(e) => {
                    stats.failed += 1;
                    error!("Error during sync cycle: {:#}", e);
                }
            }
        }
    }

    /// Performs a single refresh
    pub async fn sync_once(&self) -> mirror_sync::Result<SyncReport> {
        self.guard.ensure_cloned(&self.config.location).await
    }
}
