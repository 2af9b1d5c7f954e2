//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod ensure;
mod pull;
mod watch;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use mirror_core::domain::repo::RepoLocation;
use mirror_core::domain::sync::{SyncAction, SyncReport};
use mirror_sync::{CommandRunner, SyncLock, TokioCommandRunner};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Clone the mirror if it is missing, otherwise reset and pull it
    Ensure {
        #[command(flatten)]
        target: LocationArgs,
    },
    /// Reset an existing mirror to its remote branch and pull
    Pull {
        /// Local checkout directory
        #[arg(long, env = "MIRROR_LOCAL_PATH")]
        path: PathBuf,

        /// Branch to pull
        #[arg(long, env = "MIRROR_BRANCH", default_value = "main")]
        branch: String,
    },
    /// Keep the mirror fresh by running `ensure` on an interval
    Watch {
        #[command(flatten)]
        target: LocationArgs,

        /// Seconds between two refreshes
        #[arg(long, env = "MIRROR_REFRESH_INTERVAL", default_value_t = 300)]
        interval: u64,
    },
}

/// Remote, branch and local path of a mirror
#[derive(Args, Debug, Clone)]
pub struct LocationArgs {
    /// Remote repository URL
    #[arg(long, env = "MIRROR_REMOTE_URL")]
    pub remote: String,

    /// Branch to mirror
    #[arg(long, env = "MIRROR_BRANCH", default_value = "main")]
    pub branch: String,

    /// Local checkout directory
    #[arg(long, env = "MIRROR_LOCAL_PATH")]
    pub path: PathBuf,
}

impl From<LocationArgs> for RepoLocation {
    fn from(args: LocationArgs) -> Self {
        RepoLocation::new(args.remote, args.branch, args.path)
    }
}

/// Handle a CLI command
///
/// Creates the process-wide sync lock and git runner, then routes the
/// command to its handler.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
    let guard = config.build_guard(runner, SyncLock::shared());

    match command {
        Commands::Ensure { target } => ensure::handle_ensure(&guard, target.into(), config).await,
        Commands::Pull { path, branch } => pull::handle_pull(&guard, &path, &branch, config).await,
        Commands::Watch { target, interval } => {
            watch::handle_watch(guard, target.into(), interval, config).await
        }
    }
}

/// Print a sync report as text or JSON
pub fn print_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let action = match report.action {
        SyncAction::Cloned => "Cloned".green().bold(),
        SyncAction::Pulled => "Updated".green().bold(),
    };

    println!(
        "{} {} ({})",
        action,
        report.local_path.display().to_string().bold(),
        report.branch.cyan()
    );

    if report.reset_succeeded == Some(false) {
        println!(
            "  {}",
            "reset to the remote branch failed; local changes may remain".yellow()
        );
    }

    println!(
        "  {}",
        report
            .completed_at
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
            .dimmed()
    );

    Ok(())
}
