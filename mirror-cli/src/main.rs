//! Mirror CLI
//!
//! Keeps read-only git mirrors of remote branches up to date.
//!
//! Commands:
//! - `ensure`: clone the mirror if missing, otherwise reset and pull it
//! - `pull`: reset and pull an existing mirror
//! - `watch`: run `ensure` on a fixed interval until interrupted
//!
//! Every command routes git through one shared sync lock, so a mirror is
//! never touched by two git processes at once.

mod commands;
mod config;
mod scheduler;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use mirror_core::domain::sync::ResetPolicy;
use mirror_sync::DEFAULT_GIT_PROGRAM;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mirror")]
#[command(about = "Keep read-only git mirrors up to date", long_about = None)]
struct Cli {
    /// Git executable used for clone, reset and pull
    #[arg(long, global = true, env = "MIRROR_GIT_BIN", default_value = DEFAULT_GIT_PROGRAM)]
    git_bin: String,

    /// Handling of a failed reset before pulling: best-effort or strict
    #[arg(
        long,
        global = true,
        env = "MIRROR_RESET_POLICY",
        default_value = "best-effort"
    )]
    reset_policy: ResetPolicy,

    /// Print sync reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirror=info,mirror_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        git_program: cli.git_bin,
        reset_policy: cli.reset_policy,
        json: cli.json,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
