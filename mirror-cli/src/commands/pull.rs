//! Pull command handler

use anyhow::{Context, Result};
use mirror_sync::RepoSyncGuard;
use std::path::Path;

use super::print_report;
use crate::config::{Config, validate_branch};

/// Handle the pull command
///
/// The directory must already be a checkout; use `ensure` to create one.
pub async fn handle_pull(
    guard: &RepoSyncGuard,
    path: &Path,
    branch: &str,
    config: &Config,
) -> Result<()> {
    validate_branch(branch)?;

    let is_checkout = tokio::fs::try_exists(path.join(".git"))
        .await
        .with_context(|| format!("Failed to inspect {}", path.display()))?;
    if !is_checkout {
        anyhow::bail!(
            "{} is not a git checkout; run `mirror ensure` first",
            path.display()
        );
    }

    let report = guard
        .pull_latest(path, branch)
        .await
        .with_context(|| format!("Failed to pull {} in {}", branch, path.display()))?;

    print_report(&report, config.json)
}
