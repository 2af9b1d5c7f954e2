//! Ensure command handler
//!
//! Clones a missing mirror or refreshes an existing one.

use anyhow::{Context, Result};
use mirror_core::domain::repo::RepoLocation;
use mirror_sync::RepoSyncGuard;

use super::print_report;
use crate::config::{Config, validate_location};

/// Handle the ensure command
pub async fn handle_ensure(
    guard: &RepoSyncGuard,
    location: RepoLocation,
    config: &Config,
) -> Result<()> {
    validate_location(&location)?;

    let report = guard.ensure_cloned(&location).await.with_context(|| {
        format!(
            "Failed to sync {} into {}",
            location.remote,
            location.local_path.display()
        )
    })?;

    print_report(&report, config.json)
}
