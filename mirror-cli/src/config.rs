//! Configuration module
//!
//! Settings shared by every command (git program, reset policy, output
//! format) and the settings of the `watch` loop.

use anyhow::Result;
use mirror_core::domain::repo::RepoLocation;
use mirror_core::domain::sync::ResetPolicy;
use mirror_sync::{CommandRunner, DEFAULT_GIT_PROGRAM, RepoSyncGuard, SyncLock};
use std::sync::Arc;
use std::time::Duration;

/// Default time between two refreshes in watch mode
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Git executable
    pub git_program: String,

    /// Handling of a failed reset before a pull
    pub reset_policy: ResetPolicy,

    /// Print reports as JSON instead of text
    pub json: bool,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.git_program.trim().is_empty() {
            anyhow::bail!("git program cannot be empty");
        }

        Ok(())
    }

    /// Builds a sync guard from these settings
    ///
    /// Guards that must exclude each other have to be given the same `lock`.
    pub fn build_guard(
        &self,
        runner: Arc<dyn CommandRunner>,
        lock: Arc<SyncLock>,
    ) -> RepoSyncGuard {
        RepoSyncGuard::new(runner, lock)
            .with_git_program(self.git_program.clone())
            .with_reset_policy(self.reset_policy)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_program: DEFAULT_GIT_PROGRAM.to_string(),
            reset_policy: ResetPolicy::default(),
            json: false,
        }
    }
}

/// Watch mode configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Mirror to keep fresh
    pub location: RepoLocation,

    /// Time between two refreshes
    pub refresh_interval: Duration,
}

impl WatchConfig {
    /// Creates a watch configuration with the default interval
    pub fn new(location: RepoLocation) -> Self {
        Self {
            location,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        validate_location(&self.location)?;

        if self.refresh_interval.is_zero() {
            anyhow::bail!("refresh interval must be greater than 0");
        }

        Ok(())
    }
}

/// Validates a mirror location before any git command is built from it
pub fn validate_location(location: &RepoLocation) -> Result<()> {
    if location.remote.trim().is_empty() {
        anyhow::bail!("remote URL cannot be empty");
    }

    if location.remote.starts_with('-') {
        anyhow::bail!("remote URL cannot start with '-': {}", location.remote);
    }

    validate_branch(&location.branch)?;

    if location.local_path.as_os_str().is_empty() {
        anyhow::bail!("local path cannot be empty");
    }

    Ok(())
}

/// Validates a branch name passed to git
///
/// A leading `-` would be read by git as an option.
pub fn validate_branch(branch: &str) -> Result<()> {
    if branch.trim().is_empty() {
        anyhow::bail!("branch cannot be empty");
    }

    if branch.starts_with('-') {
        anyhow::bail!("branch cannot start with '-': {}", branch);
    }

    Ok(())
}
