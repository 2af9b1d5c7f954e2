//! Repository location types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a mirror comes from and where it lives locally
///
/// Immutable for the duration of a sync call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoLocation {
    pub remote: String,
    pub branch: String,
    pub local_path: PathBuf,
}

impl RepoLocation {
    pub fn new(
        remote: impl Into<String>,
        branch: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            remote: remote.into(),
            branch: branch.into(),
            local_path: local_path.into(),
        }
    }

    /// Path of the repository metadata directory inside the checkout
    pub fn git_dir(&self) -> PathBuf {
        self.local_path.join(".git")
    }
}
