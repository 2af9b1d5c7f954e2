//! Sync domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How a failing `reset --hard` before a pull is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// Log the failure and pull anyway
    #[default]
    BestEffort,
    /// Abort the sequence; the pull is not attempted
    Strict,
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetPolicy::BestEffort => write!(f, "best-effort"),
            ResetPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for ResetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(ResetPolicy::BestEffort),
            "strict" => Ok(ResetPolicy::Strict),
            other => Err(format!(
                "unknown reset policy '{}' (expected 'best-effort' or 'strict')",
                other
            )),
        }
    }
}

/// Which branch of the sync sequence ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Cloned,
    Pulled,
}

/// Outcome of a successful clone or pull
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub action: SyncAction,
    pub local_path: PathBuf,
    pub branch: String,
    /// Whether the hard reset succeeded; `None` for clones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_succeeded: Option<bool>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl SyncReport {
    pub fn cloned(local_path: PathBuf, branch: String) -> Self {
        Self {
            action: SyncAction::Cloned,
            local_path,
            branch,
            reset_succeeded: None,
            completed_at: chrono::Utc::now(),
        }
    }

    pub fn pulled(local_path: PathBuf, branch: String, reset_succeeded: bool) -> Self {
        Self {
            action: SyncAction::Pulled,
            local_path,
            branch,
            reset_succeeded: Some(reset_succeeded),
            completed_at: chrono::Utc::now(),
        }
    }
}
