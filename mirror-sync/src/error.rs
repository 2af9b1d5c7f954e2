//! Error types for mirror synchronization

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while cloning or pulling a mirror
#[derive(Debug, Error)]
pub enum SyncError {
    /// External command exited with a non-zero status
    #[error("command `{command}` failed (exit code {exit_code}): {}", stderr.trim())]
    CommandFailed {
        /// Rendered command line
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// External command could not be launched
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Local filesystem operation failed
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Create a filesystem error for the given path
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Exit code of the failed command, if this is a command failure
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Check if this error is a non-zero exit of an external command
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }
}
