//! Command runner
//!
//! Executes external commands for the sync guard. The trait is the seam
//! used by tests to stand in for git without launching processes.

use async_trait::async_trait;
use mirror_core::domain::command::{CommandOutput, CommandSpec};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SyncError};

/// Capability for running one external command to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command and captures its output
    ///
    /// A non-zero exit is returned as `CommandOutput`, not as an error.
    /// Errors are reserved for commands that could not be launched.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as child processes on the tokio runtime
///
/// Only the calling task is suspended while the child runs.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner {}

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| SyncError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", command.program, stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", command.program, stderr.trim());
        }
        debug!(
            "Command finished: exit_code={}, stdout_len={}, stderr_len={}",
            exit_code,
            stdout.len(),
            stderr.len()
        );

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}
