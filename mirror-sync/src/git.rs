//! Git command construction
//!
//! Builds the exact command lines the guard issues. Nothing here runs a
//! process; see [`crate::runner`].

use mirror_core::domain::command::CommandSpec;
use std::path::Path;

/// Default git executable
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Builder for the git commands used by the mirror
#[derive(Debug, Clone)]
pub struct GitCommands {
    program: String,
}

impl GitCommands {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `git clone --depth 1 --single-branch --branch <branch> -- <remote> <path>`
    ///
    /// `--` keeps a remote beginning with `-` from being parsed as an option.
    pub fn shallow_clone(&self, remote: &str, branch: &str, local_path: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("clone")
            .args(["--depth", "1"])
            .arg("--single-branch")
            .args(["--branch", branch])
            .arg("--")
            .arg(remote)
            .arg(local_path)
    }

    /// `git -C <path> reset --hard origin/<branch>`
    pub fn hard_reset(&self, local_path: &Path, branch: &str) -> CommandSpec {
        self.in_repo(local_path)
            .args(["reset", "--hard"])
            .arg(tracking_ref(branch))
    }

    /// `git -C <path> pull origin <branch>`
    pub fn pull(&self, local_path: &Path, branch: &str) -> CommandSpec {
        self.in_repo(local_path).args(["pull", "origin", branch])
    }

    fn in_repo(&self, local_path: &Path) -> CommandSpec {
        CommandSpec::new(&self.program).arg("-C").arg(local_path)
    }
}

/// Remote tracking ref a mirror converges to (e.g. `origin/main`)
pub fn tracking_ref(branch: &str) -> String {
    format!("origin/{}", branch)
}

impl Default for GitCommands {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_PROGRAM)
    }
}
