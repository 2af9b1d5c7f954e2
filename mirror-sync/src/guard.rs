//! Repository sync guard
//!
//! Keeps a local read-only mirror of one remote branch present and current.
//! Every clone or pull sequence runs while holding the shared [`SyncLock`],
//! so two callers can never interleave git commands against a checkout.
//!
//! Flow of `ensure_cloned`:
//! 1. Acquire the lock
//! 2. If `<local_path>/.git` exists: hard reset to `origin/<branch>`, then pull
//! 3. Otherwise: create the parent directory and shallow-clone the branch
//! 4. Release the lock

use mirror_core::domain::command::{CommandOutput, CommandSpec};
use mirror_core::domain::repo::RepoLocation;
use mirror_core::domain::sync::{ResetPolicy, SyncReport};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SyncError};
use crate::git::GitCommands;
use crate::lock::SyncLock;
use crate::runner::CommandRunner;

/// Serializes clone/pull operations on local mirrors
pub struct RepoSyncGuard {
    runner: Arc<dyn CommandRunner>,
    lock: Arc<SyncLock>,
    git: GitCommands,
    reset_policy: ResetPolicy,
}

impl RepoSyncGuard {
    /// Creates a guard that runs git through `runner` and orders its work with `lock`
    ///
    /// Guards meant to exclude each other must share the same lock.
    pub fn new(runner: Arc<dyn CommandRunner>, lock: Arc<SyncLock>) -> Self {
        Self {
            runner,
            lock,
            git: GitCommands::default(),
            reset_policy: ResetPolicy::default(),
        }
    }

    /// Sets how a failing hard reset before a pull is handled
    pub fn with_reset_policy(mut self, reset_policy: ResetPolicy) -> Self {
        self.reset_policy = reset_policy;
        self
    }

    /// Uses a different git executable
    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git = GitCommands::new(program);
        self
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }

    pub fn lock(&self) -> &Arc<SyncLock> {
        &self.lock
    }

    /// Ensures `location` holds a checkout of its branch at the remote tip
    ///
    /// The existence check and the resulting clone or pull run under one
    /// lock acquisition.
    ///
    /// # Errors
    /// `CommandFailed` when clone or pull exits non-zero, `Spawn` when git
    /// cannot be launched, `Filesystem` when the checkout cannot be inspected
    /// or its parent directory cannot be created.
    pub async fn ensure_cloned(&self, location: &RepoLocation) -> Result<SyncReport> {
        let _permit = self.lock.acquire().await;

        if has_checkout(location).await? {
            info!(
                "Repository exists at {}, pulling latest changes",
                location.local_path.display()
            );
            self.pull_locked(&location.local_path, &location.branch).await
        } else {
            info!(
                "Cloning repository from {} to {}",
                location.remote,
                location.local_path.display()
            );
            self.clone_locked(location).await
        }
    }

    /// Discards local changes and pulls the latest `branch` into `local_path`
    ///
    /// # Errors
    /// `CommandFailed` when the pull exits non-zero, or when the reset does
    /// and the policy is [`ResetPolicy::Strict`].
    pub async fn pull_latest(&self, local_path: &Path, branch: &str) -> Result<SyncReport> {
        let _permit = self.lock.acquire().await;

        info!("Pulling latest changes for branch {}", branch);
        self.pull_locked(local_path, branch).await
    }

    async fn clone_locked(&self, location: &RepoLocation) -> Result<SyncReport> {
        if let Some(parent) = location.local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| SyncError::filesystem(parent, e))?;
            }
        }

        let command = self.git.shallow_clone(
            &location.remote,
            &location.branch,
            &location.local_path,
        );
        let output = self.run(&command).await?;

        if !output.success() {
            error!("Git clone failed: {}", output.stderr.trim());
            return Err(command_failed(&command, output));
        }

        info!(
            "Repository cloned successfully to {}",
            location.local_path.display()
        );
        Ok(SyncReport::cloned(
            location.local_path.clone(),
            location.branch.clone(),
        ))
    }

    async fn pull_locked(&self, local_path: &Path, branch: &str) -> Result<SyncReport> {
        let reset = self.git.hard_reset(local_path, branch);
        let reset_output = self.run(&reset).await?;

        let reset_succeeded = reset_output.success();
        if !reset_succeeded {
            match self.reset_policy {
                ResetPolicy::BestEffort => {
                    warn!(
                        "Git reset failed (exit code {}), pulling anyway: {}",
                        reset_output.exit_code,
                        reset_output.stderr.trim()
                    );
                }
                ResetPolicy::Strict => {
                    error!("Git reset failed: {}", reset_output.stderr.trim());
                    return Err(command_failed(&reset, reset_output));
                }
            }
        }

        let pull = self.git.pull(local_path, branch);
        let output = self.run(&pull).await?;

        if !output.success() {
            error!("Git pull failed: {}", output.stderr.trim());
            return Err(command_failed(&pull, output));
        }

        info!("Repository updated successfully");
        Ok(SyncReport::pulled(
            local_path.to_path_buf(),
            branch.to_string(),
            reset_succeeded,
        ))
    }

    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running: {}", command);
        self.runner.run(command).await
    }
}

/// Whether the location already contains repository metadata
async fn has_checkout(location: &RepoLocation) -> Result<bool> {
    let git_dir = location.git_dir();
    tokio::fs::try_exists(&git_dir)
        .await
        .map_err(|e| SyncError::filesystem(git_dir, e))
}

fn command_failed(command: &CommandSpec, output: CommandOutput) -> SyncError {
    SyncError::CommandFailed {
        command: command.to_string(),
        exit_code: output.exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mirror_core::domain::sync::SyncAction;
    use std::collections::{HashMap, HashSet};
    use std::ffi::OsString;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    tokio::task_local! {
        /// Id of the guard call a command belongs to
        static OPERATION: usize;
    }

    /// Stands in for git: records every command and answers with scripted exit codes.
    /// A successful clone creates `<path>/.git` like the real thing.
    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<CommandSpec>>,
        events: Mutex<Vec<String>>,
        operations: Mutex<Vec<(usize, String)>>,
        exit_codes: HashMap<&'static str, i32>,
        delay: Duration,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self::default()
        }

        fn failing(mut self, subcommand: &'static str, exit_code: i32) -> Self {
            self.exit_codes.insert(subcommand, exit_code);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn subcommands(&self) -> Vec<String> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .map(|c| subcommand(c).to_string())
                .collect()
        }

        fn commands(&self) -> Vec<CommandSpec> {
            self.commands.lock().unwrap().clone()
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn operations(&self) -> Vec<(usize, String)> {
            self.operations.lock().unwrap().clone()
        }
    }

    fn subcommand(command: &CommandSpec) -> &str {
        command
            .args
            .iter()
            .filter_map(|a| a.to_str())
            .find(|a| matches!(*a, "clone" | "reset" | "pull"))
            .unwrap_or("unknown")
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
            let sub = subcommand(command).to_string();
            let operation = OPERATION.try_with(|id| *id).unwrap_or(usize::MAX);
            self.operations
                .lock()
                .unwrap()
                .push((operation, sub.clone()));
            self.events.lock().unwrap().push(format!("start {}", sub));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.commands.lock().unwrap().push(command.clone());
            let exit_code = self.exit_codes.get(sub.as_str()).copied().unwrap_or(0);

            if exit_code == 0 && sub == "clone" {
                let dest = PathBuf::from(command.args.last().unwrap());
                std::fs::create_dir_all(dest.join(".git")).unwrap();
            }

            self.events.lock().unwrap().push(format!("end {}", sub));

            if exit_code == 0 {
                Ok(CommandOutput::new(0, "", ""))
            } else {
                Ok(CommandOutput::new(exit_code, "", "fatal: simulated failure\n"))
            }
        }
    }

    fn existing_checkout(root: &Path) -> PathBuf {
        let path = root.join("mirror");
        std::fs::create_dir_all(path.join(".git")).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_path_is_cloned() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = tmp.path().join("mirrors").join("r");
        let location = RepoLocation::new("https://example.test/r.git", "main", &local_path);

        let runner = Arc::new(RecordingRunner::new());
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());

        let report = guard.ensure_cloned(&location).await.unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0].args,
            vec![
                OsString::from("clone"),
                "--depth".into(),
                "1".into(),
                "--single-branch".into(),
                "--branch".into(),
                "main".into(),
                "--".into(),
                "https://example.test/r.git".into(),
                local_path.clone().into_os_string(),
            ]
        );
        assert!(tmp.path().join("mirrors").is_dir());
        assert!(local_path.join(".git").exists());
        assert_eq!(report.action, SyncAction::Cloned);
        assert_eq!(report.reset_succeeded, None);
    }

    #[tokio::test]
    async fn test_existing_checkout_is_reset_then_pulled() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = existing_checkout(tmp.path());
        let location = RepoLocation::new("https://example.test/r.git", "main", &local_path);

        let runner = Arc::new(RecordingRunner::new());
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());

        let report = guard.ensure_cloned(&location).await.unwrap();

        let commands = runner.commands();
        assert_eq!(runner.subcommands(), vec!["reset", "pull"]);
        assert_eq!(commands[0].args[2..], ["reset", "--hard", "origin/main"]);
        assert_eq!(commands[1].args[2..], ["pull", "origin", "main"]);
        assert_eq!(report.action, SyncAction::Pulled);
        assert_eq!(report.reset_succeeded, Some(true));
    }

    #[tokio::test]
    async fn test_clone_failure_carries_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let location = RepoLocation::new(
            "https://example.test/missing.git",
            "main",
            tmp.path().join("r"),
        );

        let runner = Arc::new(RecordingRunner::new().failing("clone", 128));
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());

        let err = guard.ensure_cloned(&location).await.unwrap_err();

        assert_eq!(err.exit_code(), Some(128));
        match err {
            SyncError::CommandFailed {
                command, stderr, ..
            } => {
                assert!(command.contains("clone --depth 1 --single-branch --branch main"));
                assert!(stderr.contains("simulated failure"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(runner.subcommands(), vec!["clone"]);
    }

    #[tokio::test]
    async fn test_pull_failure_carries_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = existing_checkout(tmp.path());

        let runner = Arc::new(RecordingRunner::new().failing("pull", 1));
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());

        let err = guard.pull_latest(&local_path, "main").await.unwrap_err();

        assert!(err.is_command_failure());
        assert_eq!(err.exit_code(), Some(1));
        assert!(local_path.join(".git").exists());
    }

    #[tokio::test]
    async fn test_best_effort_reset_failure_still_pulls() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = existing_checkout(tmp.path());

        let runner = Arc::new(RecordingRunner::new().failing("reset", 128));
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());
        assert_eq!(guard.reset_policy(), ResetPolicy::BestEffort);

        let report = guard.pull_latest(&local_path, "main").await.unwrap();

        assert_eq!(runner.subcommands(), vec!["reset", "pull"]);
        assert_eq!(report.reset_succeeded, Some(false));
    }

    #[tokio::test]
    async fn test_strict_reset_failure_aborts_before_pull() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = existing_checkout(tmp.path());

        let runner = Arc::new(RecordingRunner::new().failing("reset", 128));
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared())
            .with_reset_policy(ResetPolicy::Strict);

        let err = guard.pull_latest(&local_path, "main").await.unwrap_err();

        assert_eq!(err.exit_code(), Some(128));
        assert_eq!(runner.subcommands(), vec!["reset"]);
    }

    #[tokio::test]
    async fn test_custom_git_program() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = existing_checkout(tmp.path());

        let runner = Arc::new(RecordingRunner::new());
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared())
            .with_git_program("/opt/git/bin/git");

        guard.pull_latest(&local_path, "main").await.unwrap();

        assert!(
            runner
                .commands()
                .iter()
                .all(|c| c.program == "/opt/git/bin/git")
        );
    }

    #[tokio::test]
    async fn test_uninspectable_path_is_filesystem_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let location =
            RepoLocation::new("https://example.test/r.git", "main", blocker.join("r"));

        let runner = Arc::new(RecordingRunner::new());
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());

        let err = guard.ensure_cloned(&location).await.unwrap_err();

        assert!(matches!(err, SyncError::Filesystem { .. }));
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_option_like_remote_stays_positional() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = tmp.path().join("r");
        let remote = "--upload-pack=touch /tmp/owned; git-upload-pack";
        let location = RepoLocation::new(remote, "main", &local_path);

        let runner = Arc::new(RecordingRunner::new());
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());

        guard.ensure_cloned(&location).await.unwrap();

        let commands = runner.commands();
        let args = &commands[0].args;
        assert_eq!(
            args[args.len() - 3..],
            [
                OsString::from("--"),
                OsString::from(remote),
                local_path.clone().into_os_string(),
            ]
        );
        assert!(
            !args[..args.len() - 3]
                .iter()
                .any(|a| a.to_str() == Some(remote))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_path_reaches_git_unchanged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let local_path = tmp.path().join(OsStr::from_bytes(b"mirror\xff"));
        let location = RepoLocation::new("https://example.test/r.git", "main", &local_path);

        let runner = Arc::new(RecordingRunner::new());
        let guard = RepoSyncGuard::new(runner.clone(), SyncLock::shared());

        guard.ensure_cloned(&location).await.unwrap();
        assert!(local_path.join(".git").exists());

        let report = guard.ensure_cloned(&location).await.unwrap();
        assert_eq!(report.action, SyncAction::Pulled);

        let commands = runner.commands();
        assert_eq!(commands[0].args.last().unwrap(), local_path.as_os_str());
        assert_eq!(commands[1].args[1], local_path.as_os_str());
        assert_eq!(runner.subcommands(), vec!["clone", "reset", "pull"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_syncs_never_interleave() {
        let tmp = tempfile::tempdir().unwrap();
        let local_path = tmp.path().join("r");
        let location = RepoLocation::new("https://example.test/r.git", "main", &local_path);

        let runner = Arc::new(RecordingRunner::new().with_delay(Duration::from_millis(20)));
        let lock = SyncLock::shared();
        let first = Arc::new(RepoSyncGuard::new(runner.clone(), lock.clone()));
        let second = Arc::new(RepoSyncGuard::new(runner.clone(), lock.clone()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let guard = if i % 2 == 0 { first.clone() } else { second.clone() };
            let location = location.clone();
            handles.push(tokio::spawn(OPERATION.scope(i, async move {
                if i == 3 {
                    guard.pull_latest(&location.local_path, &location.branch).await
                } else {
                    guard.ensure_cloned(&location).await
                }
            })));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let events = runner.events();
        for pair in events.chunks(2) {
            let started = pair[0].strip_prefix("start ").unwrap();
            assert_eq!(pair[1], format!("end {}", started), "events: {events:?}");
        }

        // Each call's commands form one contiguous run: once another call's
        // command shows up, the earlier call must never appear again.
        let operations = runner.operations();
        let mut finished = HashSet::new();
        let mut runs: Vec<(usize, Vec<String>)> = Vec::new();
        for (operation, sub) in &operations {
            let continues = runs.last().is_some_and(|(current, _)| current == operation);
            if continues {
                if let Some((_, subs)) = runs.last_mut() {
                    subs.push(sub.clone());
                }
            } else {
                if let Some((previous, _)) = runs.last() {
                    finished.insert(*previous);
                }
                assert!(
                    !finished.contains(operation),
                    "call {operation} split by another call: {operations:?}"
                );
                runs.push((*operation, vec![sub.clone()]));
            }
        }

        assert_eq!(runs.len(), 4, "operations: {operations:?}");
        for (_, subs) in &runs {
            assert!(
                *subs == ["clone"] || *subs == ["reset", "pull"],
                "unexpected sequence {subs:?} in {operations:?}"
            );
        }

        let clones = runs.iter().filter(|(_, subs)| *subs == ["clone"]).count();
        assert_eq!(clones, 1);
    }
}
