//! Mirror Sync
//!
//! Keeps local read-only mirrors of remote git branches up to date.
//!
//! All clone and pull sequences go through a [`RepoSyncGuard`], which holds a
//! shared [`SyncLock`] for the whole check-and-act sequence. Git is launched
//! through the [`CommandRunner`] capability so hosts and tests can decide how
//! commands actually run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mirror_core::domain::repo::RepoLocation;
//! use mirror_sync::{RepoSyncGuard, SyncLock, TokioCommandRunner};
//!
//! #[tokio::main]
//! async fn main() -> mirror_sync::Result<()> {
//!     let guard = RepoSyncGuard::new(Arc::new(TokioCommandRunner::new()), SyncLock::shared());
//!
//!     let location = RepoLocation::new("https://example.test/r.git", "main", "/srv/mirrors/r");
//!     let report = guard.ensure_cloned(&location).await?;
//!
//!     println!("{:?} {}", report.action, report.local_path.display());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod git;
mod guard;
mod lock;
mod runner;

// Re-export commonly used types
pub use error::{Result, SyncError};
pub use git::{DEFAULT_GIT_PROGRAM, GitCommands};
pub use guard::RepoSyncGuard;
pub use lock::{SyncLock, SyncPermit};
pub use runner::{CommandRunner, TokioCommandRunner};
