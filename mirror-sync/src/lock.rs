//! Sync lock
//!
//! One instance is created by the host application and shared by every
//! guard that touches a mirror. Holding it is the only permission to run
//! clone, reset or pull commands.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Process-wide mutual exclusion for repository mutations
///
/// Waiters are served in FIFO order, so sync requests run in the order
/// they asked for the lock.
#[derive(Debug, Default)]
pub struct SyncLock {
    inner: Mutex<()>,
}

/// Proof that the holder currently owns the [`SyncLock`]
pub type SyncPermit<'a> = MutexGuard<'a, ()>;

impl SyncLock {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(()),
        }
    }

    /// Creates a lock ready to be shared between guards
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Suspends the calling task until the lock is free
    pub async fn acquire(&self) -> SyncPermit<'_> {
        trace!("Waiting for sync lock");
        let permit = self.inner.lock().await;
        trace!("Sync lock acquired");
        permit
    }

    /// Takes the lock only if nobody holds it
    pub fn try_acquire(&self) -> Option<SyncPermit<'_>> {
        self.inner.try_lock().ok()
    }

    /// Whether some task currently holds the lock
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
