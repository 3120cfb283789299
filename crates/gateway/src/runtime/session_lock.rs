//! Per-session concurrency control.
//!
//! Only one turn runs per session at a time. A second message for the same
//! session waits until the first turn has appended its reply, so the two
//! exchanges never interleave in the history. Different sessions run
//! concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Manages per-session run locks.
///
/// Each session key maps to an async mutex. Hold the returned guard for the
/// whole turn; it releases on drop.
#[derive(Default)]
pub struct SessionLockMap {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a session.
    pub async fn acquire(&self, session_key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(session_key.to_owned())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of tracked sessions (for monitoring).
    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Remove locks nobody currently holds or waits on.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
