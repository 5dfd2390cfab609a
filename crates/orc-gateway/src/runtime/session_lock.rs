//! Per-session concurrency control (spec §4.5, §9 Open Question 1).
//!
//! A turn already in flight for a session holds that session's lock for
//! its whole duration. A message that arrives while the lock is held is
//! rejected outright rather than queued — the caller sees `SessionBusy`
//! immediately (HTTP 409, or a WS `status: busy` frame) instead of waiting
//! behind an unbounded queue.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Maps a session id to a `Semaphore(1)` guarding exclusive turn execution.
pub struct SessionLockMap {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Default for SessionLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self { locks: Mutex::new(HashMap::new()) }
    }

    /// Try to acquire the run lock for a session. Never waits: returns
    /// `Err(SessionBusy)` immediately if a turn is already running.
    pub fn try_acquire(&self, session_id: &str) -> Result<OwnedSemaphorePermit, SessionBusy> {
        let sem = {
            let mut locks = self.locks.lock();
            locks.entry(session_id.to_owned()).or_insert_with(|| Arc::new(Semaphore::new(1))).clone()
        };
        sem.try_acquire_owned().map_err(|_| SessionBusy)
    }

    /// Number of tracked sessions (for monitoring).
    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Remove locks for sessions that aren't actively held.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, sem| sem.available_permits() == 0);
    }
}

/// A turn is already in progress for this session.
#[derive(Debug)]
pub struct SessionBusy;

impl std::fmt::Display for SessionBusy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session is busy — a turn is already in progress")
    }
}

impl std::error::Error for SessionBusy {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_access_after_drop() {
        let map = SessionLockMap::new();
        let permit1 = map.try_acquire("s1").unwrap();
        drop(permit1);
        let _permit2 = map.try_acquire("s1").unwrap();
    }

    #[test]
    fn different_sessions_concurrent() {
        let map = SessionLockMap::new();
        let p1 = map.try_acquire("s1").unwrap();
        let p2 = map.try_acquire("s2").unwrap();
        assert_eq!(map.session_count(), 2);
        drop(p1);
        drop(p2);
    }

    #[test]
    fn same_session_second_arrival_is_rejected() {
        let map = SessionLockMap::new();
        let _permit1 = map.try_acquire("s1").unwrap();
        let err = map.try_acquire("s1").unwrap_err();
        assert!(matches!(err, SessionBusy));
    }

    #[test]
    fn prune_idle_keeps_held_locks() {
        let map = SessionLockMap::new();
        let held = map.try_acquire("s1").unwrap();
        let released = map.try_acquire("s2").unwrap();
        drop(released);
        map.prune_idle();
        assert_eq!(map.session_count(), 1);
        drop(held);
    }
}
