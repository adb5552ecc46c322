//! Single-flight session registry and cooperative cancellation.
//!
//! At most one backfill session runs at a time. The registry is that
//! invariant: `begin` claims the slot or fails with the incumbent's id, and
//! the guard it returns releases the slot when dropped, so a session exiting
//! through an error path never wedges the scheduler. Stopping is cooperative
//! and addressed by handle, so a caller can only stop the session it
//! started, and a stale stop is a visible no-op rather than a misfire.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::{BackfillError, Error, Result};

/// Caller-facing identifier of a session, required by `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    id: Uuid,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Observer half of a session's stop signal. Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Whether the session has been asked to stop.
    ///
    /// A closed channel (the session already deregistered) also reads as
    /// cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Sleeps for `duration` unless the stop signal arrives first.
    ///
    /// Returns `false` when the sleep was cut short.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                changed = self.receiver.changed() => {
                    if changed.is_err() || *self.receiver.borrow() {
                        return false;
                    }
                }
            }
        }
    }
}

struct ActiveSession {
    id: Uuid,
    stop: watch::Sender<bool>,
}

/// Exclusive claim on the one-session slot, held by the running crawl task.
///
/// Dropping the guard releases the slot.
pub struct SessionGuard {
    id: Uuid,
    registry: SessionRegistry,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle { id: self.id }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.clear(self.id);
    }
}

/// Registry enforcing the one-active-session invariant.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    slot: Arc<Mutex<Option<ActiveSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        // The slot is plain data; a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claims the slot for a new session.
    ///
    /// # Errors
    ///
    /// [`BackfillError::AlreadyRunning`] carrying the incumbent session's id.
    pub fn begin(&self) -> Result<(SessionGuard, CancelToken)> {
        let mut slot = self.lock();
        if let Some(active) = slot.as_ref() {
            return Err(Error::Backfill(BackfillError::AlreadyRunning {
                session_id: active.id,
            }));
        }

        let (stop, receiver) = watch::channel(false);
        let id = Uuid::new_v4();
        *slot = Some(ActiveSession { id, stop });
        drop(slot);

        Ok((
            SessionGuard {
                id,
                registry: self.clone(),
            },
            CancelToken { receiver },
        ))
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.lock().as_ref().map(|active| active.id)
    }

    /// Signals the identified session to stop.
    ///
    /// Returns `false` when that session is no longer the active one;
    /// repeating a stop is harmless.
    pub fn request_stop(&self, handle: &SessionHandle) -> bool {
        match self.lock().as_ref() {
            Some(active) if active.id == handle.id() => {
                active.stop.send_replace(true);
                true
            }
            _ => false,
        }
    }

    fn clear(&self, id: Uuid) {
        let mut slot = self.lock();
        if slot.as_ref().map(|active| active.id) == Some(id) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_rejected_with_incumbent_id() {
        let registry = SessionRegistry::new();
        let (guard, _token) = registry.begin().unwrap();
        assert!(registry.is_running());
        assert_eq!(registry.active_id(), Some(guard.id()));

        match registry.begin() {
            Err(Error::Backfill(BackfillError::AlreadyRunning { session_id })) => {
                assert_eq!(session_id, guard.id());
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("second begin must be rejected"),
        }
    }

    #[test]
    fn test_dropping_the_guard_releases_the_slot() {
        let registry = SessionRegistry::new();
        let (guard, token) = registry.begin().unwrap();
        assert!(!token.is_cancelled());

        drop(guard);
        assert!(!registry.is_running());
        assert_eq!(registry.active_id(), None);
        // The stop channel died with the slot.
        assert!(token.is_cancelled());
        assert!(registry.begin().is_ok());
    }

    #[test]
    fn test_stop_by_handle_flips_the_token() {
        let registry = SessionRegistry::new();
        let (guard, token) = registry.begin().unwrap();
        let handle = guard.handle();

        assert!(registry.request_stop(&handle));
        assert!(token.is_cancelled());
        // Still registered until the crawl task actually exits.
        assert!(registry.is_running());
        // Stopping twice is a no-op that still reports success.
        assert!(registry.request_stop(&handle));
    }

    #[test]
    fn test_stale_handle_stop_reports_false() {
        let registry = SessionRegistry::new();
        let stale = {
            let (guard, _token) = registry.begin().unwrap();
            guard.handle()
        };
        assert!(!registry.request_stop(&stale));

        // A later session is unaffected by the stale handle.
        let (_guard, token) = registry.begin().unwrap();
        assert!(!registry.request_stop(&stale));
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_sleep_runs_to_completion() {
        let registry = SessionRegistry::new();
        let (_guard, mut token) = registry.begin().unwrap();
        assert!(token.sleep(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_sleep_cut_short_by_stop() {
        let registry = SessionRegistry::new();
        let (guard, mut token) = registry.begin().unwrap();
        registry.request_stop(&guard.handle());

        let started = std::time::Instant::now();
        assert!(!token.sleep(Duration::from_secs(60)).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_sleep_wakes_on_concurrent_stop() {
        let registry = SessionRegistry::new();
        let (guard, mut token) = registry.begin().unwrap();
        let handle = guard.handle();

        let stopper = {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                registry.request_stop(&handle)
            })
        };

        let started = std::time::Instant::now();
        assert!(!token.sleep(Duration::from_secs(60)).await);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(stopper.await.unwrap());
    }
}
