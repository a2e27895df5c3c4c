//! Registry of scheduled one-shot timers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// What a pending timer will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// A [`Command::Tick`](crate::Command::Tick).
    Tick,
    /// A delayed [`Command::Send`](crate::Command::Send).
    DelayedSend,
}

/// A timer that has been scheduled and has not fired yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: u64,
    pub kind: TimerKind,
    /// `None` when the duration is too large to represent as an instant.
    pub deadline: Option<Instant>,
}

/// Shared table of timers awaiting expiry.
///
/// Cloning shares the table.  Entries are added by [`schedule`](Self::schedule)
/// and removed when the returned [`TimerGuard`] drops, which happens when the
/// timer fires or its task is dropped.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    next_id: Arc<AtomicU64>,
    pending: Arc<Mutex<HashMap<u64, PendingTimer>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a timer due `duration` from now.
    pub fn schedule(&self, kind: TimerKind, duration: Duration) -> TimerGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now().checked_add(duration);
        self.lock().insert(id, PendingTimer { id, kind, deadline });
        TimerGuard {
            id,
            deadline,
            registry: self.clone(),
        }
    }

    /// Number of timers that have not fired.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Pending timers ordered by deadline.
    pub fn snapshot(&self) -> Vec<PendingTimer> {
        let mut timers: Vec<_> = self.lock().values().copied().collect();
        timers.sort_by_key(|t| (t.deadline.is_none(), t.deadline, t.id));
        timers
    }

    fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, PendingTimer>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deregisters its timer on drop.
#[derive(Debug)]
pub struct TimerGuard {
    id: u64,
    deadline: Option<Instant>,
    registry: TimerRegistry,
}

impl TimerGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Sleep until the timer's deadline.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
            None => std::future::pending().await,
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_and_drop() {
        let timers = TimerRegistry::new();
        let a = timers.schedule(TimerKind::Tick, Duration::from_secs(5));
        let b = timers.schedule(TimerKind::DelayedSend, Duration::from_secs(1));
        assert_eq!(timers.len(), 2);
        assert_ne!(a.id(), b.id());

        let snapshot = timers.snapshot();
        assert_eq!(snapshot[0].kind, TimerKind::DelayedSend);
        assert_eq!(snapshot[1].kind, TimerKind::Tick);

        drop(b);
        assert_eq!(timers.len(), 1);
        drop(a);
        assert!(timers.is_empty());
    }

    #[test]
    fn huge_duration_does_not_overflow() {
        let timers = TimerRegistry::new();
        let _guard = timers.schedule(TimerKind::Tick, Duration::MAX);
        let _soon = timers.schedule(TimerKind::Tick, Duration::from_secs(1));
        let snapshot = timers.snapshot();
        assert!(snapshot[0].deadline.is_some());
        assert_eq!(snapshot[1].deadline, None);
    }

    #[tokio::test]
    async fn guard_expires_then_deregisters() {
        let timers = TimerRegistry::new();
        let guard = timers.schedule(TimerKind::Tick, Duration::from_millis(10));
        guard.expired().await;
        assert_eq!(timers.len(), 1);
        drop(guard);
        assert_eq!(timers.len(), 0);
    }
}
