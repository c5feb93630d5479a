//! One-shot refresh timer.
//!
//! The scheduler arms at most one timer at a time.  It never repeats on its
//! own: the controller re-arms it after each automatic fetch completes, so a
//! changed refresh interval is picked up on the very next cycle.
//!
//! ## For contributors
//!
//! Timers are tokio tasks that sleep and then call `on_fire`.  Cancelling
//! aborts the task.  A fire can still race a cancellation (the callback may
//! already have queued its event), which is why every timer carries a
//! [`TimerId`] and the controller checks it with [`PollScheduler::take_fired`].

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct PendingRefresh {
    id: TimerId,
    handle: JoinHandle<()>,
}

/// Owns the single pending refresh timer of a session.
#[derive(Default)]
pub struct PollScheduler {
    pending: Option<PendingRefresh>,
    next_id: u64,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the pending timer, if any.  Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(timer = pending.id.0, "cancelling scheduled refresh");
            pending.handle.abort();
        }
    }

    /// Arm a one-shot timer that calls `on_fire` after `interval`.
    ///
    /// Manual refreshes never re-arm and leave the current state alone.  A
    /// zero interval only cancels.  Any previously armed timer is cancelled
    /// first, so two polling loops can never overlap.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_if_needed<F>(&mut self, interval: Duration, manual: bool, on_fire: F) -> Option<TimerId>
    where
        F: FnOnce(TimerId) + Send + 'static,
    {
        if manual {
            return None;
        }
        self.cancel();
        if interval.is_zero() {
            return None;
        }

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            on_fire(id);
        });
        debug!(timer = id.0, ?interval, "scheduled refresh");
        self.pending = Some(PendingRefresh { id, handle });
        Some(id)
    }

    /// Accept a fire of `id`.
    ///
    /// Returns `true` and clears the pending slot only if `id` is the timer
    /// currently armed; fires of cancelled or replaced timers return `false`.
    pub fn take_fired(&mut self, id: TimerId) -> bool {
        match &self.pending {
            Some(pending) if pending.id == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn pending_id(&self) -> Option<TimerId> {
        self.pending.as_ref().map(|p| p.id)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
