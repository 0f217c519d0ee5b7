//! Host-driven timer slots
//!
//! The core never sleeps. Each delayed action owns one slot holding at most
//! one deadline; the host polls with the current time and asks for the next
//! deadline to sleep until.

use std::time::{Duration, Instant};

/// One cancellable deadline. Rescheduling replaces the previous deadline.
#[derive(Debug, Default, Clone)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `delay` from `now`, cancelling any pending deadline.
    /// Returns true if a pending deadline was replaced.
    pub fn schedule(&mut self, now: Instant, delay: Duration) -> bool {
        self.deadline.replace(now + delay).is_some()
    }

    /// Returns true if something was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has elapsed. A slot fires at most once per
    /// schedule.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of several optional deadlines
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}
