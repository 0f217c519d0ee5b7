//! Resize Synchronizer
//!
//! Keeps the remote terminal geometry in step with the widget's container
//! without sending a frame for every layout change:
//! - container resize → restart the debounce window
//! - window elapsed → fit, then send the new geometry if connected
//! - session open → one-shot delayed fit after the panel's opening transition

use std::time::{Duration, Instant};

use tracing::debug;

use super::timer::{earliest, TimerSlot};
use crate::frame::{ControlFrame, ResizeFrame};
use crate::relay::{Connection, Transport};
use crate::widget::TerminalWidget;

/// Debounce applied to container resize notifications
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Matches the panel's open/slide-in transition
pub const DEFAULT_INITIAL_FIT_DELAY: Duration = Duration::from_millis(350);

/// Timers that elapsed during a poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeDue {
    pub initial_fit: bool,
    pub debounce: bool,
}

/// Owns the initial-fit and debounce timers
#[derive(Debug)]
pub struct ResizeSync {
    debounce_window: Duration,
    initial_fit_delay: Duration,
    initial_fit: TimerSlot,
    debounce: TimerSlot,
}

impl ResizeSync {
    pub fn new(debounce_window: Duration, initial_fit_delay: Duration) -> Self {
        Self {
            debounce_window,
            initial_fit_delay,
            initial_fit: TimerSlot::new(),
            debounce: TimerSlot::new(),
        }
    }

    pub fn arm_initial_fit(&mut self, now: Instant) {
        self.initial_fit.schedule(now, self.initial_fit_delay);
    }

    /// Restart the debounce window; only the latest notification fires.
    pub fn container_resized(&mut self, now: Instant) {
        if self.debounce.schedule(now, self.debounce_window) {
            debug!("Resize debounce restarted");
        }
    }

    pub fn poll(&mut self, now: Instant) -> ResizeDue {
        ResizeDue {
            initial_fit: self.initial_fit.take_due(now),
            debounce: self.debounce.take_due(now),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.initial_fit.deadline(), self.debounce.deadline()])
    }

    pub fn has_pending(&self) -> bool {
        self.initial_fit.is_pending() || self.debounce.is_pending()
    }

    /// Cancel both timers. Returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        usize::from(self.initial_fit.cancel()) + usize::from(self.debounce.cancel())
    }
}

/// Fit the widget to its container, then send the resulting geometry if the
/// connection is open. Returns the frame that was sent.
pub fn fit_and_sync<W, T>(widget: &mut W, connection: &mut Connection<T>) -> Option<ResizeFrame>
where
    W: TerminalWidget + ?Sized,
    T: Transport,
{
    widget.fit();
    let frame = ResizeFrame::from(widget.size());

    if !connection.send_frame(&ControlFrame::Resize(frame)) {
        debug!(cols = frame.cols, rows = frame.rows, "Fitted locally, relay not connected");
        return None;
    }
    debug!(connection_id = %connection.id(), cols = frame.cols, rows = frame.rows, "Sent resize frame");
    Some(frame)
}
