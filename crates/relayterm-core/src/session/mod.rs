//! Session module - terminal panel lifecycle
//!
//! # Components
//! - `Session`: owns widget, observer, connection and timers for one open panel
//! - `ResizeSync`: debounced geometry sync plus the one-shot initial fit
//! - `TerminalPanel`: guarantees at most one session per open panel
//! - `TimerSlot`: host-driven cancellable deadline

mod lifecycle;
mod panel;
mod resize;
mod timer;

pub use lifecycle::{Session, SessionConfig, SessionHost, SessionStatus};
pub use panel::TerminalPanel;
pub use resize::{fit_and_sync, ResizeDue, ResizeSync, DEFAULT_INITIAL_FIT_DELAY, DEFAULT_RESIZE_DEBOUNCE};
pub use timer::TimerSlot;
