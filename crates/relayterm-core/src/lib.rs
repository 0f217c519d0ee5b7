//! relayterm-core - client half of the terminal relay
//!
//! Drives one interactive terminal over a single duplex socket:
//! - `frame`: binary control frames (resize) sent alongside raw input
//! - `relay`: connection state machine and endpoint addressing
//! - `session`: resize sync and the session lifecycle with ordered teardown
//! - `widget`: the terminal widget and size observer collaborators
//!
//! The library does no I/O of its own. A host owns the real socket, terminal
//! and clock, and feeds events in:
//!
//! ```text
//! host                      Session                     relay
//!  │ open ───────────────►  create widget, connect ───► socket
//!  │                        ◄──────────────────────── open
//!  │                        fit + resize frame ──────► [0x01 cols rows]
//!  │ on_input("ls\n") ───►  forward if connected ────► "ls\n"
//!  │ ◄── widget.write ────  inbound text/bytes ◄────── output
//!  │ on_container_resized   debounce → fit → frame ──►
//!  │ close ──────────────►  timers, observer, socket, widget
//! ```

pub mod config;
mod error;
pub mod frame;
pub mod relay;
pub mod session;
pub mod widget;

#[cfg(test)]
mod testing;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use frame::{encode_resize, ControlFrame, FrameError, FrameTag, ResizeFrame};
pub use relay::{ConnectionId, ConnectionState, RelayEndpoint, Transport, TransportEvent};
pub use session::{Session, SessionConfig, SessionHost, SessionStatus, TerminalPanel};
pub use widget::{SizeObserver, TerminalSize, TerminalWidget, WidgetOptions};
