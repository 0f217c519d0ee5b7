//! Relay Connection - one socket attempt bridged to the terminal widget
//!
//! - Inbound text/bytes go to the widget untouched while the socket is live
//! - Input goes to the socket only while connected, otherwise it is dropped
//! - Close and error collapse into `Disconnected`; nothing is retried here

use tracing::{debug, info, warn};

use super::state::{ConnectionState, Trigger};
use super::transport::{ConnectionId, Transport, TransportEvent};
use crate::frame::ControlFrame;
use crate::widget::TerminalWidget;

/// A state transition that was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

impl StateChange {
    /// The handshake just completed
    pub fn is_established(&self) -> bool {
        self.from == ConnectionState::Connecting && self.to == ConnectionState::Connected
    }
}

/// One socket attempt
pub struct Connection<T: Transport> {
    id: ConnectionId,
    state: ConnectionState,
    transport: Option<T>,
    input_attached: bool,
}

impl<T: Transport> Connection<T> {
    /// A connection that has not been started
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            state: ConnectionState::Disconnected,
            transport: None,
            input_attached: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_input_attached(&self) -> bool {
        self.input_attached
    }

    /// Whether a transport handle is still held
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Disconnected → Connecting. `open` creates the socket; it is only called
    /// when the transition is valid.
    pub fn connect(&mut self, open: impl FnOnce(ConnectionId) -> T) -> Option<StateChange> {
        let Some(next) = self.state.next(Trigger::Connect) else {
            debug!(connection_id = %self.id, state = %self.state, "Ignoring connect on started connection");
            return None;
        };

        self.transport = Some(open(self.id));
        self.input_attached = true;
        Some(self.apply(next))
    }

    /// Route one transport event. Returns the transition it caused, if any.
    pub fn handle_event<W: TerminalWidget + ?Sized>(
        &mut self,
        event: TransportEvent,
        widget: &mut W,
    ) -> Option<StateChange> {
        match event {
            TransportEvent::Open => self.fire(Trigger::TransportOpen),
            TransportEvent::Text(text) => {
                if self.state.is_live() {
                    widget.write_text(&text);
                } else {
                    debug!(connection_id = %self.id, len = text.len(), "Dropping output on closed connection");
                }
                None
            }
            TransportEvent::Binary(data) => {
                if self.state.is_live() {
                    widget.write_bytes(&data);
                } else {
                    debug!(connection_id = %self.id, len = data.len(), "Dropping output on closed connection");
                }
                None
            }
            TransportEvent::Closed { reason } => {
                info!(connection_id = %self.id, reason = reason.as_deref().unwrap_or(""), "Relay connection closed");
                self.fire(Trigger::TransportClosed)
            }
            TransportEvent::Error(error) => {
                warn!(connection_id = %self.id, %error, "Relay connection error");
                self.fire(Trigger::TransportError)
            }
        }
    }

    /// Forward keystroke input. Dropped unless connected.
    pub fn send_input(&mut self, data: &str) -> bool {
        if !self.input_attached || self.state != ConnectionState::Connected {
            debug!(connection_id = %self.id, state = %self.state, len = data.len(), "Dropping input");
            return false;
        }
        match self.transport.as_mut() {
            Some(transport) => {
                transport.send_text(data);
                true
            }
            None => false,
        }
    }

    /// Send a control frame. Dropped unless connected.
    pub fn send_frame(&mut self, frame: &ControlFrame) -> bool {
        if self.state != ConnectionState::Connected {
            return false;
        }
        match self.transport.as_mut() {
            Some(transport) => {
                transport.send_binary(&frame.encode());
                true
            }
            None => false,
        }
    }

    /// Give up on a handshake that is still pending. The socket is closed and
    /// the connection ends up `Disconnected` as if the transport had errored.
    pub fn abort_connecting(&mut self) -> Option<StateChange> {
        if self.state != ConnectionState::Connecting {
            return None;
        }
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.input_attached = false;
        warn!(connection_id = %self.id, "Relay handshake timed out");
        self.fire(Trigger::TransportError)
    }

    /// Release everything whatever the current state: detach input forwarding,
    /// close the held socket handle (even after a drop) and release it.
    /// Idempotent; the handle is closed at most once.
    pub fn teardown(&mut self) -> Option<StateChange> {
        self.input_attached = false;

        let Some(mut transport) = self.transport.take() else {
            return None;
        };
        transport.close();
        debug!(connection_id = %self.id, state = %self.state, "Connection torn down");

        if self.state == ConnectionState::Disconnected {
            return None;
        }
        Some(self.apply(ConnectionState::Disconnected))
    }

    fn fire(&mut self, trigger: Trigger) -> Option<StateChange> {
        match self.state.next(trigger) {
            Some(next) => Some(self.apply(next)),
            None => {
                debug!(connection_id = %self.id, state = %self.state, ?trigger, "Ignoring invalid transition");
                None
            }
        }
    }

    fn apply(&mut self, next: ConnectionState) -> StateChange {
        let change = StateChange {
            from: self.state,
            to: next,
        };
        self.state = next;
        debug!(connection_id = %self.id, from = %change.from, to = %change.to, "Connection state changed");
        change
    }
}
