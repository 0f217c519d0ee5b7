//! Duplex transport collaborator

/// Identifies one socket attempt within a session.
///
/// Events carrying an id other than the session's current one are stale and
/// dropped, which is how a superseded socket's late callbacks are unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Signals delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Open,
    /// Inbound text payload
    Text(String),
    /// Inbound binary payload
    Binary(Vec<u8>),
    /// Clean close by the relay or the network layer
    Closed { reason: Option<String> },
    /// Abnormal transport failure
    Error(String),
}

impl TransportEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportEvent::Open => "open",
            TransportEvent::Text(_) => "text",
            TransportEvent::Binary(_) => "binary",
            TransportEvent::Closed { .. } => "closed",
            TransportEvent::Error(_) => "error",
        }
    }
}

/// Outbound half of one duplex socket.
///
/// Sends are fire-and-forget: failures come back as [`TransportEvent::Error`].
pub trait Transport {
    /// Send keystroke/input text verbatim
    fn send_text(&mut self, text: &str);

    /// Send a binary control frame
    fn send_binary(&mut self, data: &[u8]);

    /// Close the socket, whether still connecting, open or already dropped
    fn close(&mut self);
}
