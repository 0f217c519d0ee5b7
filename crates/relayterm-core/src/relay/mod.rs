//! Relay module - one duplex socket to the terminal relay
//!
//! Outbound: raw input text plus binary control frames. Inbound: terminal
//! output only, as text or bytes.

mod connection;
mod endpoint;
mod state;
mod transport;

pub use connection::{Connection, StateChange};
pub use endpoint::{RelayEndpoint, DEFAULT_RELAY_PATH};
pub use state::{ConnectionState, Trigger};
pub use transport::{ConnectionId, Transport, TransportEvent};
