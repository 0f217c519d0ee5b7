//! Connection state machine

use serde::{Deserialize, Serialize};

/// Lifecycle of one relay socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Initial state, and terminal until the user reconnects
    #[default]
    Disconnected,
    /// Socket open requested, handshake pending
    Connecting,
    /// Handshake complete, bytes flow both ways
    Connected,
}

/// What moves a connection between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Connect,
    TransportOpen,
    TransportClosed,
    TransportError,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }

    /// Whether a socket exists that must be closed on teardown
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    /// Transition table. `None` means the trigger is not valid in this state
    /// and must be ignored.
    pub fn next(self, trigger: Trigger) -> Option<ConnectionState> {
        use ConnectionState::*;

        match (self, trigger) {
            (Disconnected, Trigger::Connect) => Some(Connecting),
            (Connecting, Trigger::TransportOpen) => Some(Connected),
            (Connecting | Connected, Trigger::TransportClosed | Trigger::TransportError) => {
                Some(Disconnected)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL_STATES: [ConnectionState; 3] = [Disconnected, Connecting, Connected];
    const ALL_TRIGGERS: [Trigger; 4] = [
        Trigger::Connect,
        Trigger::TransportOpen,
        Trigger::TransportClosed,
        Trigger::TransportError,
    ];

    #[test]
    fn test_transition_table() {
        for state in ALL_STATES {
            for trigger in ALL_TRIGGERS {
                let expected = match (state, trigger) {
                    (Disconnected, Trigger::Connect) => Some(Connecting),
                    (Connecting, Trigger::TransportOpen) => Some(Connected),
                    (Connecting, Trigger::TransportClosed | Trigger::TransportError) => {
                        Some(Disconnected)
                    }
                    (Connected, Trigger::TransportClosed | Trigger::TransportError) => {
                        Some(Disconnected)
                    }
                    _ => None,
                };
                assert_eq!(state.next(trigger), expected, "{state:?} + {trigger:?}");
            }
        }
    }

    #[test]
    fn test_no_direct_disconnected_to_connected() {
        for trigger in ALL_TRIGGERS {
            assert_ne!(Disconnected.next(trigger), Some(Connected));
        }
    }

    #[test]
    fn test_connect_only_from_disconnected() {
        assert_eq!(Connecting.next(Trigger::Connect), None);
        assert_eq!(Connected.next(Trigger::Connect), None);
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(serde_yaml::to_string(&Connecting).unwrap().trim(), "connecting");
        assert_eq!(Connected.to_string(), "connected");
        assert!(Connecting.is_live());
        assert!(!Disconnected.is_live());
    }
}
