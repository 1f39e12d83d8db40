//! Backend connectivity as an explicit state machine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Inputs that move the connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSignal {
    ProbeStarted,
    ProbeSucceeded,
    ProbeFailed,
    TransportFailed,
    Closed,
}

impl ConnectionState {
    pub fn transition(self, signal: ConnectionSignal) -> ConnectionState {
        match signal {
            ConnectionSignal::ProbeStarted => ConnectionState::Connecting,
            ConnectionSignal::ProbeSucceeded => ConnectionState::Connected,
            ConnectionSignal::ProbeFailed
            | ConnectionSignal::TransportFailed
            | ConnectionSignal::Closed => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}
