use thiserror::Error;
use crate::connection::ConnectionState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request ID mismatch: expected {expected}, received {received}")]
    CorrelationMismatch { expected: String, received: String },

    #[error("Submission refused: {0}")]
    Admission(#[from] AdmissionError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Failures that mean the backend is unreachable or misbehaving,
    /// which flip connectivity and trigger a reconnect probe.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Http { .. } | ClientError::MalformedResponse(_)
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

/// Reasons a submission is refused before it reaches the queue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("backend is {}", .state.label())]
    NotConnected { state: ConnectionState },

    #[error("{pending} message(s) still pending")]
    Busy { pending: usize },
}
