use serde::{Deserialize, Serialize};
use crate::{ClientError, Result};

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the assistant backend, without trailing slash
    pub backend_url: String,
    pub transport: TransportKind,
    /// Spacing between consecutive queued requests
    pub inter_request_delay_ms: u64,
    /// Fixed backoff between reconnect probes
    pub reconnect_delay_ms: u64,
    /// Key under which the session id is persisted
    pub session_storage_key: String,
    pub mismatch_policy: MismatchPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            transport: TransportKind::Http,
            inter_request_delay_ms: 100,
            reconnect_delay_ms: 2000,
            session_storage_key: "sessionId".to_string(),
            mismatch_policy: MismatchPolicy::Advisory,
        }
    }
}

impl ClientConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if url.is_empty() {
            return Err(ClientError::Config("backend_url is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "backend_url must be http(s): {}",
                url
            )));
        }
        if self.session_storage_key.trim().is_empty() {
            return Err(ClientError::Config("session_storage_key is empty".to_string()));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ClientError::Config("reconnect_delay_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.backend_url.trim().trim_end_matches('/')
    }

    /// WebSocket endpoint for a session: `http://h` → `ws://h/ws/<id>`.
    pub fn socket_url(&self, session_id: &str) -> String {
        let base = self.base_url();
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws/{}", base, session_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// One `fetch` per request
    Http,
    /// Chat over a persistent socket, everything else over HTTP
    WebSocket,
}

impl TransportKind {
    pub fn label(&self) -> &str {
        match self {
            TransportKind::Http => "HTTP",
            TransportKind::WebSocket => "WebSocket",
        }
    }
}

/// What to do with a response whose `request_id` does not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Warn and keep the response body
    Advisory,
    /// Reject the response
    Strict,
}

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
