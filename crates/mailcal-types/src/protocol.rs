//! Backend wire contract.
//!
//! Field names are fixed by the assistant backend (`snake_case` JSON).

use serde::{Deserialize, Serialize};
use crate::message::HistoryEntry;

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    pub history: Vec<HistoryEntry>,
    pub request_id: String,
    /// ISO-8601 UTC
    pub timestamp: String,
}

/// Reply to a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub timestamp: String,
    /// Echo of the request's id; a mismatch is reported, not fatal by default
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub agent_used: Option<String>,
}

/// Entry of `GET /sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: String,
    pub message_count: usize,
}

/// Frames written to the WebSocket transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SocketFrame {
    #[serde(rename = "chat")]
    Chat(ChatRequest),
}
