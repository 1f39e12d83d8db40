use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Prefix marking an assistant notice produced by a failed exchange.
pub const ERROR_MARKER: &str = "**Error**: ";

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Delivery progress of a message.
///
/// User messages walk `Pending → Sending → Sent | Error`.
/// Assistant messages are born `Received` and never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Pending,
    Sending,
    Sent,
    Error,
    Received,
}

impl LifecycleState {
    /// Initial state for a freshly appended message.
    pub fn initial_for(role: Role) -> Self {
        match role {
            Role::User => LifecycleState::Pending,
            Role::Assistant => LifecycleState::Received,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LifecycleState::Sent | LifecycleState::Error | LifecycleState::Received
        )
    }

    /// Still waiting on the backend.
    pub fn is_outstanding(self) -> bool {
        matches!(self, LifecycleState::Pending | LifecycleState::Sending)
    }

    /// Whether `self → next` respects the monotonic lifecycle.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Pending, Sending) | (Pending, Error) | (Sending, Sent) | (Sending, Error)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Sending => "sending",
            LifecycleState::Sent => "sent",
            LifecycleState::Error => "error",
            LifecycleState::Received => "received",
        }
    }
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub state: LifecycleState,
    /// Request id shared by a user message and the reply it produced
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub correlated_request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_detail: Option<String>,
}

impl Message {
    /// Build a message with a fresh id, `created_at = now` and the
    /// role's initial lifecycle state.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            state: LifecycleState::initial_for(role),
            correlated_request_id: None,
            error_detail: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant notice shown after a failed exchange.
    pub fn error_notice(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let mut msg = Self::assistant(format!("{}{}", ERROR_MARKER, detail));
        msg.error_detail = Some(detail);
        msg
    }

    pub fn is_error_notice(&self) -> bool {
        self.role == Role::Assistant && self.error_detail.is_some()
    }

    /// Completed successfully and fit to be sent back as context.
    pub fn is_history_eligible(&self) -> bool {
        match self.role {
            Role::User => self.state == LifecycleState::Sent,
            Role::Assistant => self.state == LifecycleState::Received && self.error_detail.is_none(),
        }
    }

    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role,
            content: self.content.trim().to_string(),
            timestamp: Some(iso_timestamp(self.created_at)),
            id: Some(self.id.clone()),
        }
    }
}

/// Conversation context as sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-01-01T10:00:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_message_id() -> String {
    format!("msg_{}", uuid::Uuid::new_v4().simple())
}
