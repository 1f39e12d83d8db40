//! UI-level state that drives rendering.
//! This is a read-only projection of the chat client, refreshed each frame
//! after draining the EventBus.

use mailcal_core::ClientStatus;
use mailcal_types::{
    connection::ConnectionState,
    event::ClientEvent,
    message::{LifecycleState, Message, Role},
};

pub const PLACEHOLDER_READY: &str = "Ask about your emails or calendar...";
pub const PLACEHOLDER_BUSY: &str = "Processing your message...";
pub const PLACEHOLDER_CONNECTING: &str = "Connecting to backend...";
pub const PLACEHOLDER_DISCONNECTED: &str = "Backend disconnected. Trying to reconnect...";

/// State visible to UI panels
pub struct UiState {
    /// Displayed messages, in log order
    pub messages: Vec<ChatEntry>,
    /// Input field content
    pub input_text: String,
    /// Status line text
    pub status_text: String,
    /// Latest non-fatal warning (e.g. correlation mismatch)
    pub last_warning: Option<String>,
    pub connection: ConnectionState,
    pub message_count: usize,
    pub pending_count: usize,
    pub queue_length: usize,
    pub session_id: String,
}

/// A chat entry for display
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub state: LifecycleState,
    pub error_detail: Option<String>,
    pub is_error_notice: bool,
}

impl From<&Message> for ChatEntry {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id.clone(),
            role: msg.role,
            content: msg.content.clone(),
            state: msg.state,
            error_detail: msg.error_detail.clone(),
            is_error_notice: msg.is_error_notice(),
        }
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            input_text: String::new(),
            status_text: PLACEHOLDER_CONNECTING.to_string(),
            last_warning: None,
            connection: ConnectionState::Disconnected,
            message_count: 0,
            pending_count: 0,
            queue_length: 0,
            session_id: String::new(),
        }
    }

    /// Update the status line from client events. Returns true when the
    /// message log may have changed and should be re-read.
    pub fn process_events(&mut self, events: Vec<ClientEvent>) -> bool {
        let mut log_changed = false;
        for event in events {
            match event {
                ClientEvent::MessageAppended { .. }
                | ClientEvent::MessageUpdated { .. }
                | ClientEvent::ConversationCleared => {
                    log_changed = true;
                }
                ClientEvent::RequestQueued { queue_length, .. } => {
                    self.queue_length = queue_length;
                }
                ClientEvent::RequestStarted { .. } => {
                    self.status_text = PLACEHOLDER_BUSY.to_string();
                }
                ClientEvent::RequestSettled { success, .. } => {
                    self.status_text = if success {
                        "Ready".to_string()
                    } else {
                        "Request failed".to_string()
                    };
                }
                ClientEvent::CorrelationMismatch { expected, received } => {
                    self.last_warning = Some(format!(
                        "Reply id mismatch: expected {}, received {}",
                        expected, received
                    ));
                }
                ClientEvent::ConnectionChanged { state } => {
                    self.connection = state;
                    self.status_text = match state {
                        ConnectionState::Connected => "Connected".to_string(),
                        ConnectionState::Connecting => PLACEHOLDER_CONNECTING.to_string(),
                        ConnectionState::Disconnected => PLACEHOLDER_DISCONNECTED.to_string(),
                    };
                }
                ClientEvent::SessionReset { session_id } => {
                    log::debug!("UI switched to session {}", session_id);
                    self.session_id = session_id;
                    self.last_warning = None;
                    self.status_text = "New chat started".to_string();
                    log_changed = true;
                }
            }
        }
        log_changed
    }

    /// Take a fresh snapshot of the client.
    pub fn refresh(&mut self, status: &ClientStatus, messages: &[Message]) {
        self.messages = messages.iter().map(ChatEntry::from).collect();
        self.connection = status.connection;
        self.message_count = status.message_count;
        self.pending_count = status.pending_count;
        self.queue_length = status.queue.length;
        self.session_id = status.session_id.clone();
    }

    pub fn is_busy(&self) -> bool {
        self.pending_count > 0
    }

    /// Input accepted only while connected and idle.
    pub fn input_enabled(&self) -> bool {
        self.connection.is_connected() && !self.is_busy()
    }

    pub fn placeholder(&self) -> &'static str {
        placeholder(self.connection, self.is_busy())
    }

    /// First eight characters of the session id, for the header.
    pub fn session_prefix(&self) -> &str {
        let end = self
            .session_id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.session_id.len());
        &self.session_id[..end]
    }

    /// Append speech-to-text output to the input, one space apart.
    pub fn append_transcript(&mut self, transcript: &str) {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return;
        }
        let current = self.input_text.trim();
        self.input_text = if current.is_empty() {
            transcript.to_string()
        } else {
            format!("{} {}", current, transcript)
        };
    }

    /// Trimmed input, clearing the field. `None` for blank input.
    pub fn take_input(&mut self) -> Option<String> {
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.input_text.clear();
        Some(text)
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Input placeholder for the current connection and busy state.
pub fn placeholder(connection: ConnectionState, busy: bool) -> &'static str {
    match connection {
        ConnectionState::Connected if busy => PLACEHOLDER_BUSY,
        ConnectionState::Connected => PLACEHOLDER_READY,
        ConnectionState::Connecting => PLACEHOLDER_CONNECTING,
        ConnectionState::Disconnected => PLACEHOLDER_DISCONNECTED,
    }
}
