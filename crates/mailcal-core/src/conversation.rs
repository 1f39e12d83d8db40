//! Conversation state: the authoritative message log.
//!
//! Append-only, insertion-ordered. Lifecycle changes go through
//! [`Conversation::set_lifecycle_state`], which refuses to move a message
//! backwards out of a terminal state.

use mailcal_types::{
    event::ClientEvent,
    message::{HistoryEntry, LifecycleState, Message, Role},
};
use crate::event_bus::EventBus;

pub struct Conversation {
    messages: Vec<Message>,
    event_bus: EventBus,
}

impl Conversation {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            messages: Vec::new(),
            event_bus,
        }
    }

    /// Create a message with a fresh id and its role's initial state and
    /// push it to the end of the log.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> Message {
        self.push(Message::new(role, content))
    }

    /// Assistant reply correlated with the request that produced it.
    pub fn append_reply(&mut self, content: impl Into<String>, request_id: Option<&str>) -> Message {
        let mut msg = Message::assistant(content);
        msg.correlated_request_id = request_id.map(str::to_string);
        self.push(msg)
    }

    /// Visible error bubble after a failed exchange.
    pub fn append_error_notice(&mut self, detail: impl Into<String>) -> Message {
        self.push(Message::error_notice(detail))
    }

    fn push(&mut self, msg: Message) -> Message {
        log::debug!(
            "Adding {:?} message {} ({})",
            msg.role,
            msg.id,
            msg.state.label()
        );
        self.messages.push(msg.clone());
        self.event_bus.emit(ClientEvent::MessageAppended {
            message_id: msg.id.clone(),
        });
        msg
    }

    /// Move a message to `state`. Unknown ids are ignored (the log may have
    /// been cleared meanwhile). Returns whether the change was applied.
    pub fn set_lifecycle_state(
        &mut self,
        message_id: &str,
        state: LifecycleState,
        error_detail: Option<String>,
    ) -> bool {
        let Some(msg) = self.messages.iter_mut().find(|m| m.id == message_id) else {
            return false;
        };
        if msg.state == state {
            if error_detail.is_some() {
                msg.error_detail = error_detail;
            }
            return true;
        }
        if !msg.state.can_transition_to(state) {
            log::warn!(
                "Refusing lifecycle change {} -> {} for message {}",
                msg.state.label(),
                state.label(),
                message_id
            );
            return false;
        }

        msg.state = state;
        msg.error_detail = error_detail;
        self.event_bus.emit(ClientEvent::MessageUpdated {
            message_id: message_id.to_string(),
            state,
        });
        true
    }

    /// Record the request id the queue assigned to a user message.
    pub fn link_request(&mut self, message_id: &str, request_id: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(msg) => {
                msg.correlated_request_id = Some(request_id.to_string());
                true
            }
            None => false,
        }
    }

    /// Messages still waiting on the backend, in log order.
    pub fn pending_messages(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.state.is_outstanding()).collect()
    }

    /// Context for the next request: completed exchanges only.
    pub fn to_external_history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| m.is_history_eligible())
            .map(Message::to_history_entry)
            .collect()
    }

    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// First message carrying `request_id` (the user side of an exchange).
    pub fn find_by_request_id(&self, request_id: &str) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.correlated_request_id.as_deref() == Some(request_id))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        log::debug!("Clearing {} message(s)", self.messages.len());
        self.messages.clear();
        self.event_bus.emit(ClientEvent::ConversationCleared);
    }
}
