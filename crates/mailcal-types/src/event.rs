use serde::{Deserialize, Serialize};
use crate::connection::ConnectionState;
use crate::message::LifecycleState;

/// Events emitted by the client core.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientEvent {
    /// A message was added to the conversation log
    MessageAppended { message_id: String },

    /// A message changed lifecycle state
    MessageUpdated { message_id: String, state: LifecycleState },

    /// The conversation log was emptied
    ConversationCleared,

    /// A request joined the tail of the queue
    RequestQueued { request_id: String, queue_length: usize },

    /// A request left the queue and is in flight
    RequestStarted { request_id: String },

    /// The in-flight request settled
    RequestSettled { request_id: String, success: bool },

    /// A response echoed a different request id than expected
    CorrelationMismatch { expected: String, received: String },

    /// Backend connectivity changed
    ConnectionChanged { state: ConnectionState },

    /// A new session id replaced the previous one
    SessionReset { session_id: String },
}
