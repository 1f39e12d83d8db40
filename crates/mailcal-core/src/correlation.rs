//! Correlation engine: tags every outgoing request and checks the echo.
//!
//! Ids look like `req_<unix-millis>_<counter>`. The counter is process-wide
//! for the engine and is never rewound, so ids stay unique across session
//! resets even within the same millisecond.

use std::cell::Cell;

use mailcal_types::{
    ClientError, Result,
    config::MismatchPolicy,
    event::ClientEvent,
    protocol::ChatResponse,
};
use crate::event_bus::EventBus;

pub struct CorrelationEngine {
    counter: Cell<u64>,
    policy: MismatchPolicy,
    event_bus: EventBus,
}

impl CorrelationEngine {
    pub fn new(policy: MismatchPolicy, event_bus: EventBus) -> Self {
        Self {
            counter: Cell::new(0),
            policy,
            event_bus,
        }
    }

    pub fn next_request_id(&self) -> String {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        format!("req_{}_{}", chrono::Utc::now().timestamp_millis(), n)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.counter.get()
    }

    pub fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Compare the echoed id with the one we sent. A mismatch is logged and
    /// published but does not decide what happens to the response.
    pub fn matches(&self, response_request_id: &str, expected_request_id: &str) -> bool {
        if response_request_id == expected_request_id {
            return true;
        }
        log::warn!(
            "Request ID mismatch: expected {}, received {}",
            expected_request_id,
            response_request_id
        );
        self.event_bus.emit(ClientEvent::CorrelationMismatch {
            expected: expected_request_id.to_string(),
            received: response_request_id.to_string(),
        });
        false
    }

    /// Apply the mismatch policy to a response.
    pub fn verify(&self, response: ChatResponse, expected_request_id: &str) -> Result<ChatResponse> {
        if self.matches(&response.request_id, expected_request_id) {
            return Ok(response);
        }
        match self.policy {
            MismatchPolicy::Advisory => Ok(response),
            MismatchPolicy::Strict => Err(ClientError::CorrelationMismatch {
                expected: expected_request_id.to_string(),
                received: response.request_id,
            }),
        }
    }
}
