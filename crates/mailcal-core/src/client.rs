//! Chat client: the top-level flow tying conversation, queue, session and
//! connection together.
//!
//! Owned explicitly by the application (no module-level globals); ports are
//! injected through [`ClientPorts`]. A submission is admitted synchronously
//! and then runs as a future:
//!
//! 1. user message appended (`pending`) and moved to `sending`
//! 2. request enqueued with the completed history, request id linked
//! 3. on reply: user → `sent`, assistant reply appended with the request id
//! 4. on failure: user → `error`, error notice appended, reconnect scheduled
//!
//! If the session is reset while a request is in flight the exchange is
//! orphaned and leaves the (new) conversation untouched.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use serde_json::Value;

use mailcal_types::{
    AdmissionError, ClientError, Result,
    config::ClientConfig,
    connection::ConnectionState,
    message::{LifecycleState, Message, Role},
    protocol::{ChatResponse, SessionInfo},
};
use crate::connection::ConnectionMonitor;
use crate::conversation::Conversation;
use crate::correlation::CorrelationEngine;
use crate::event_bus::EventBus;
use crate::ports::{BackendPort, SpawnPort, StoragePort, TimerPort};
use crate::queue::{QueueDeps, QueueStatus, RequestQueue};
use crate::session::SessionIdentity;

/// Platform adapters handed to the client
#[derive(Clone)]
pub struct ClientPorts {
    pub backend: Rc<dyn BackendPort>,
    pub storage: Rc<dyn StoragePort>,
    pub timer: Rc<dyn TimerPort>,
    pub spawner: Rc<dyn SpawnPort>,
}

/// How an admitted submission ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Backend answered; carries the appended assistant message
    Replied(Message),
    /// Exchange failed; carries the appended error notice
    Failed { error: ClientError, notice: Message },
    /// Session was reset before the exchange settled
    Orphaned { request_id: String },
}

/// Future of an admitted submission
pub type Submission = LocalBoxFuture<'static, SubmitOutcome>;

/// Snapshot for status displays
#[derive(Debug, Clone, PartialEq)]
pub struct ClientStatus {
    pub message_count: usize,
    pub pending_count: usize,
    pub queue: QueueStatus,
    pub connection: ConnectionState,
    pub session_id: String,
}

/// Shared handle: clone-cheap via Rc.
#[derive(Clone)]
pub struct ChatClient {
    inner: Rc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    conversation: RefCell<Conversation>,
    session: SessionIdentity,
    queue: RequestQueue,
    correlation: Rc<CorrelationEngine>,
    connection: ConnectionMonitor,
    backend: Rc<dyn BackendPort>,
    spawner: Rc<dyn SpawnPort>,
    event_bus: EventBus,
    /// Bumped on every session reset; exchanges from an older epoch are orphaned
    epoch: Cell<u64>,
}

impl ChatClient {
    pub fn new(config: ClientConfig, ports: ClientPorts, event_bus: EventBus) -> Self {
        let session = SessionIdentity::new(
            ports.storage.clone(),
            config.session_storage_key.clone(),
            event_bus.clone(),
        );
        let correlation = Rc::new(CorrelationEngine::new(config.mismatch_policy, event_bus.clone()));
        let queue = RequestQueue::new(QueueDeps {
            backend: ports.backend.clone(),
            session: session.clone(),
            correlation: correlation.clone(),
            timer: ports.timer.clone(),
            spawner: ports.spawner.clone(),
            event_bus: event_bus.clone(),
            inter_request_delay_ms: config.inter_request_delay_ms,
        });
        let connection = ConnectionMonitor::new(
            ports.backend.clone(),
            ports.timer.clone(),
            ports.spawner.clone(),
            config.reconnect_delay_ms,
            event_bus.clone(),
        );

        let inner = Rc::new(ClientInner {
            conversation: RefCell::new(Conversation::new(event_bus.clone())),
            session,
            queue,
            correlation,
            connection,
            backend: ports.backend,
            spawner: ports.spawner,
            event_bus,
            epoch: Cell::new(0),
            config,
        });

        let weak: Weak<ClientInner> = Rc::downgrade(&inner);
        inner.session.on_reset(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.epoch.set(inner.epoch.get() + 1);
            }
        });

        Self { inner }
    }

    /// Kick off the initial health probe.
    pub fn start(&self) {
        log::info!(
            "Chat client starting (backend {}, transport {})",
            self.inner.config.base_url(),
            self.inner.backend.transport_name()
        );
        let connection = self.inner.connection.clone();
        self.inner.spawner.spawn_local(Box::pin(async move {
            connection.probe().await;
        }));
    }

    /// Probe the backend now.
    pub async fn check_backend(&self) -> bool {
        self.inner.connection.probe().await
    }

    /// Admission check then submission. Refusals create no message and no
    /// request; an admitted text yields a future for the exchange.
    pub fn submit(&self, text: &str) -> Result<Submission> {
        let content = text.trim();
        if content.is_empty() {
            return Err(AdmissionError::EmptyMessage.into());
        }
        let state = self.inner.connection.state();
        if !state.is_connected() {
            log::warn!("Cannot send message: backend is {}", state.label());
            return Err(AdmissionError::NotConnected { state }.into());
        }
        let pending = self.inner.conversation.borrow().pending_messages().len();
        if pending > 0 {
            log::warn!("Request blocked: there are {} pending message(s)", pending);
            return Err(AdmissionError::Busy { pending }.into());
        }

        let inner = self.inner.clone();
        let epoch = inner.epoch.get();

        let (user_id, handle) = {
            let mut conversation = inner.conversation.borrow_mut();
            let history = conversation.to_external_history();
            let user = conversation.append(Role::User, content);
            conversation.set_lifecycle_state(&user.id, LifecycleState::Sending, None);
            let handle = inner.queue.enqueue(content, history);
            conversation.link_request(&user.id, handle.request_id());
            (user.id, handle)
        };
        log::info!("Submitting message {} as {}", user_id, handle.request_id());

        Ok(Box::pin(async move {
            let request_id = handle.request_id().to_string();
            let result = handle.await;
            inner.settle(epoch, &user_id, request_id, result)
        }))
    }

    /// Start over: empty log, fresh session id, abandoned queue.
    pub fn new_chat(&self) -> String {
        self.inner.conversation.borrow_mut().clear();
        let id = self.inner.session.reset();
        log::info!("Started new chat session");
        id
    }

    /// `new_chat()` plus asking the backend to drop the previous session.
    pub async fn clear_chat(&self) -> Result<()> {
        let previous = self.inner.session.current_id();
        self.new_chat();
        match self.inner.backend.clear_session(&previous).await {
            Ok(_) => {
                log::info!("Chat cleared and session {} reset", previous);
                Ok(())
            }
            Err(e) => {
                log::error!("Error clearing session {}: {}", previous, e);
                Err(e)
            }
        }
    }

    pub fn status(&self) -> ClientStatus {
        let conversation = self.inner.conversation.borrow();
        ClientStatus {
            message_count: conversation.len(),
            pending_count: conversation.pending_messages().len(),
            queue: self.inner.queue.status(),
            connection: self.inner.connection.state(),
            session_id: self.inner.session.current_id(),
        }
    }

    /// Whether `submit` would currently be admitted (ignoring text).
    pub fn can_submit(&self) -> bool {
        self.inner.connection.is_connected()
            && self.inner.conversation.borrow().pending_messages().is_empty()
    }

    /// Borrow the log for rendering. Do not hold across an `.await`.
    pub fn conversation(&self) -> Ref<'_, Conversation> {
        self.inner.conversation.borrow()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.conversation.borrow().messages().to_vec()
    }

    pub fn session_id(&self) -> String {
        self.inner.session.current_id()
    }

    pub fn session(&self) -> &SessionIdentity {
        &self.inner.session
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.inner.queue
    }

    pub fn connection(&self) -> &ConnectionMonitor {
        &self.inner.connection
    }

    pub fn requests_issued(&self) -> u64 {
        self.inner.correlation.issued()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub async fn sessions(&self) -> Result<Vec<SessionInfo>> {
        self.inner.backend.list_sessions().await
    }

    pub async fn describe_session(&self) -> Result<Value> {
        let id = self.inner.session.current_id();
        self.inner.backend.describe_session(&id).await
    }

    /// Cancel background work (reconnect loop) ahead of teardown.
    pub fn shutdown(&self) {
        log::info!("Chat client shutting down");
        self.inner.connection.teardown();
    }
}

impl ClientInner {
    fn settle(
        &self,
        epoch: u64,
        user_id: &str,
        request_id: String,
        result: Result<ChatResponse>,
    ) -> SubmitOutcome {
        if self.epoch.get() != epoch || matches!(result, Err(ClientError::Cancelled)) {
            log::debug!("Dropping orphaned result for {}", request_id);
            return SubmitOutcome::Orphaned { request_id };
        }

        let mut conversation = self.conversation.borrow_mut();
        match result {
            Ok(response) => {
                if let Some(agent) = &response.agent_used {
                    log::debug!("{} answered by {}", request_id, agent);
                }
                conversation.set_lifecycle_state(user_id, LifecycleState::Sent, None);
                let reply = conversation.append_reply(response.response, Some(&request_id));
                SubmitOutcome::Replied(reply)
            }
            Err(error) => {
                log::error!("Message submission failed: {}", error);
                let detail = error.to_string();
                conversation.set_lifecycle_state(user_id, LifecycleState::Error, Some(detail.clone()));
                let notice = conversation.append_error_notice(detail);
                drop(conversation);
                if error.is_transport() {
                    self.connection.report_transport_failure();
                }
                SubmitOutcome::Failed { error, notice }
            }
        }
    }
}
