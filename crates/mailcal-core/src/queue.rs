//! Request queue: one backend call in flight, strict FIFO.
//!
//! `enqueue` appends and hands back a [`ResponseHandle`]; a detached drain
//! task pops the head, runs it through the [`BackendPort`], settles the
//! handle, waits the inter-request delay and moves on. Because only one
//! request is ever in flight, replies settle in submission order.
//!
//! `reset()` drops every queued entry unsettled (their handles observe
//! `ClientError::Cancelled`) and bumps a generation counter. A drain task
//! from an older generation finishes its in-flight entry and then exits,
//! leaving the draining flag to whatever task the next `enqueue` starts.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use futures::FutureExt;

use mailcal_types::{
    AdmissionError, ClientError, Result,
    event::ClientEvent,
    message::{iso_timestamp, HistoryEntry},
    protocol::{ChatRequest, ChatResponse},
};
use crate::correlation::CorrelationEngine;
use crate::event_bus::EventBus;
use crate::ports::{BackendPort, SpawnPort, TimerPort};
use crate::session::SessionIdentity;

/// A unit of work waiting for (or occupying) the transport
pub struct PendingRequest {
    pub request_id: String,
    pub message: String,
    pub history: Vec<HistoryEntry>,
    pub enqueued_at: DateTime<Utc>,
    responder: oneshot::Sender<Result<ChatResponse>>,
}

impl PendingRequest {
    fn settle(self, outcome: Result<ChatResponse>) {
        // The caller may have dropped its handle; nothing to do then.
        let _ = self.responder.send(outcome);
    }
}

/// Read-only snapshot for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStatus {
    /// Entries waiting, not counting the one in flight
    pub length: usize,
    pub is_draining: bool,
}

/// Resolves once the enqueued request settles.
pub struct ResponseHandle {
    request_id: String,
    rx: oneshot::Receiver<Result<ChatResponse>>,
}

impl ResponseHandle {
    /// Id assigned at enqueue time, known before the request runs
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Future for ResponseHandle {
    type Output = Result<ChatResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx
            .poll_unpin(cx)
            .map(|settled| settled.unwrap_or(Err(ClientError::Cancelled)))
    }
}

/// Everything the queue needs from the outside world
pub struct QueueDeps {
    pub backend: Rc<dyn BackendPort>,
    pub session: SessionIdentity,
    pub correlation: Rc<CorrelationEngine>,
    pub timer: Rc<dyn TimerPort>,
    pub spawner: Rc<dyn SpawnPort>,
    pub event_bus: EventBus,
    pub inter_request_delay_ms: u64,
}

/// Shared handle: clone-cheap via Rc.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Rc<QueueInner>,
}

struct QueueInner {
    entries: RefCell<VecDeque<PendingRequest>>,
    draining: Cell<bool>,
    generation: Cell<u64>,
    deps: QueueDeps,
}

impl RequestQueue {
    /// Build the queue and subscribe it to session resets.
    pub fn new(deps: QueueDeps) -> Self {
        let inner = Rc::new(QueueInner {
            entries: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
            generation: Cell::new(0),
            deps,
        });

        let weak: Weak<QueueInner> = Rc::downgrade(&inner);
        inner.deps.session.on_reset(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.reset();
            }
        });

        Self { inner }
    }

    /// Append a request to the tail. Never fails here; problems surface
    /// through the returned handle.
    pub fn enqueue(&self, message: impl Into<String>, history: Vec<HistoryEntry>) -> ResponseHandle {
        let message = message.into();
        let request_id = self.inner.deps.correlation.next_request_id();
        let (responder, rx) = oneshot::channel();

        if message.trim().is_empty() {
            let _ = responder.send(Err(AdmissionError::EmptyMessage.into()));
            return ResponseHandle { request_id, rx };
        }

        let queue_length = {
            let mut entries = self.inner.entries.borrow_mut();
            entries.push_back(PendingRequest {
                request_id: request_id.clone(),
                message,
                history,
                enqueued_at: Utc::now(),
                responder,
            });
            entries.len()
        };
        log::debug!("Request queued: {} (queue length {})", request_id, queue_length);
        self.inner.deps.event_bus.emit(ClientEvent::RequestQueued {
            request_id: request_id.clone(),
            queue_length,
        });

        self.inner.kick();
        ResponseHandle { request_id, rx }
    }

    /// Abandon all not-yet-started entries and clear the draining flag.
    pub fn reset(&self) {
        self.inner.reset();
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            length: self.inner.entries.borrow().len(),
            is_draining: self.inner.draining.get(),
        }
    }
}

impl QueueInner {
    /// Start a drain task unless one is already running.
    fn kick(self: &Rc<Self>) {
        if self.draining.get() {
            return;
        }
        self.draining.set(true);
        let task = drain(self.clone(), self.generation.get());
        self.deps.spawner.spawn_local(Box::pin(task));
    }

    fn reset(&self) {
        let abandoned: Vec<PendingRequest> = self.entries.borrow_mut().drain(..).collect();
        if !abandoned.is_empty() {
            log::info!("Request queue reset, abandoning {} request(s)", abandoned.len());
        }
        self.draining.set(false);
        self.generation.set(self.generation.get() + 1);
        // Dropped outside the borrow: receivers wake with Cancelled.
        drop(abandoned);
    }

    async fn execute(&self, request: &PendingRequest) -> Result<ChatResponse> {
        let chat = ChatRequest {
            message: request.message.trim().to_string(),
            session_id: self.deps.session.current_id(),
            history: request.history.clone(),
            request_id: request.request_id.clone(),
            timestamp: iso_timestamp(Utc::now()),
        };
        log::debug!(
            "Sending {} via {} ({} history entries, waited {}ms)",
            chat.request_id,
            self.deps.backend.transport_name(),
            chat.history.len(),
            (Utc::now() - request.enqueued_at).num_milliseconds()
        );

        let response = self.deps.backend.send_chat(&chat).await?;
        self.deps.correlation.verify(response, &request.request_id)
    }
}

async fn drain(inner: Rc<QueueInner>, generation: u64) {
    loop {
        if inner.generation.get() != generation {
            return;
        }
        let next = inner.entries.borrow_mut().pop_front();
        let Some(request) = next else {
            inner.draining.set(false);
            return;
        };

        let request_id = request.request_id.clone();
        inner.deps.event_bus.emit(ClientEvent::RequestStarted {
            request_id: request_id.clone(),
        });

        let outcome = inner.execute(&request).await;
        let success = outcome.is_ok();
        match &outcome {
            Ok(_) => log::debug!("Request completed: {}", request_id),
            Err(e) => log::error!("Request failed: {} ({})", request_id, e),
        }
        request.settle(outcome);
        inner.deps.event_bus.emit(ClientEvent::RequestSettled { request_id, success });

        inner.deps.timer.sleep(inner.deps.inter_request_delay_ms).await;
    }
}
