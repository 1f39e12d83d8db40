//! WASM-target tests for mailcal-core.
//!
//! Runs EventBus, session, correlation, conversation and queue tests under
//! wasm32-unknown-unknown via `wasm-pack test --node`.

use wasm_bindgen_test::*;

use mailcal_core::conversation::Conversation;
use mailcal_core::correlation::CorrelationEngine;
use mailcal_core::event_bus::EventBus;
use mailcal_core::ports::*;
use mailcal_core::queue::{QueueDeps, RequestQueue};
use mailcal_core::session::SessionIdentity;
use mailcal_types::config::MismatchPolicy;
use mailcal_types::event::ClientEvent;
use mailcal_types::message::*;
use mailcal_types::protocol::*;
use mailcal_types::ClientError;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde_json::{json, Value};

// ─── EventBus Tests ──────────────────────────────────────

#[wasm_bindgen_test]
fn event_bus_drain_empties() {
    let bus = EventBus::new();
    bus.emit(ClientEvent::ConversationCleared);
    assert_eq!(bus.drain().len(), 1);
    assert!(bus.drain().is_empty());
}

#[wasm_bindgen_test]
fn event_bus_bounded() {
    let bus = EventBus::with_capacity(3);
    for _ in 0..10 {
        bus.emit(ClientEvent::ConversationCleared);
    }
    assert_eq!(bus.drain().len(), 3);
    assert_eq!(bus.dropped(), 7);
}

// ─── Session Tests ───────────────────────────────────────

#[derive(Default)]
struct MapStorage(RefCell<HashMap<String, String>>);

impl StoragePort for MapStorage {
    fn get(&self, key: &str) -> mailcal_types::Result<Option<String>> {
        Ok(self.0.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> mailcal_types::Result<()> {
        self.0.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> mailcal_types::Result<()> {
        self.0.borrow_mut().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "map"
    }
}

#[wasm_bindgen_test]
fn session_id_is_stable_until_reset() {
    let session = SessionIdentity::new(Rc::new(MapStorage::default()), "sessionId", EventBus::new());
    let first = session.current_id();
    assert_eq!(session.current_id(), first);
    let second = session.reset();
    assert_ne!(first, second);
    assert_eq!(session.current_id(), second);
}

#[wasm_bindgen_test]
fn session_id_uses_js_randomness() {
    let a = SessionIdentity::new(Rc::new(MapStorage::default()), "k", EventBus::new());
    let b = SessionIdentity::new(Rc::new(MapStorage::default()), "k", EventBus::new());
    assert_ne!(a.current_id(), b.current_id());
}

// ─── Correlation Tests ───────────────────────────────────

#[wasm_bindgen_test]
fn request_ids_monotonic_counter() {
    let engine = CorrelationEngine::new(MismatchPolicy::Advisory, EventBus::new());
    let ids: Vec<String> = (0..3).map(|_| engine.next_request_id()).collect();
    assert!(ids[0].ends_with("_1"));
    assert!(ids[2].ends_with("_3"));
    assert!(ids[0].starts_with("req_"));
}

// ─── Conversation Tests ──────────────────────────────────

#[wasm_bindgen_test]
fn conversation_history_filters_pending() {
    let mut conv = Conversation::new(EventBus::new());
    let sent = conv.append(Role::User, "hello");
    conv.set_lifecycle_state(&sent.id, LifecycleState::Sending, None);
    conv.set_lifecycle_state(&sent.id, LifecycleState::Sent, None);
    conv.append(Role::Assistant, "hi there");
    conv.append(Role::User, "pending");

    let history = conv.to_external_history();
    assert_eq!(history.len(), 2);
    assert_eq!(conv.pending_messages().len(), 1);
}

// ─── Queue Tests ─────────────────────────────────────────

struct EchoBackend;

#[async_trait(?Send)]
impl BackendPort for EchoBackend {
    async fn send_chat(&self, req: &ChatRequest) -> mailcal_types::Result<ChatResponse> {
        if req.message == "fail" {
            return Err(ClientError::Http { status: 503 });
        }
        Ok(ChatResponse {
            response: format!("echo: {}", req.message),
            session_id: req.session_id.clone(),
            timestamp: req.timestamp.clone(),
            request_id: req.request_id.clone(),
            agent_used: None,
        })
    }

    async fn health_check(&self) -> mailcal_types::Result<Value> {
        Ok(json!({"status": "ok"}))
    }

    async fn clear_session(&self, _session_id: &str) -> mailcal_types::Result<Value> {
        Ok(json!({}))
    }

    async fn list_sessions(&self) -> mailcal_types::Result<Vec<SessionInfo>> {
        Ok(Vec::new())
    }

    async fn describe_session(&self, _session_id: &str) -> mailcal_types::Result<Value> {
        Ok(json!({}))
    }

    fn transport_name(&self) -> &str {
        "echo"
    }
}

struct NoDelay;

#[async_trait(?Send)]
impl TimerPort for NoDelay {
    async fn sleep(&self, _ms: u64) {}
}

struct BrowserSpawner;

impl SpawnPort for BrowserSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

fn echo_queue() -> RequestQueue {
    let bus = EventBus::new();
    RequestQueue::new(QueueDeps {
        backend: Rc::new(EchoBackend),
        session: SessionIdentity::new(Rc::new(MapStorage::default()), "sessionId", bus.clone()),
        correlation: Rc::new(CorrelationEngine::new(MismatchPolicy::Strict, bus.clone())),
        timer: Rc::new(NoDelay),
        spawner: Rc::new(BrowserSpawner),
        event_bus: bus,
        inter_request_delay_ms: 0,
    })
}

#[wasm_bindgen_test]
async fn queue_round_trip() {
    let queue = echo_queue();
    let handle = queue.enqueue("Show my emails", Vec::new());
    let request_id = handle.request_id().to_string();
    let response = handle.await.unwrap();
    assert_eq!(response.response, "echo: Show my emails");
    assert_eq!(response.request_id, request_id);
}

#[wasm_bindgen_test]
async fn queue_continues_after_failure() {
    let queue = echo_queue();
    let failing = queue.enqueue("fail", Vec::new());
    let next = queue.enqueue("after", Vec::new());
    assert_eq!(failing.await, Err(ClientError::Http { status: 503 }));
    assert_eq!(next.await.unwrap().response, "echo: after");
}
