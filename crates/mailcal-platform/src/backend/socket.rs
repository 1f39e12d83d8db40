//! WebSocket transport for the assistant backend.
//!
//! Architecture:
//! - One socket per session at `ws://<host>/ws/<session_id>`, opened lazily
//!   on the first chat and reopened when the session changes or the socket
//!   has closed
//! - Outgoing frames are `SocketFrame::Chat` (JSON, `"type": "chat"`)
//! - A reader task feeds incoming frames to the [`ReplyRouter`], which wakes
//!   the waiting request by `request_id`
//!
//! Health, clear and diagnostics calls go over HTTP.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::lock::Mutex;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message as WsMessage};
use gloo_utils::errors::JsError;
use serde_json::Value;

use mailcal_core::ports::{BackendPort, SpawnPort};
use mailcal_types::{
    ClientError, Result,
    config::ClientConfig,
    protocol::{ChatRequest, ChatResponse, SessionInfo, SocketFrame},
};
use super::{decode_chat_response, HttpBackend};

type Waiter = oneshot::Sender<Result<ChatResponse>>;

// ─── Reply Router ────────────────────────────────────────────

/// Requests waiting for a reply frame, keyed by request id.
#[derive(Clone, Default)]
pub struct ReplyRouter {
    waiting: Rc<RefCell<HashMap<String, Waiter>>>,
}

impl ReplyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, request_id: &str) -> oneshot::Receiver<Result<ChatResponse>> {
        let (tx, rx) = oneshot::channel();
        self.waiting.borrow_mut().insert(request_id.to_string(), tx);
        rx
    }

    pub fn forget(&self, request_id: &str) {
        self.waiting.borrow_mut().remove(request_id);
    }

    pub fn waiting(&self) -> usize {
        self.waiting.borrow().len()
    }

    /// Route one text frame. Returns whether a waiter was woken.
    pub fn deliver_text(&self, text: &str) -> bool {
        match decode_chat_response(text) {
            Ok(response) => self.deliver(response),
            Err(e) => {
                log::warn!("Undecodable WebSocket frame: {}", e);
                match self.take_sole_waiter() {
                    Some(waiter) => {
                        let _ = waiter.send(Err(e));
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Hand a reply to its waiter. An unknown id goes to the only waiter if
    /// there is exactly one (the correlation check flags it downstream).
    pub fn deliver(&self, response: ChatResponse) -> bool {
        let exact = self.waiting.borrow_mut().remove(&response.request_id);
        let waiter = match exact {
            Some(waiter) => Some(waiter),
            None => self.take_sole_waiter(),
        };
        match waiter {
            Some(waiter) => {
                let _ = waiter.send(Ok(response));
                true
            }
            None => {
                log::warn!(
                    "Dropping reply for {}: {} request(s) waiting",
                    response.request_id,
                    self.waiting()
                );
                false
            }
        }
    }

    /// Fail every waiter, e.g. when the socket closes.
    pub fn fail_all(&self, reason: &str) {
        self.fail_except("", reason);
    }

    /// Fail every waiter but `keep`.
    pub fn fail_except(&self, keep: &str, reason: &str) {
        let waiters: Vec<Waiter> = {
            let mut waiting = self.waiting.borrow_mut();
            let doomed: Vec<String> = waiting.keys().filter(|k| k.as_str() != keep).cloned().collect();
            doomed.iter().filter_map(|k| waiting.remove(k)).collect()
        };
        if !waiters.is_empty() {
            log::warn!("Failing {} waiting request(s): {}", waiters.len(), reason);
        }
        for waiter in waiters {
            let _ = waiter.send(Err(ClientError::Network(reason.to_string())));
        }
    }

    fn take_sole_waiter(&self) -> Option<Waiter> {
        let mut waiting = self.waiting.borrow_mut();
        if waiting.len() != 1 {
            return None;
        }
        let key = waiting.keys().next().cloned()?;
        waiting.remove(&key)
    }
}

// ─── Socket Backend ──────────────────────────────────────────

struct Connection {
    session_id: String,
    writer: SplitSink<WebSocket, WsMessage>,
    closed: Rc<Cell<bool>>,
}

impl Connection {
    fn usable_for(&self, session_id: &str) -> bool {
        !self.closed.get() && self.session_id == session_id
    }
}

pub struct SocketBackend {
    config: ClientConfig,
    http: HttpBackend,
    router: ReplyRouter,
    connection: Mutex<Option<Connection>>,
    /// Serial of the newest socket; only its reader may fail waiters
    current: Rc<Cell<u64>>,
    spawner: Rc<dyn SpawnPort>,
}

impl SocketBackend {
    pub fn new(config: &ClientConfig, spawner: Rc<dyn SpawnPort>) -> Self {
        Self {
            config: config.clone(),
            http: HttpBackend::new(config),
            router: ReplyRouter::new(),
            connection: Mutex::new(None),
            current: Rc::new(Cell::new(0)),
            spawner,
        }
    }

    pub fn router(&self) -> &ReplyRouter {
        &self.router
    }

    /// Open a socket for `session_id` and start its reader task.
    fn open(&self, session_id: &str) -> Result<Connection> {
        let url = self.config.socket_url(session_id);
        let socket = WebSocket::open(&url).map_err(socket_error)?;
        log::info!("WebSocket opened: {}", url);

        let serial = self.current.get() + 1;
        self.current.set(serial);

        let (writer, mut reader) = socket.split();
        let closed = Rc::new(Cell::new(false));
        let router = self.router.clone();
        let current = self.current.clone();
        let reader_closed = closed.clone();
        self.spawner.spawn_local(Box::pin(async move {
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        router.deliver_text(&text);
                    }
                    Ok(WsMessage::Bytes(bytes)) => {
                        log::warn!("Ignoring {}-byte binary frame", bytes.len());
                    }
                    Err(e) => {
                        log::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
            reader_closed.set(true);
            if current.get() == serial {
                router.fail_all("WebSocket closed");
            }
        }));

        Ok(Connection {
            session_id: session_id.to_string(),
            writer,
            closed,
        })
    }

    async fn write_frame(&self, req: &ChatRequest) -> Result<()> {
        let frame = serde_json::to_string(&SocketFrame::Chat(req.clone()))?;

        let mut guard = self.connection.lock().await;
        let reusable = guard
            .as_ref()
            .map(|c| c.usable_for(&req.session_id))
            .unwrap_or(false);
        if !reusable {
            if let Some(mut stale) = guard.take() {
                self.router.fail_except(&req.request_id, "WebSocket replaced");
                let _ = stale.writer.close().await;
            }
            *guard = Some(self.open(&req.session_id)?);
        }
        let Some(connection) = guard.as_mut() else {
            return Err(ClientError::Network("WebSocket not open".to_string()));
        };
        if let Err(e) = connection.writer.send(WsMessage::Text(frame)).await {
            *guard = None;
            return Err(ClientError::Network(e.to_string()));
        }
        Ok(())
    }
}

fn socket_error(e: JsError) -> ClientError {
    ClientError::Network(format!("WebSocket open failed: {}", e))
}

#[async_trait(?Send)]
impl BackendPort for SocketBackend {
    async fn send_chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let reply = self.router.register(&req.request_id);
        if let Err(e) = self.write_frame(req).await {
            self.router.forget(&req.request_id);
            return Err(e);
        }
        reply
            .await
            .unwrap_or_else(|_| Err(ClientError::Network("WebSocket closed".to_string())))
    }

    async fn health_check(&self) -> Result<Value> {
        self.http.health_check().await
    }

    async fn clear_session(&self, session_id: &str) -> Result<Value> {
        self.http.clear_session(session_id).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        self.http.list_sessions().await
    }

    async fn describe_session(&self, session_id: &str) -> Result<Value> {
        self.http.describe_session(session_id).await
    }

    fn transport_name(&self) -> &str {
        "websocket"
    }
}
