//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `mailcal-core` (pure Rust).
//! Implementations live in `mailcal-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde_json::Value;
use mailcal_types::{
    Result,
    protocol::{ChatRequest, ChatResponse, SessionInfo},
};

// ─── Backend Port ────────────────────────────────────────────

/// The assistant backend as seen through a transport.
#[async_trait(?Send)]
pub trait BackendPort {
    /// Submit one chat request and wait for its reply.
    /// Non-2xx and unparsable replies are errors.
    async fn send_chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// No-argument liveness call
    async fn health_check(&self) -> Result<Value>;

    /// Drop the backend's history for a session (idempotent)
    async fn clear_session(&self, session_id: &str) -> Result<Value>;

    /// Diagnostics only
    async fn list_sessions(&self) -> Result<Vec<SessionInfo>>;

    /// Diagnostics only
    async fn describe_session(&self, session_id: &str) -> Result<Value>;

    /// Name of this transport (for logging/debug)
    fn transport_name(&self) -> &str;
}

// ─── Storage Port ────────────────────────────────────────────

/// Durable string key-value store (browser `localStorage` or memory).
pub trait StoragePort {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Scheduling Ports ────────────────────────────────────────

#[async_trait(?Send)]
pub trait TimerPort {
    /// Suspend the calling task for `ms` milliseconds
    async fn sleep(&self, ms: u64);
}

/// Runs detached tasks on the single-threaded event loop.
pub trait SpawnPort {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}
