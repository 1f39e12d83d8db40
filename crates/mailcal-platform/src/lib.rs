//! Browser adapters for the `mailcal-core` ports.
//!
//! - [`backend`]: HTTP (`fetch` via gloo-net) and WebSocket transports
//! - [`storage`]: `localStorage` with an in-memory fallback
//! - [`runtime`]: gloo-timers sleep and `spawn_local`

pub mod backend;
pub mod storage;
pub mod runtime;

pub use backend::{build_backend, HttpBackend, SocketBackend};
pub use runtime::{GlooTimer, WasmSpawner};
