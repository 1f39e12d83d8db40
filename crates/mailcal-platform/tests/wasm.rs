//! WASM-target tests for mailcal-platform (Node.js runtime).
//!
//! Tests MemoryStorage, storage fallback, reply routing and response
//! decoding under wasm32-unknown-unknown via `wasm-pack test --node`.
//!
//! localStorage and live transports require a browser and a backend.

use wasm_bindgen_test::*;

use mailcal_core::ports::StoragePort;
use mailcal_platform::backend::{decode_chat_response, HttpBackend, ReplyRouter};
use mailcal_platform::storage::{auto_detect_storage, MemoryStorage};
use mailcal_types::config::ClientConfig;
use mailcal_types::protocol::ChatResponse;
use mailcal_types::ClientError;

use futures::FutureExt;

// ─── MemoryStorage Tests ─────────────────────────────────

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
fn memory_storage_get_missing() {
    let storage = MemoryStorage::new();
    assert!(storage.get("sessionId").unwrap().is_none());
}

#[wasm_bindgen_test]
fn memory_storage_overwrite_and_delete() {
    let storage = MemoryStorage::new();
    storage.set("sessionId", "v1").unwrap();
    storage.set("sessionId", "v2").unwrap();
    assert_eq!(storage.get("sessionId").unwrap().as_deref(), Some("v2"));
    storage.delete("sessionId").unwrap();
    assert!(storage.get("sessionId").unwrap().is_none());
    storage.delete("sessionId").unwrap();
}

#[wasm_bindgen_test]
fn auto_detect_falls_back_without_window() {
    // Node has no `window`, so localStorage cannot open.
    let storage = auto_detect_storage();
    assert_eq!(storage.backend_name(), "memory");
}

// ─── HTTP Backend Tests ──────────────────────────────────

#[wasm_bindgen_test]
fn http_endpoints_join_base_url() {
    let config = ClientConfig {
        backend_url: "https://assistant.example.com/".to_string(),
        ..ClientConfig::default()
    };
    let backend = HttpBackend::new(&config);
    assert_eq!(backend.endpoint("/chat"), "https://assistant.example.com/chat");
    assert_eq!(
        backend.endpoint("/session/abc/clear"),
        "https://assistant.example.com/session/abc/clear"
    );
}

#[wasm_bindgen_test]
fn decode_valid_reply() {
    let resp = decode_chat_response(
        r#"{"response":"You have 2 new emails","session_id":"s","timestamp":"t","request_id":"req_1_1","agent_used":"email_agent"}"#,
    )
    .unwrap();
    assert_eq!(resp.request_id, "req_1_1");
    assert_eq!(resp.agent_used.as_deref(), Some("email_agent"));
}

#[wasm_bindgen_test]
fn decode_rejects_missing_fields() {
    let err = decode_chat_response(r#"{"detail":"Internal Server Error"}"#).unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
    assert!(err.is_transport());
}

// ─── Reply Router Tests ──────────────────────────────────

fn reply(request_id: &str, text: &str) -> ChatResponse {
    ChatResponse {
        response: text.to_string(),
        session_id: "s".to_string(),
        timestamp: "t".to_string(),
        request_id: request_id.to_string(),
        agent_used: None,
    }
}

#[wasm_bindgen_test]
fn router_delivers_by_request_id() {
    let router = ReplyRouter::new();
    let first = router.register("req_1_1");
    let second = router.register("req_1_2");

    assert!(router.deliver(reply("req_1_2", "two")));
    assert!(router.deliver(reply("req_1_1", "one")));
    assert_eq!(router.waiting(), 0);

    let one = first.now_or_never().unwrap().unwrap().unwrap();
    let two = second.now_or_never().unwrap().unwrap().unwrap();
    assert_eq!(one.response, "one");
    assert_eq!(two.response, "two");
}

#[wasm_bindgen_test]
fn router_unknown_id_goes_to_sole_waiter() {
    let router = ReplyRouter::new();
    let rx = router.register("req_1_1");
    assert!(router.deliver(reply("req_9_9", "stray")));
    let resp = rx.now_or_never().unwrap().unwrap().unwrap();
    assert_eq!(resp.request_id, "req_9_9");
}

#[wasm_bindgen_test]
fn router_drops_ambiguous_reply() {
    let router = ReplyRouter::new();
    let _a = router.register("req_1_1");
    let _b = router.register("req_1_2");
    assert!(!router.deliver(reply("req_9_9", "stray")));
    assert_eq!(router.waiting(), 2);
}

#[wasm_bindgen_test]
fn router_malformed_frame_fails_sole_waiter() {
    let router = ReplyRouter::new();
    let rx = router.register("req_1_1");
    assert!(router.deliver_text("not json"));
    let err = rx.now_or_never().unwrap().unwrap().unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[wasm_bindgen_test]
fn router_fail_all_on_close() {
    let router = ReplyRouter::new();
    let a = router.register("req_1_1");
    let b = router.register("req_1_2");
    router.fail_all("WebSocket closed");
    assert_eq!(router.waiting(), 0);
    for rx in [a, b] {
        let err = rx.now_or_never().unwrap().unwrap().unwrap_err();
        assert_eq!(err, ClientError::Network("WebSocket closed".to_string()));
    }
}

#[wasm_bindgen_test]
fn router_fail_except_keeps_one() {
    let router = ReplyRouter::new();
    let stale = router.register("req_1_1");
    let _fresh = router.register("req_1_2");
    router.fail_except("req_1_2", "WebSocket replaced");
    assert_eq!(router.waiting(), 1);
    assert!(stale.now_or_never().unwrap().unwrap().is_err());
}
