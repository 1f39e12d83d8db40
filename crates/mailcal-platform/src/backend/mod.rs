pub mod http;
pub mod socket;

use std::rc::Rc;

use mailcal_core::ports::{BackendPort, SpawnPort};
use mailcal_types::{
    ClientError, Result,
    config::{ClientConfig, TransportKind},
    protocol::ChatResponse,
};

pub use http::HttpBackend;
pub use socket::{ReplyRouter, SocketBackend};

/// Pick the transport named in the config.
pub fn build_backend(config: &ClientConfig, spawner: Rc<dyn SpawnPort>) -> Rc<dyn BackendPort> {
    log::info!("Backend transport: {}", config.transport.label());
    match config.transport {
        TransportKind::Http => Rc::new(HttpBackend::new(config)),
        TransportKind::WebSocket => Rc::new(SocketBackend::new(config, spawner)),
    }
}

/// Parse a chat reply body. Anything that is not a well-formed reply is a
/// `MalformedResponse`, which the client treats as a transport failure.
pub fn decode_chat_response(body: &str) -> Result<ChatResponse> {
    serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}
