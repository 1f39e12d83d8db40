//! HTTP transport for the assistant backend.
//!
//! Uses browser `fetch()` via gloo-net. Endpoints:
//! `POST /chat`, `GET /` (health), `DELETE /session/{id}/clear`,
//! `GET /sessions`, `GET /session/{id}`.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use mailcal_core::ports::BackendPort;
use mailcal_types::{
    ClientError, Result,
    config::ClientConfig,
    protocol::{ChatRequest, ChatResponse, SessionInfo},
};
use super::decode_chat_response;

pub struct HttpBackend {
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
        }
    }

    /// Absolute URL for an endpoint path (leading `/` expected).
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = Request::get(&self.endpoint(path))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        read_json(response).await
    }
}

/// Non-2xx → `Http`, unparsable body → `MalformedResponse`.
async fn read_body(response: Response) -> Result<String> {
    if !response.ok() {
        return Err(ClientError::Http {
            status: response.status(),
        });
    }
    response
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = read_body(response).await?;
    serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}

#[async_trait(?Send)]
impl BackendPort for HttpBackend {
    async fn send_chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let response = Request::post(&self.endpoint("/chat"))
            .header("Content-Type", "application/json")
            .json(req)
            .map_err(|e| ClientError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let body = read_body(response).await?;
        decode_chat_response(&body)
    }

    async fn health_check(&self) -> Result<Value> {
        self.get_json("/").await
    }

    async fn clear_session(&self, session_id: &str) -> Result<Value> {
        let response = Request::delete(&self.endpoint(&format!("/session/{}/clear", session_id)))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        read_json(response).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        self.get_json("/sessions").await
    }

    async fn describe_session(&self, session_id: &str) -> Result<Value> {
        self.get_json(&format!("/session/{}", session_id)).await
    }

    fn transport_name(&self) -> &str {
        "http"
    }
}
