use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;

use crate::error::EngineError;
use crate::models::chat::{ ChatRequest, ChatResponse };

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, EngineError>;
}

/// Posts chat turns to the gateway endpoint.
pub struct HttpTransport {
    http: HttpClient,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, EngineError> {
        let resp = self.http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        // Failure bodies come with 4xx/5xx, so the status is not checked here.
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| EngineError::Network(e.to_string()))?;
        debug!("Gateway answered {} ({} bytes)", status, body.len());

        serde_json
            ::from_slice::<ChatResponse>(&body)
            .map_err(|e| EngineError::InvalidResponse(format!("status {}: {}", status, e)))
    }
}
