use async_trait::async_trait;
use log::{ debug, error, info };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE } };
use serde::Serialize;
use std::time::Duration;

use super::{ extract_completion, ChatClient, UpstreamMessage };
use crate::error::GatewayError;
use crate::llm::{ mask_token, LlmConfig, DEFAULT_CHAT_BASE_URL, DEFAULT_CHAT_MODEL, MAX_TOKENS, TEMPERATURE };

const MAX_LOGGED_BODY: usize = 500;

pub struct OpenRouterChatClient {
    http: HttpClient,
    model: String,
    url: String,
}

/// Sampling parameters are fixed here; nothing from the caller reaches them.
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [UpstreamMessage],
    max_tokens: u32,
    temperature: f32,
}

impl OpenRouterChatClient {
    pub fn new(
        api_key: &str,
        model: Option<String>,
        url: Option<String>,
        site_url: Option<&str>,
        site_name: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let api_url = url.unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
            error!("Upstream API key {} is not a valid header value", mask_token(api_key));
            GatewayError::Configuration
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        // OpenRouter attribution headers
        if let Some(site_url) = site_url {
            if let Ok(value) = HeaderValue::from_str(site_url) {
                headers.insert("http-referer", value);
            }
        }
        if let Some(site_name) = site_name {
            if let Ok(value) = HeaderValue::from_str(site_name) {
                headers.insert("x-title", value);
            }
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unhandled(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "Upstream chat client ready: model={}, url={}, key={}",
            chat_model,
            api_url,
            mask_token(api_key)
        );

        Ok(Self {
            http,
            model: chat_model,
            url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, GatewayError> {
        let api_key = config.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(GatewayError::Configuration)?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.site_url.as_deref(),
            config.site_name.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl ChatClient for OpenRouterChatClient {
    async fn complete(&self, messages: &[UpstreamMessage]) -> Result<String, GatewayError> {
        let req = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!("Sending {} messages to {}", messages.len(), self.url);

        let resp = self.http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("request error: {}", e)))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream(format!("failed reading body: {}", e)))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(
                GatewayError::Upstream(
                    format!("status {}: {}", status, truncate(&text, MAX_LOGGED_BODY))
                )
            );
        }

        extract_completion(&body)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: String) -> OpenRouterChatClient {
        OpenRouterChatClient::new(
            "sk-or-test-key-0000",
            Some("test/model".into()),
            Some(url),
            Some("https://example.travel"),
            Some("Wayfarer"),
            Duration::from_secs(5),
        ).unwrap()
    }

    #[tokio::test]
    async fn sends_fixed_sampling_parameters_and_bearer_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer sk-or-test-key-0000")
            .match_header("x-title", "Wayfarer")
            .match_body(
                mockito::Matcher::Json(
                    serde_json::json!({
                        "model": "test/model",
                        "messages": [{ "role": "user", "content": "Hello" }],
                        "max_tokens": 500,
                        "temperature": 0.7
                    })
                )
            )
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"Hi there!"}}]}"#)
            .create_async().await;

        let client = client_for(server.url());
        let messages = vec![UpstreamMessage { role: "user".into(), content: "Hello".into() }];
        let text = client.complete(&messages).await.unwrap();

        assert_eq!(text, "Hi there!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(429)
            .with_body(r#"{"error":{"message":"rate limited"}}"#)
            .create_async().await;

        let client = client_for(server.url());
        let err = client.complete(&[]).await.unwrap_err();
        match err {
            GatewayError::Upstream(detail) => assert!(detail.contains("429")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
