pub mod openrouter;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;

use super::LlmConfig;
use self::openrouter::OpenRouterChatClient;
use crate::error::GatewayError;
use crate::models::chat::Message;

/// Message as the upstream completion API expects it. Unlike
/// [`Message`] it may carry the `system` role.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
}

impl UpstreamMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }
}

impl From<&Message> for UpstreamMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct CompletionBody {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize, Debug)]
struct CompletionMessage {
    content: Option<String>,
}

/// Validates an upstream completion body against
/// `{ choices: [{ message: { content } }] }` and returns the first content.
/// An empty string counts as no completion.
pub fn extract_completion(body: &[u8]) -> Result<String, GatewayError> {
    let parsed: CompletionBody = serde_json
        ::from_slice(body)
        .map_err(|e| GatewayError::EmptyCompletion(format!("unexpected body: {}", e)))?;

    let choice = parsed.choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::EmptyCompletion("no choices".to_string()))?;

    match choice.message.and_then(|m| m.content) {
        Some(content) if !content.is_empty() => Ok(content),
        Some(_) => Err(GatewayError::EmptyCompletion("empty content".to_string())),
        None => Err(GatewayError::EmptyCompletion("choice without message content".to_string())),
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// One completion call; never retried.
    async fn complete(&self, messages: &[UpstreamMessage]) -> Result<String, GatewayError>;

    fn get_model(&self) -> String;
}

/// Builds the upstream client. A missing or blank API key is a
/// configuration error.
pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, GatewayError> {
    let client = OpenRouterChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[test]
    fn extracts_first_choice_content() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":"Hi there!"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(extract_completion(body).unwrap(), "Hi there!");
    }

    #[test]
    fn malformed_bodies_are_empty_completions() {
        let cases: [&[u8]; 6] = [
            b"not json",
            b"{}",
            br#"{"choices":[]}"#,
            br#"{"choices":[{}]}"#,
            br#"{"choices":[{"message":{}}]}"#,
            br#"{"choices":[{"message":{"content":""}}]}"#,
        ];
        for body in cases {
            let err = extract_completion(body).unwrap_err();
            assert!(matches!(err, GatewayError::EmptyCompletion(_)), "body {:?}", body);
        }
    }

    #[test]
    fn upstream_message_keeps_role_and_content_only() {
        let msg = Message::assistant("Welcome!").with_error();
        let upstream = UpstreamMessage::from(&msg);
        assert_eq!(upstream, UpstreamMessage { role: "assistant".into(), content: "Welcome!".into() });
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn new_client_requires_api_key() {
        let config = LlmConfig { api_key: Some("   ".into()), ..LlmConfig::default() };
        assert!(matches!(new_client(&config), Err(GatewayError::Configuration)));
        assert!(matches!(new_client(&LlmConfig::default()), Err(GatewayError::Configuration)));
    }
}
