use serde::{ Serialize, Deserialize };
use uuid::Uuid;

pub const CREDITS_REMAINING: &str = "unlimited";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// One turn in a conversation.
///
/// `id` only identifies the message for rendering and deduplication; order is
/// always the position in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_message_id")]
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, rename = "isError", skip_serializing_if = "is_false")]
    pub is_error: bool,
    #[serde(default, rename = "isFallback", skip_serializing_if = "is_false")]
    pub is_fallback: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            is_error: false,
            is_fallback: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_error(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn with_fallback(mut self, is_fallback: bool) -> Self {
        self.is_fallback = is_fallback;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Wire response of the chat endpoint. Success and failure share one shape,
/// told apart by `success`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits_remaining: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_travelpro: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fallback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Successful reply as seen by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub is_fallback: bool,
}

impl ChatResponse {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            credits_remaining: Some(CREDITS_REMAINING.to_string()),
            is_premium: Some(false),
            is_travelpro: Some(false),
            is_fallback: Some(false),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            credits_remaining: None,
            is_premium: None,
            is_travelpro: None,
            is_fallback: None,
            error: Some(error.into()),
        }
    }

    /// A `success:true` body without `response` text is reported as a failure.
    pub fn into_result(self) -> Result<ChatReply, String> {
        if !self.success {
            return Err(self.error.unwrap_or_else(|| "Unknown error".to_string()));
        }
        match self.response {
            Some(response) => Ok(ChatReply {
                response,
                is_fallback: self.is_fallback.unwrap_or(false),
            }),
            None => Err("Missing response text".to_string()),
        }
    }
}
