use std::time::Duration;

use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use thiserror::Error;

use crate::models::chat::ChatResponse;

/// Failures of one gateway request. `Display` carries operator detail for the
/// log; callers only ever see [`GatewayError::public_message`].
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Messages array is required")]
    InvalidInput,

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Request body rejected: {0}")]
    PayloadTooLarge(String),

    #[error("Upstream API key is not configured")]
    Configuration,

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Upstream returned no completion text: {0}")]
    EmptyCompletion(String),

    #[error("Unhandled error: {0}")]
    Unhandled(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput | GatewayError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::InvalidInput => "Messages array is required",
            GatewayError::InvalidMessage(_) => "Invalid message format",
            GatewayError::PayloadTooLarge(_) => "Request body too large",
            GatewayError::Configuration => "AI service configuration error",
            GatewayError::Upstream(_) => "AI service temporarily unavailable",
            GatewayError::EmptyCompletion(_) => "No response from AI",
            GatewayError::Unhandled(_) => "Internal server error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ChatResponse::failure(self.public_message()))).into_response()
    }
}

/// Failures seen by the conversation engine. The UI never tells them apart.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Gateway unreachable: {0}")]
    Network(String),

    #[error("Gateway did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Unreadable gateway response: {0}")]
    InvalidResponse(String),

    #[error("Gateway reported failure: {0}")]
    Gateway(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(GatewayError::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::InvalidMessage("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::Configuration.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(GatewayError::Upstream("502".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            GatewayError::EmptyCompletion("no choices".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::PayloadTooLarge("length limit exceeded".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn public_message_hides_detail() {
        let err = GatewayError::Upstream("status 401: invalid key sk-or-123".into());
        assert_eq!(err.public_message(), "AI service temporarily unavailable");
        assert!(!err.public_message().contains("sk-or"));
    }

    #[test]
    fn sub_second_timeout_is_reported_exactly() {
        let err = EngineError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Gateway did not answer within 250ms");
    }
}
