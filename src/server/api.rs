use crate::cli::ServeArgs;
use crate::error::GatewayError;
use crate::llm::chat::{ new_client, ChatClient, UpstreamMessage };
use crate::models::chat::{ ChatRequest, ChatResponse, Message };
use std::any::Any;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{ rejection::BytesRejection, DefaultBodyLimit, State },
    http::{ header::{ self, HeaderValue }, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use serde_json::Value as JsonValue;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use log::{ info, warn, error };

pub const CHAT_ROUTE: &str = "/api/ai-chat";
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly travel assistant for a travel discovery website. \
Help visitors with destinations, itineraries, budget tips, and the best time to visit. \
Keep answers short and practical. Use simple markdown (short paragraphs, lists, bold) when it helps.";

const ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
const ALLOW_HEADERS: &str =
    "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no upstream credential is configured.
    chat_client: Option<Arc<dyn ChatClient>>,
    system_prompt: Arc<str>,
}

impl AppState {
    pub fn new(chat_client: Option<Arc<dyn ChatClient>>, system_prompt: &str) -> Self {
        Self {
            chat_client,
            system_prompt: Arc::from(system_prompt),
        }
    }

    /// A missing API key does not stop the server; every chat request then
    /// answers with a configuration error.
    pub fn from_args(args: &ServeArgs) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_client = match new_client(&args.llm_config()) {
            Ok(client) => {
                info!("Chat model: {}", client.get_model());
                Some(client)
            }
            Err(GatewayError::Configuration) => {
                error!("OPENROUTER_API_KEY is not set; chat requests will fail until it is configured");
                None
            }
            Err(e) => {
                return Err(Box::new(e));
            }
        };
        Ok(Self::new(chat_client, &args.system_prompt))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            CHAT_ROUTE,
            post(chat_handler).options(preflight_handler).fallback(method_not_allowed)
        )
        .route("/health", get(health_handler))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_SIZE))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*")
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS)
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS)
            )
        )
        .with_state(state)
}

pub async fn start_http_server(args: &ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.server_addr.parse::<SocketAddr>()?;
    let app = router(AppState::from_args(args)?);

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("Missing TLS certificate or key path".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS chat gateway on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            e
        })?;
        info!("Starting HTTP chat gateway on: http://{}", addr);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>
) -> Response {
    let result = match body {
        Ok(body) => handle_chat(&state, &body).await,
        Err(rejection) => Err(body_rejection(rejection)),
    };
    match result {
        Ok(text) => (StatusCode::OK, Json(ChatResponse::ok(text))).into_response(),
        Err(e) => {
            match &e {
                GatewayError::InvalidInput
                | GatewayError::InvalidMessage(_)
                | GatewayError::PayloadTooLarge(_) => {
                    warn!("Rejected chat request: {}", e);
                }
                _ => error!("Chat request failed: {}", e),
            }
            e.into_response()
        }
    }
}

/// Body-limit overruns keep the JSON failure shape instead of axum's plain text.
fn body_rejection(rejection: BytesRejection) -> GatewayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(rejection.body_text())
    } else {
        GatewayError::InvalidInput
    }
}

async fn handle_chat(state: &AppState, body: &[u8]) -> Result<String, GatewayError> {
    let request = parse_chat_request(body)?;
    let client = state.chat_client.as_ref().ok_or(GatewayError::Configuration)?;

    let context = request_context(&request);
    info!("Chat request: {} messages, context={:?}", request.messages.len(), context);

    let upstream = build_upstream_messages(&state.system_prompt, context.as_deref(), &request.messages);
    client.complete(&upstream).await
}

/// `messages` must be a non-empty array before anything else is looked at.
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, GatewayError> {
    let value: JsonValue = serde_json::from_slice(body).map_err(|_| GatewayError::InvalidInput)?;

    match value.get("messages") {
        Some(JsonValue::Array(items)) if !items.is_empty() => {}
        _ => {
            return Err(GatewayError::InvalidInput);
        }
    }

    serde_json::from_value(value).map_err(|e| GatewayError::InvalidMessage(e.to_string()))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn request_context(request: &ChatRequest) -> Option<String> {
    non_blank(&request.context)
        .map(str::to_string)
        .or_else(|| non_blank(&request.destination).map(|d| format!("viewing destination {}", d)))
}

pub fn build_upstream_messages(
    system_prompt: &str,
    context: Option<&str>,
    messages: &[Message]
) -> Vec<UpstreamMessage> {
    let system = match context {
        Some(ctx) => format!("{}\n\nThe user is currently {}.", system_prompt, ctx),
        None => system_prompt.to_string(),
    };

    let mut upstream = Vec::with_capacity(messages.len() + 1);
    upstream.push(UpstreamMessage::system(system));
    upstream.extend(messages.iter().map(UpstreamMessage::from));
    upstream
}

async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, Json(ChatResponse::failure("Method not allowed"))).into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ChatResponse::failure("Not found"))).into_response()
}

async fn health_handler() -> Json<JsonValue> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    let e = GatewayError::Unhandled(detail);
    error!("Chat request failed: {}", e);
    e.into_response()
}
