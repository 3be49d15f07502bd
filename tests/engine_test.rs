//! End-to-end turns: conversation engine -> HTTP gateway -> mocked upstream.

use std::sync::Arc;
use std::time::Duration;

use wayfarer_chat::engine::store::MemoryStore;
use wayfarer_chat::engine::transport::HttpTransport;
use wayfarer_chat::engine::{ ConversationEngine, TurnOutcome, FALLBACK_REPLY };
use wayfarer_chat::llm::chat::new_client;
use wayfarer_chat::llm::LlmConfig;
use wayfarer_chat::models::chat::Role;
use wayfarer_chat::server::api::{ router, AppState, CHAT_ROUTE };

/// Serves the gateway on an ephemeral port and returns its chat URL.
async fn spawn_gateway(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state).into_make_service()).await.unwrap();
    });
    format!("http://{}{}", addr, CHAT_ROUTE)
}

fn engine_for(url: String) -> ConversationEngine {
    ConversationEngine::new(Arc::new(HttpTransport::new(url)), Arc::new(MemoryStore::new()))
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn turn_through_gateway_resolves() {
    let mut upstream = mockito::Server::new_async().await;
    let mock = upstream
        .mock("POST", "/v1/chat/completions")
        .match_body(
            mockito::Matcher::Regex(
                "The user is currently viewing destination Kyoto".to_string()
            )
        )
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"Visit in **autumn** for the leaves."}}]}"#)
        .expect(1)
        .create_async().await;

    let config = LlmConfig {
        api_key: Some("sk-or-e2e-test-key".into()),
        base_url: Some(format!("{}/v1/chat/completions", upstream.url())),
        ..LlmConfig::default()
    };
    let state = AppState::new(Some(new_client(&config).unwrap()), "You are a travel assistant.");
    let engine = engine_for(spawn_gateway(state).await);
    engine.set_location("/destinations/kyoto");

    assert_eq!(engine.send_message("When should I go?").await, TurnOutcome::Resolved);

    let messages = engine.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "Visit in **autumn** for the leaves.");
    assert!(!messages[2].is_error && !messages[2].is_fallback);
    mock.assert_async().await;
}

#[tokio::test]
async fn gateway_configuration_error_degrades() {
    let engine = engine_for(spawn_gateway(AppState::new(None, "prompt")).await);

    assert_eq!(engine.send_message("Hello").await, TurnOutcome::Degraded);
    let last = engine.messages().pop().unwrap();
    assert!(last.is_error);
    assert_eq!(last.content, FALLBACK_REPLY);
}

#[tokio::test]
async fn unreachable_gateway_degrades_and_grows_by_two() {
    // Bind then drop to get a local port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let engine = engine_for(format!("http://{}{}", addr, CHAT_ROUTE));
    let before = engine.messages().len();

    assert_eq!(engine.send_message("budget tips?").await, TurnOutcome::Degraded);

    let messages = engine.messages();
    assert_eq!(messages.len(), before + 2);
    assert_eq!(messages[before].role, Role::User);
    assert_eq!(messages[before].content, "budget tips?");
    let last = messages.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert!(last.is_error);
    assert_eq!(last.content, FALLBACK_REPLY);
}

#[tokio::test]
async fn clear_after_failures_leaves_one_greeting() {
    let engine = engine_for(spawn_gateway(AppState::new(None, "prompt")).await);
    engine.send_message("one").await;
    engine.send_message("two").await;

    engine.clear_history();
    let messages = engine.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::Assistant);
    assert!(!messages[0].is_error && !messages[0].is_fallback);
}
