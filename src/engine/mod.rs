//! Client-side conversation engine.
//!
//! Owns one conversation for the lifetime of a session, drives the
//! `Idle -> Sending -> Idle` turn cycle and never leaves the UI without a
//! reply: any gateway failure becomes a local fallback message.

pub mod context;
pub mod conversation;
pub mod store;
pub mod transport;

use log::{ info, warn };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use std::time::Duration;

use self::context::location_to_context;
use self::conversation::Conversation;
use self::store::KeyValueStore;
use self::transport::ChatTransport;
use crate::error::EngineError;
use crate::models::chat::{ ChatReply, ChatRequest, Message };

pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting right now. Please try again in a moment, or try asking about what's on screen.";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const OPEN_STATE_KEY: &str = "ai_chat_open";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatStatus {
    Idle,
    Sending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing changed.
    Ignored,
    Resolved,
    Degraded,
    /// History was cleared while the turn was in flight; its reply was dropped.
    Superseded,
}

struct EngineState {
    conversation: Conversation,
    status: ChatStatus,
    location: String,
    /// Bumped on every clear so in-flight turns can tell they are stale.
    generation: u64,
}

/// Puts the status back to `Idle` if a turn is dropped while `Sending`.
struct SendingGuard<'a> {
    state: &'a Mutex<EngineState>,
    armed: bool,
}

impl SendingGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Chat turn abandoned before a reply arrived");
            self.state.lock().unwrap_or_else(PoisonError::into_inner).status = ChatStatus::Idle;
        }
    }
}

pub struct ConversationEngine {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<EngineState>,
    // Held for a whole turn: submissions run one after another.
    turn_lock: tokio::sync::Mutex<()>,
    timeout: Duration,
}

impl ConversationEngine {
    pub fn new(transport: Arc<dyn ChatTransport>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            transport,
            store,
            state: Mutex::new(EngineState {
                conversation: Conversation::new(),
                status: ChatStatus::Idle,
                location: "/".to_string(),
                generation: 0,
            }),
            turn_lock: tokio::sync::Mutex::new(()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock_state().conversation.messages().to_vec()
    }

    pub fn status(&self) -> ChatStatus {
        self.lock_state().status
    }

    pub fn is_typing(&self) -> bool {
        self.status() == ChatStatus::Sending
    }

    pub fn location(&self) -> String {
        self.lock_state().location.clone()
    }

    pub fn set_location(&self, path: &str) {
        self.lock_state().location = path.to_string();
    }

    pub fn is_open(&self) -> bool {
        self.store.get(OPEN_STATE_KEY).as_deref() == Some("true")
    }

    pub fn toggle_open(&self) -> bool {
        let open = !self.is_open();
        if open {
            self.store.set(OPEN_STATE_KEY, "true");
        } else {
            self.store.remove(OPEN_STATE_KEY);
        }
        open
    }

    pub fn clear_history(&self) {
        let mut state = self.lock_state();
        state.conversation.reset();
        state.generation += 1;
    }

    /// Runs one turn. The user message is appended before the gateway is
    /// called; exactly one assistant message follows unless the history was
    /// cleared meanwhile. Dropping the future mid-turn returns the status to
    /// `Idle` and leaves the user message unanswered.
    pub async fn send_message(&self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::Ignored;
        }

        let _turn = self.turn_lock.lock().await;

        let (request, generation) = {
            let mut state = self.lock_state();
            state.conversation.push(Message::user(text));
            state.status = ChatStatus::Sending;
            let request = ChatRequest {
                messages: state.conversation.messages().to_vec(),
                context: Some(location_to_context(&state.location)),
                destination: None,
            };
            (request, state.generation)
        };
        let mut sending = SendingGuard { state: &self.state, armed: true };

        let result = self.request_reply(&request).await;

        sending.disarm();
        let mut state = self.lock_state();
        state.status = ChatStatus::Idle;
        if state.generation != generation {
            info!("Conversation cleared during turn; dropping reply");
            return TurnOutcome::Superseded;
        }

        match result {
            Ok(reply) => {
                state.conversation.push(
                    Message::assistant(reply.response).with_fallback(reply.is_fallback)
                );
                TurnOutcome::Resolved
            }
            Err(e) => {
                warn!("Chat turn degraded: {}", e);
                state.conversation.push(Message::assistant(FALLBACK_REPLY).with_error());
                TurnOutcome::Degraded
            }
        }
    }

    async fn request_reply(&self, request: &ChatRequest) -> Result<ChatReply, EngineError> {
        let response = tokio::time
            ::timeout(self.timeout, self.transport.send(request)).await
            .map_err(|_| EngineError::Timeout(self.timeout))??;
        response.into_result().map_err(EngineError::Gateway)
    }
}
