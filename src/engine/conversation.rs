use crate::models::chat::Message;

pub const GREETING: &str =
    "Hi! I'm your travel assistant. Ask me about destinations, itineraries, budget tips, or the best time to visit.";

/// Append-only message log. Insertion order is display order.
#[derive(Clone, Debug)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Starts with a single assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replaces the whole log with a fresh greeting.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
