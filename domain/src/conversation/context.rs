//! Conversation context
//!
//! The ordered message log for one session. Messages are only ever appended;
//! the log lives until the process exits and is never reloaded.

use super::entities::{Message, Role};

#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    messages: Vec<Message>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the log with a system message.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut context = Self::new();
        context.push(Message::system(prompt));
        context
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
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

    /// Number of messages excluding the system prompt.
    pub fn exchange_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .count()
    }

    /// Messages appended since `mark` (a previous [`len`](Self::len)).
    pub fn since(&self, mark: usize) -> &[Message] {
        &self.messages[mark.min(self.messages.len())..]
    }
}
