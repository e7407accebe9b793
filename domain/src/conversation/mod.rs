//! Conversation domain.
//!
//! - [`entities::Message`]: a role-tagged message, optionally carrying tool calls
//! - [`entities::ToolDefinition`]: a tool offered to the model on a request
//! - [`context::ConversationContext`]: the append-only message log driving each inference call

pub mod context;
pub mod entities;
