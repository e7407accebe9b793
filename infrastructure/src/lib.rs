//! Infrastructure layer for callgate
//!
//! Adapters for the ports defined in the application layer: the streaming
//! chat-completions gateway, the function registry and its service clients,
//! the JSONL transcript writer, and configuration file loading.

pub mod config;
pub mod functions;
pub mod logging;
pub mod openai;
pub mod services;

#[cfg(test)]
mod http_stub;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use functions::{FunctionRegistry, default_registry};
pub use logging::JsonlConversationLogger;
pub use openai::OpenAiChatGateway;
pub use services::{CoinbaseClient, GoogleCalendarClient, ServiceError, SmtpMailer};
