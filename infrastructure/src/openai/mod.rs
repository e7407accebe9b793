//! OpenAI-compatible Chat Completions adapter.
//!
//! - [`protocol`]: request/chunk wire types
//! - [`sse`]: incremental SSE line decoding
//! - [`gateway`]: the [`ChatCompletionGateway`](callgate_application::ChatCompletionGateway) adapter

pub mod gateway;
pub mod protocol;
pub mod sse;

pub use gateway::OpenAiChatGateway;
