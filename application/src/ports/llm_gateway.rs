//! Chat completion gateway port
//!
//! Defines the interface for streaming chat completions from an inference
//! provider. The core depends only on this contract, never on a provider's
//! transport.

use async_trait::async_trait;
use callgate_domain::{Message, StreamEvent, ToolDefinition};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Timeout")]
    Timeout,
}

/// How the model may use the offered tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model decides.
    Auto,
    /// The model must call the named function.
    Function(String),
}

/// One chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<ToolChoice>,
}

impl ChatRequest {
    /// A request that forces a call to `tool`.
    pub fn forced(messages: Vec<Message>, tool: ToolDefinition) -> Self {
        let choice = ToolChoice::Function(tool.name.clone());
        Self {
            messages,
            tools: vec![tool],
            tool_choice: Some(choice),
        }
    }

    /// A plain request without tools.
    pub fn unforced(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: None,
        }
    }
}

/// Gateway for chat completions
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatCompletionGateway: Send + Sync {
    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Start a streaming completion.
    ///
    /// Errors raised before the first byte is received are returned here;
    /// errors during streaming arrive as [`StreamEvent::Error`].
    async fn stream_chat(&self, request: &ChatRequest) -> Result<StreamHandle, GatewayError>;
}

/// Handle for receiving streaming events.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all plain text into a single string.
    ///
    /// Tool-call fragments are ignored.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::ToolCallDelta { .. } => {}
                StreamEvent::Completed { .. } => return Ok(full_text),
                StreamEvent::Error(e) => return Err(GatewayError::StreamInterrupted(e)),
            }
        }
        Err(GatewayError::StreamInterrupted(
            "stream closed before completion".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_request_names_tool() {
        let tool = ToolDefinition {
            name: "use_function_decision".to_string(),
            description: String::new(),
            parameters: serde_json::json!({"type": "object"}),
            strict: true,
        };
        let request = ChatRequest::forced(vec![Message::user("hi")], tool);
        assert_eq!(
            request.tool_choice,
            Some(ToolChoice::Function("use_function_decision".to_string()))
        );
        assert_eq!(request.tools.len(), 1);

        let plain = ChatRequest::unforced(vec![]);
        assert!(plain.tools.is_empty() && plain.tool_choice.is_none());
    }

    #[tokio::test]
    async fn test_collect_text() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Delta("Hello ".to_string())).await.unwrap();
        tx.send(StreamEvent::Delta("world".to_string())).await.unwrap();
        tx.send(StreamEvent::Completed { finish_reason: None }).await.unwrap();
        drop(tx);

        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn test_collect_text_fails_on_early_close() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Delta("partial".to_string())).await.unwrap();
        drop(tx);

        let err = StreamHandle::new(rx).collect_text().await.unwrap_err();
        assert!(matches!(err, GatewayError::StreamInterrupted(_)));
    }
}
