//! OpenAI-compatible streaming gateway
//!
//! Implements [`ChatCompletionGateway`] over `POST /v1/chat/completions`
//! with `stream: true`. The response body is read by a background task
//! that decodes SSE lines into [`StreamEvent`]s and forwards them over an
//! mpsc channel; the turn loop consumes them through a [`StreamHandle`].

use super::protocol::{ChatCompletionChunk, ChatCompletionRequest};
use super::sse::{SseLine, SseLineBuffer};
use crate::config::FileProviderConfig;
use async_trait::async_trait;
use callgate_application::{ChatCompletionGateway, ChatRequest, GatewayError, StreamHandle};
use callgate_domain::StreamEvent;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

const STREAM_BUFFER: usize = 64;

pub struct OpenAiChatGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    /// Applies to receiving response headers, not to the whole stream.
    request_timeout: Option<Duration>,
}

impl OpenAiChatGateway {
    pub fn new(base_url: &str, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
            request_timeout: None,
        }
    }

    pub fn from_config(config: &FileProviderConfig) -> Self {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(
                env = %config.api_key_env,
                "No API key configured; requests are sent unauthenticated"
            );
        }
        Self::new(&config.base_url, config.model.clone(), api_key)
            .with_request_timeout(config.timeout_seconds.map(Duration::from_secs))
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, GatewayError> {
        let body = ChatCompletionRequest::streaming(&self.model, request);
        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, builder.send())
                .await
                .map_err(|_| GatewayError::Timeout)?,
            None => builder.send().await,
        }
        .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Provider rejected request");
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatCompletionGateway for OpenAiChatGateway {
    fn model(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<StreamHandle, GatewayError> {
        info!(
            model = %self.model,
            messages = request.messages.len(),
            forced = request.tool_choice.is_some(),
            "Sending chat completion request"
        );
        let response = self.send(request).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(pump_events(response, tx));
        Ok(StreamHandle::new(rx))
    }
}

/// Read the SSE body until `[DONE]`, forwarding decoded events.
///
/// Returns early when the receiver is dropped (turn cancelled).
async fn pump_events(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut body = response.bytes_stream();
    let mut lines = SseLineBuffer::new();
    let mut finish_reason: Option<String> = None;

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Stream body failed");
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        };

        for line in lines.feed(&chunk) {
            if !forward_line(line, &tx, &mut finish_reason).await {
                return;
            }
        }
    }

    if let Some(line) = lines.finish()
        && !forward_line(line, &tx, &mut finish_reason).await
    {
        return;
    }

    // Body ended without [DONE]; accept it if the model had finished.
    let terminal = match finish_reason {
        Some(reason) => StreamEvent::Completed {
            finish_reason: Some(reason),
        },
        None => StreamEvent::Error("stream ended before completion".to_string()),
    };
    let _ = tx.send(terminal).await;
}

/// Returns `false` once the stream is over or nobody is listening.
async fn forward_line(
    line: SseLine,
    tx: &mpsc::Sender<StreamEvent>,
    finish_reason: &mut Option<String>,
) -> bool {
    let data = match line {
        SseLine::Done => {
            let _ = tx
                .send(StreamEvent::Completed {
                    finish_reason: finish_reason.take(),
                })
                .await;
            return false;
        }
        SseLine::Data(data) => data,
    };

    let chunk: ChatCompletionChunk = match serde_json::from_str(&data) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!(error = %e, "Malformed stream chunk");
            let _ = tx
                .send(StreamEvent::Error(format!("malformed stream chunk: {}", e)))
                .await;
            return false;
        }
    };

    let (events, reason) = chunk.into_events();
    if reason.is_some() {
        *finish_reason = reason;
    }
    for event in events {
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() || terminal {
            return false;
        }
    }
    true
}

fn map_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_stub;
    use callgate_domain::Message;
    use tokio::net::TcpListener;

    async fn drain(handle: StreamHandle) -> Vec<StreamEvent> {
        let mut receiver = handle.receiver;
        let mut events = Vec::new();
        while let Some(event) = receiver.recv().await {
            events.push(event);
        }
        events
    }

    fn hello() -> ChatRequest {
        ChatRequest::unforced(vec![Message::user("hi")])
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let gateway = OpenAiChatGateway::new("http://localhost:8080/", "m", None);
        assert_eq!(gateway.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_streams_tool_call_fragments() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"use_function_decision\",\"arguments\":\"\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"a\\\"\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let server = http_stub::serve(vec![("200 OK", "text/event-stream", body.to_string())]).await;
        let gateway =
            OpenAiChatGateway::new(&server.base_url, "test-model", Some("sk-test".to_string()));

        let events = drain(gateway.stream_chat(&hello()).await.unwrap()).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            StreamEvent::ToolCallDelta { id: Some(id), .. } if id == "call_1"
        ));
        assert_eq!(
            events[1],
            StreamEvent::ToolCallDelta {
                index: 0,
                id: None,
                name: None,
                arguments_delta: Some("{\"a\"".to_string()),
            }
        );
        assert_eq!(
            events[2],
            StreamEvent::Completed {
                finish_reason: Some("tool_calls".to_string())
            }
        );

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("\"stream\":true"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = http_stub::serve(vec![(
            "401 Unauthorized",
            "application/json",
            "{\"error\":\"bad key\"}".to_string(),
        )])
        .await;
        let gateway = OpenAiChatGateway::new(&server.base_url, "m", None);

        let err = gateway.stream_chat(&hello()).await.err().unwrap();
        assert_eq!(
            err,
            GatewayError::HttpStatus {
                status: 401,
                body: "{\"error\":\"bad key\"}".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_truncated_body_is_an_error_event() {
        let server = http_stub::serve(vec![(
            "200 OK",
            "text/event-stream",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n".to_string(),
        )])
        .await;
        let gateway = OpenAiChatGateway::new(&server.base_url, "m", None);

        let events = drain(gateway.stream_chat(&hello()).await.unwrap()).await;

        assert_eq!(events[0], StreamEvent::Delta("Hel".to_string()));
        assert!(matches!(events.last(), Some(StreamEvent::Error(_))));
    }

    #[tokio::test]
    async fn test_malformed_chunk_fails_the_stream() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"use_function_decision\",\"arguments\":\"{\\\"response\\\":\\\"▓Hel\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"lo wor\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"ld░\\\"}\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let server = http_stub::serve(vec![("200 OK", "text/event-stream", body.to_string())]).await;
        let gateway = OpenAiChatGateway::new(&server.base_url, "m", None);

        let events = drain(gateway.stream_chat(&hello()).await.unwrap()).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], StreamEvent::ToolCallDelta { index: 0, .. }));
        assert!(matches!(
            &events[1],
            StreamEvent::Error(message) if message.starts_with("malformed stream chunk")
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = OpenAiChatGateway::new(&format!("http://{}", addr), "m", None);
        let err = gateway.stream_chat(&hello()).await.err().unwrap();
        assert!(matches!(err, GatewayError::ConnectionError(_)));
    }
}
