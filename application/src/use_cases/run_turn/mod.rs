//! Run Turn use case
//!
//! Drives one user turn from input to final reply:
//!
//! | Step | Call                         | Context appended                          |
//! |------|------------------------------|-------------------------------------------|
//! | 1    | forced decision (streamed)   | user, assistant + tool_calls              |
//! | 2a   | direct answer                | tool echo `{"success":true}`              |
//! | 2b   | confirmation (write only)    | on decline: tool "cancelled", user notice |
//! | 3    | function execution           | tool result                               |
//! | 4    | unforced summary (streamed)  | assistant                                 |
//!
//! Exactly one function runs per turn, strictly after confirmation and
//! strictly before the summary call. Every tool call the model emits gets a
//! tool message so the next request stays well-formed.

mod types;

pub use types::RunTurnError;

use crate::config::TurnParams;
use crate::ports::confirmation::{ConfirmationDecision, ConfirmationPort, ConfirmationRequest};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::display::{ReplyKind, TurnDisplay};
use crate::ports::function_executor::{FunctionExecutorPort, RegistryError};
use crate::ports::llm_gateway::{ChatCompletionGateway, ChatRequest, GatewayError};
use callgate_domain::util::preview;
use callgate_domain::{
    ConversationContext, Decision, DecisionDecodeError, DecisionProtocol, DecisionStreamDecoder,
    ExecutionResult, FunctionArguments, Message, StreamEvent, StreamedResponse, TurnOutcome,
    TurnPhase,
};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for running a single conversational turn
pub struct RunTurnUseCase<G: ChatCompletionGateway + 'static, E: FunctionExecutorPort + 'static> {
    gateway: Arc<G>,
    executor: Arc<E>,
    confirmation: Arc<dyn ConfirmationPort>,
    params: TurnParams,
    cancellation_token: Option<CancellationToken>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<G, E> Clone for RunTurnUseCase<G, E>
where
    G: ChatCompletionGateway + 'static,
    E: FunctionExecutorPort + 'static,
{
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            executor: self.executor.clone(),
            confirmation: self.confirmation.clone(),
            params: self.params.clone(),
            cancellation_token: self.cancellation_token.clone(),
            conversation_logger: self.conversation_logger.clone(),
        }
    }
}

impl<G: ChatCompletionGateway + 'static, E: FunctionExecutorPort + 'static> RunTurnUseCase<G, E> {
    pub fn new(gateway: Arc<G>, executor: Arc<E>, confirmation: Arc<dyn ConfirmationPort>) -> Self {
        Self {
            gateway,
            executor,
            confirmation,
            params: TurnParams::default(),
            cancellation_token: None,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_params(mut self, params: TurnParams) -> Self {
        self.params = params;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Set a conversation logger for the JSONL transcript
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Run one turn for `input`, appending everything it produces to `context`.
    ///
    /// On error the context keeps whatever was recorded up to the failure,
    /// so the next turn can continue from it.
    pub async fn execute(
        &self,
        context: &mut ConversationContext,
        input: &str,
        display: &dyn TurnDisplay,
    ) -> Result<TurnOutcome, RunTurnError> {
        info!(input = %preview(input, 80), "Starting turn");
        context.push(Message::user(input));
        self.log("user_message", json!({ "content": input }));

        let mut phase = TurnPhase::AwaitingDecision;
        let result = self.run(context, display, &mut phase).await;

        match &result {
            Ok(outcome) => {
                debug!(function = ?outcome.function(), "Turn completed");
            }
            Err(e) => {
                let failed_at = phase;
                phase = phase.transition(TurnPhase::Failed).unwrap_or(phase);
                warn!(error = %e, failed_at = %failed_at, "Turn failed");
                self.log(
                    "turn_failed",
                    json!({
                        "error": e.to_string(),
                        "phase": phase.as_str(),
                        "failed_at": failed_at.as_str(),
                    }),
                );
            }
        }
        result
    }

    async fn run(
        &self,
        context: &mut ConversationContext,
        display: &dyn TurnDisplay,
        phase: &mut TurnPhase,
    ) -> Result<TurnOutcome, RunTurnError> {
        let tool = DecisionProtocol::build(&self.executor.list_schemas());
        let request = ChatRequest::forced(context.messages().to_vec(), tool);
        let response = self
            .stream_response(&request, ReplyKind::Decision, display)
            .await?;

        let (call_id, decision) = match response.decision() {
            Ok((call, decision)) => (call.id.clone(), decision),
            Err(e) => {
                self.record_failed_decision(context, &response, &e);
                return Err(e.into());
            }
        };

        self.log("decision", decision_payload(&decision));

        match decision {
            Decision::Respond { text } => {
                *phase = phase.transition(TurnPhase::DirectAnswer)?;
                if !response.response_streamed && !text.is_empty() {
                    display.on_reply_start(ReplyKind::Decision);
                    display.on_reply_chunk(&text);
                    display.on_reply_end();
                }
                context.push(Message::assistant_with_tool_calls(
                    text.clone(),
                    response.tool_calls.clone(),
                ));
                context.push(Message::tool(
                    &call_id,
                    ExecutionResult::success().to_message_content(),
                ));
                answer_extra_calls(context, &response, &call_id);
                self.log("assistant_message", json!({ "content": text }));
                *phase = phase.transition(TurnPhase::Done)?;
                Ok(TurnOutcome::Answered { text })
            }
            Decision::Invoke {
                function_name,
                arguments,
            } => {
                context.push(Message::assistant_with_tool_calls(
                    response.content.clone(),
                    response.tool_calls.clone(),
                ));
                answer_extra_calls(context, &response, &call_id);
                self.invoke(context, display, phase, &call_id, function_name, arguments)
                    .await
            }
        }
    }

    async fn invoke(
        &self,
        context: &mut ConversationContext,
        display: &dyn TurnDisplay,
        phase: &mut TurnPhase,
        call_id: &str,
        name: String,
        arguments: FunctionArguments,
    ) -> Result<TurnOutcome, RunTurnError> {
        let lookup = self
            .executor
            .operation_type(&name)
            .and_then(|operation| {
                self.executor
                    .requires_confirmation(&name)
                    .map(|required| (operation, required))
            });
        let (operation_type, requires_confirmation) = match lookup {
            Ok(found) => found,
            Err(RegistryError::UnknownFunction(_)) => {
                warn!(function = %name, "Decision names an unknown function");
                context.push(Message::tool(
                    call_id,
                    ExecutionResult::failure(format!("Unknown function: {}", name))
                        .to_message_content(),
                ));
                return Err(RunTurnError::UnknownFunction(name));
            }
        };

        display.on_function_selected(&name, &arguments, requires_confirmation);

        if requires_confirmation {
            *phase = phase.transition(TurnPhase::AwaitingConfirmation)?;
            let request = ConfirmationRequest {
                operation_type,
                function_name: name.clone(),
                arguments: arguments.clone(),
            };

            let answer = match self.ask_confirmation(&request).await {
                Ok(answer) => answer,
                Err(e) => {
                    context.push(Message::tool(
                        call_id,
                        ExecutionResult::failure(format!("Confirmation failed: {}", e))
                            .to_message_content(),
                    ));
                    return Err(e);
                }
            };
            self.log(
                "confirmation",
                json!({ "function": name, "approved": answer.is_proceed() }),
            );

            if answer == ConfirmationDecision::Cancel {
                return self.acknowledge_cancellation(context, display, phase, call_id, name).await;
            }
            *phase = phase.transition(TurnPhase::Confirmed)?;
        }

        *phase = phase.transition(TurnPhase::Executing)?;
        display.on_function_start(&name);
        info!(function = %name, call_id = %call_id, "Executing function");

        let result = match self.executor.execute(&name, &arguments).await {
            Ok(result) => result,
            Err(RegistryError::UnknownFunction(unknown)) => {
                context.push(Message::tool(
                    call_id,
                    ExecutionResult::failure(format!("Unknown function: {}", unknown))
                        .to_message_content(),
                ));
                return Err(RunTurnError::UnknownFunction(unknown));
            }
        };

        if !result.is_success() {
            warn!(
                function = %name,
                error = result.error().unwrap_or("unknown error"),
                "Function reported failure"
            );
        }
        self.log(
            "function_result",
            json!({ "function": name, "call_id": call_id, "result": result }),
        );
        display.on_function_result(&name, &result);
        context.push(Message::tool(call_id, result.to_message_content()));

        *phase = phase.transition(TurnPhase::AwaitingFinalAnswer)?;
        let request = ChatRequest::unforced(context.messages().to_vec());
        let reply = self
            .stream_response(&request, ReplyKind::Summary, display)
            .await?;
        context.push(Message::assistant(reply.content.clone()));
        self.log("assistant_message", json!({ "content": reply.content }));
        *phase = phase.transition(TurnPhase::Done)?;

        Ok(TurnOutcome::Executed {
            function: name,
            result,
            summary: reply.content,
        })
    }

    async fn acknowledge_cancellation(
        &self,
        context: &mut ConversationContext,
        display: &dyn TurnDisplay,
        phase: &mut TurnPhase,
        call_id: &str,
        name: String,
    ) -> Result<TurnOutcome, RunTurnError> {
        *phase = phase.transition(TurnPhase::Cancelled)?;
        info!(function = %name, "Operator declined; function not executed");
        display.on_cancelled(&name);

        context.push(Message::tool(
            call_id,
            ExecutionResult::failure("Operation cancelled by the user").to_message_content(),
        ));
        context.push(Message::user(self.params.cancellation_message.clone()));

        *phase = phase.transition(TurnPhase::AwaitingFinalAnswer)?;
        let request = ChatRequest::unforced(context.messages().to_vec());
        let reply = self
            .stream_response(&request, ReplyKind::Acknowledgement, display)
            .await?;
        context.push(Message::assistant(reply.content.clone()));
        self.log("assistant_message", json!({ "content": reply.content }));
        *phase = phase.transition(TurnPhase::Done)?;

        Ok(TurnOutcome::Cancelled {
            function: name,
            acknowledgement: reply.content,
        })
    }

    /// Ask the operator, applying the configured timeout (timeout = cancel).
    async fn ask_confirmation(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationDecision, RunTurnError> {
        let ask = async {
            let answer = match self.params.confirmation_timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.confirmation.confirm(request)).await {
                        Ok(answer) => answer,
                        Err(_) => {
                            warn!(
                                function = %request.function_name,
                                timeout = ?limit,
                                "Confirmation timed out; cancelling"
                            );
                            Ok(ConfirmationDecision::Cancel)
                        }
                    }
                }
                None => self.confirmation.confirm(request).await,
            };
            answer.map_err(RunTurnError::from)
        };
        self.cancellable(ask).await
    }

    /// Stream one completion through the decision decoder, forwarding visible
    /// text to the display as it arrives.
    ///
    /// A stream that errors or closes before completing fails the turn; the
    /// partial response is discarded.
    async fn stream_response(
        &self,
        request: &ChatRequest,
        kind: ReplyKind,
        display: &dyn TurnDisplay,
    ) -> Result<StreamedResponse, RunTurnError> {
        let handle = self
            .cancellable(async {
                self.gateway
                    .stream_chat(request)
                    .await
                    .map_err(RunTurnError::from)
            })
            .await?;
        let mut receiver = handle.receiver;
        let mut decoder = DecisionStreamDecoder::new();

        display.on_reply_start(kind);

        loop {
            let event = if let Some(ref token) = self.cancellation_token {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        display.on_reply_end();
                        return Err(RunTurnError::Cancelled);
                    }
                    event = receiver.recv() => event,
                }
            } else {
                receiver.recv().await
            };

            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    if let Some(visible) = decoder.on_content(&chunk) {
                        display.on_reply_chunk(&visible);
                    }
                }
                Some(StreamEvent::ToolCallDelta {
                    index,
                    id,
                    name,
                    arguments_delta,
                }) => {
                    let visible = decoder.on_tool_call(
                        index,
                        id.as_deref(),
                        name.as_deref(),
                        arguments_delta.as_deref(),
                    );
                    if let Some(visible) = visible {
                        display.on_reply_chunk(&visible);
                    }
                }
                Some(StreamEvent::Completed { finish_reason }) => {
                    debug!(?finish_reason, "Stream completed");
                    break;
                }
                Some(StreamEvent::Error(e)) => {
                    display.on_reply_end();
                    return Err(GatewayError::StreamInterrupted(e).into());
                }
                None => {
                    display.on_reply_end();
                    return Err(GatewayError::StreamInterrupted(
                        "stream closed before completion".to_string(),
                    )
                    .into());
                }
            }
        }

        display.on_reply_end();
        Ok(decoder.finish())
    }

    async fn cancellable<T>(
        &self,
        fut: impl Future<Output = Result<T, RunTurnError>>,
    ) -> Result<T, RunTurnError> {
        match &self.cancellation_token {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(RunTurnError::Cancelled),
                    result = fut => result,
                }
            }
            None => fut.await,
        }
    }

    /// Keep the raw attempt in context, answering every call with the error.
    fn record_failed_decision(
        &self,
        context: &mut ConversationContext,
        response: &StreamedResponse,
        error: &DecisionDecodeError,
    ) {
        warn!(error = %error, "Could not decode decision");
        if response.tool_calls.is_empty() {
            if !response.content.is_empty() {
                context.push(Message::assistant(response.content.clone()));
            }
            return;
        }
        context.push(Message::assistant_with_tool_calls(
            response.content.clone(),
            response.tool_calls.clone(),
        ));
        let content = ExecutionResult::failure(format!("Decision decode error: {}", error))
            .to_message_content();
        for call in &response.tool_calls {
            context.push(Message::tool(&call.id, content.clone()));
        }
    }

    fn log(&self, event_type: &'static str, payload: Value) {
        self.conversation_logger
            .log(ConversationEvent::new(event_type, payload));
    }
}

/// Only the first call is acted on; the rest are told so.
fn answer_extra_calls(context: &mut ConversationContext, response: &StreamedResponse, handled: &str) {
    for call in response.tool_calls.iter().filter(|c| c.id != handled) {
        debug!(call_id = %call.id, "Ignoring extra tool call");
        context.push(Message::tool(
            &call.id,
            ExecutionResult::failure("Only one function call is handled per turn")
                .to_message_content(),
        ));
    }
}

fn decision_payload(decision: &Decision) -> Value {
    match decision {
        Decision::Respond { text } => json!({ "use_function": false, "response": text }),
        Decision::Invoke {
            function_name,
            arguments,
        } => json!({
            "use_function": true,
            "function_name": function_name,
            "arguments": arguments,
        }),
    }
}
