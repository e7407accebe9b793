//! Application layer for callgate
//!
//! This crate contains the turn use case, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::TurnParams;
pub use ports::{
    confirmation::{
        AutoApproveConfirmation, AutoRejectConfirmation, ConfirmationDecision, ConfirmationError,
        ConfirmationPort, ConfirmationRequest,
    },
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    display::{NoDisplay, ReplyKind, TurnDisplay},
    function_executor::{FunctionExecutorPort, RegistryError},
    llm_gateway::{ChatCompletionGateway, ChatRequest, GatewayError, StreamHandle, ToolChoice},
};
pub use use_cases::run_turn::{RunTurnError, RunTurnUseCase};
