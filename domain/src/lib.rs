//! Domain layer for callgate
//!
//! This crate contains the core types and algorithms of the assistant.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Function units
//!
//! A function unit is a named capability (place an order, send an email, ...)
//! described by a [`FunctionSchema`] and executed through [`FunctionUnit`].
//! Write operations require operator confirmation.
//!
//! ## Decision protocol
//!
//! Each turn starts with a forced call to a single meta-tool. The model
//! either answers directly (text wrapped in sentinels, shown live while it
//! streams) or picks a function and its arguments. See [`decision`].

pub mod conversation;
pub mod core;
pub mod decision;
pub mod function;
pub mod session;
pub mod turn;
pub mod util;

// Re-export commonly used types
pub use conversation::{
    context::ConversationContext,
    entities::{Message, Role, ToolCallRecord, ToolDefinition},
};
pub use core::error::DomainError;
pub use decision::{
    DECISION_TOOL_NAME, END_SENTINEL, START_SENTINEL,
    accumulator::{DecisionStreamDecoder, StreamedResponse, ToolCallAccumulator},
    entities::{Decision, DecisionDecodeError, DecisionPayload},
    escape::JsonStringUnescaper,
    protocol::DecisionProtocol,
    sentinel::{SentinelDemux, SentinelState},
};
pub use function::{
    entities::{FunctionArguments, FunctionSchema, OperationType},
    unit::FunctionUnit,
    validation::{ArgumentError, ArgumentValidator, DefaultArgumentValidator},
    value_objects::ExecutionResult,
};
pub use session::stream::StreamEvent;
pub use turn::entities::{TurnOutcome, TurnPhase};
