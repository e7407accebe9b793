//! Decision entities

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::function::entities::FunctionArguments;

/// The structured choice made by the model at the start of a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer conversationally; no function runs.
    Respond { text: String },
    /// Invoke a registered function.
    Invoke {
        function_name: String,
        arguments: FunctionArguments,
    },
}

impl Decision {
    pub fn uses_function(&self) -> bool {
        matches!(self, Decision::Invoke { .. })
    }

    pub fn function_name(&self) -> Option<&str> {
        match self {
            Decision::Invoke { function_name, .. } => Some(function_name),
            Decision::Respond { .. } => None,
        }
    }
}

/// Wire form of the meta-tool arguments.
///
/// All four fields are always present; the branch not taken is `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub use_function: bool,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub function_arguments: Option<String>,
}

/// A structured decision that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionDecodeError {
    #[error("Decision is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Decision selects a function but names none")]
    MissingFunctionName,

    #[error("Decision selects '{0}' but carries no function_arguments")]
    MissingArguments(String),

    #[error("function_arguments for '{function}' is not valid JSON: {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("function_arguments for '{0}' is not a JSON object")]
    ArgumentsNotObject(String),

    #[error("Decision answers directly but carries no response")]
    MissingResponse,

    #[error("Response is missing its {0} marker")]
    UnterminatedResponse(&'static str),

    #[error("Decision populates both the response and the function branch")]
    AmbiguousDecision,

    #[error("Model returned no decision")]
    NoDecision,

    #[error("Model called unexpected tool '{0}' instead of the decision tool")]
    UnexpectedToolCall(String),

    #[error("Tool call #{second} started while call #{first} was still streaming its response")]
    InterleavedToolCalls { first: usize, second: usize },

    #[error("Stream ended early: {0}")]
    Truncated(String),
}
