//! Run turn error types

use crate::ports::confirmation::ConfirmationError;
use crate::ports::llm_gateway::GatewayError;
use callgate_domain::{DecisionDecodeError, DomainError};
use thiserror::Error;

/// Why a turn ended without an outcome.
///
/// A function that runs and reports `success = false` is not an error; it
/// produces [`TurnOutcome::Executed`](callgate_domain::TurnOutcome::Executed).
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error("Provider error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Decision decode error: {0}")]
    Decode(#[from] DecisionDecodeError),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Confirmation failed: {0}")]
    Confirmation(#[from] ConfirmationError),

    #[error("Invalid turn state: {0}")]
    InvalidState(#[from] DomainError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RunTurnError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunTurnError::Cancelled)
    }
}
