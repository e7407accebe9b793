//! Confirmation port for state-mutating functions.
//!
//! Before a write function runs, the turn loop asks the operator for an
//! explicit yes/no through this port.
//!
//! # Architecture
//!
//! Following the Ports and Adapters pattern:
//! - **Port**: [`ConfirmationPort`] - defined here in application layer
//! - **Adapter**: `InteractiveConfirmation` - implemented in presentation layer
//!
//! # Flow
//!
//! ```text
//! Decision: invoke create_order {...}
//!        ↓
//! requires_confirmation() == true
//!        ↓
//! ConfirmationPort::confirm()
//!        ↓
//! Proceed → execute      Cancel → model acknowledges, nothing runs
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveConfirmation`] - Always proceeds (`--yes`)
//! - [`AutoRejectConfirmation`] - Always cancels

use async_trait::async_trait;
use callgate_domain::{FunctionArguments, OperationType};
use thiserror::Error;

/// What the operator is asked to approve.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationRequest {
    pub function_name: String,
    pub operation_type: OperationType,
    pub arguments: FunctionArguments,
}

/// The operator's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationDecision {
    Proceed,
    Cancel,
}

impl ConfirmationDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, ConfirmationDecision::Proceed)
    }
}

/// Failures while asking, not decisions made by the operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Confirmation prompt closed")]
    Closed,
}

#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    /// Block until the operator answers.
    async fn confirm(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationDecision, ConfirmationError>;
}

/// Approves everything. Used for non-interactive runs.
pub struct AutoApproveConfirmation;

#[async_trait]
impl ConfirmationPort for AutoApproveConfirmation {
    async fn confirm(
        &self,
        _request: &ConfirmationRequest,
    ) -> Result<ConfirmationDecision, ConfirmationError> {
        Ok(ConfirmationDecision::Proceed)
    }
}

/// Declines everything.
pub struct AutoRejectConfirmation;

#[async_trait]
impl ConfirmationPort for AutoRejectConfirmation {
    async fn confirm(
        &self,
        _request: &ConfirmationRequest,
    ) -> Result<ConfirmationDecision, ConfirmationError> {
        Ok(ConfirmationDecision::Cancel)
    }
}
