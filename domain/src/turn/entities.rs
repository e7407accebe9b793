//! Turn entities

use crate::core::error::DomainError;
use crate::function::value_objects::ExecutionResult;

/// Phase of a single user turn.
///
/// ```text
/// AwaitingDecision ──▶ DirectAnswer ─────────────────────────────────▶ Done
///        │
///        ├──▶ AwaitingConfirmation ──▶ Confirmed ──▶ Executing ──┐
///        │            │                                           │
///        │            └──▶ Cancelled ──────────────┐              │
///        │                                          ▼              ▼
///        └──▶ Executing ─────────────────▶ AwaitingFinalAnswer ──▶ Done
///
/// any non-terminal phase ──▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingDecision,
    DirectAnswer,
    AwaitingConfirmation,
    Confirmed,
    Cancelled,
    Executing,
    AwaitingFinalAnswer,
    Done,
    Failed,
}

impl TurnPhase {
    pub fn as_str(&self) -> &str {
        match self {
            TurnPhase::AwaitingDecision => "awaiting_decision",
            TurnPhase::DirectAnswer => "direct_answer",
            TurnPhase::AwaitingConfirmation => "awaiting_confirmation",
            TurnPhase::Confirmed => "confirmed",
            TurnPhase::Cancelled => "cancelled",
            TurnPhase::Executing => "executing",
            TurnPhase::AwaitingFinalAnswer => "awaiting_final_answer",
            TurnPhase::Done => "done",
            TurnPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnPhase::Done | TurnPhase::Failed)
    }

    pub fn can_transition_to(&self, next: TurnPhase) -> bool {
        use TurnPhase::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (AwaitingDecision, DirectAnswer | AwaitingConfirmation | Executing) => true,
            (DirectAnswer, Done) => true,
            (AwaitingConfirmation, Confirmed | Cancelled) => true,
            (Confirmed, Executing) => true,
            (Executing | Cancelled, AwaitingFinalAnswer) => true,
            (AwaitingFinalAnswer, Done) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn transition(self, next: TurnPhase) -> Result<TurnPhase, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model answered directly.
    Answered { text: String },
    /// A function ran (successfully or not) and the model summarized it.
    Executed {
        function: String,
        result: ExecutionResult,
        summary: String,
    },
    /// The operator declined; the function never ran.
    Cancelled {
        function: String,
        acknowledgement: String,
    },
}

impl TurnOutcome {
    /// The assistant text that closed the turn.
    pub fn final_text(&self) -> &str {
        match self {
            TurnOutcome::Answered { text } => text,
            TurnOutcome::Executed { summary, .. } => summary,
            TurnOutcome::Cancelled {
                acknowledgement, ..
            } => acknowledgement,
        }
    }

    pub fn function(&self) -> Option<&str> {
        match self {
            TurnOutcome::Answered { .. } => None,
            TurnOutcome::Executed { function, .. } | TurnOutcome::Cancelled { function, .. } => {
                Some(function)
            }
        }
    }
}
