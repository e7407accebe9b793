//! Turn display port.
//!
//! [`TurnDisplay`] is an **output port** the presentation layer implements to
//! render a turn as it happens: streamed reply text, the chosen function,
//! and its result.
//!
//! All methods have default no-op implementations, so implementers only
//! need to override the callbacks they care about.

use callgate_domain::{ExecutionResult, FunctionArguments};

/// Which inference call a reply stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// The forced decision call.
    Decision,
    /// The follow-up call after a function ran.
    Summary,
    /// The follow-up call after the operator declined.
    Acknowledgement,
}

pub trait TurnDisplay: Send + Sync {
    /// Called when a reply stream begins.
    fn on_reply_start(&self, _kind: ReplyKind) {}

    /// Called for each chunk of human-visible text.
    fn on_reply_chunk(&self, _chunk: &str) {}

    /// Called when a reply stream ends (normally or not).
    fn on_reply_end(&self) {}

    /// Called when the decision selects a function.
    fn on_function_selected(
        &self,
        _name: &str,
        _arguments: &FunctionArguments,
        _requires_confirmation: bool,
    ) {
    }

    /// Called right before a function runs.
    fn on_function_start(&self, _name: &str) {}

    /// Called after a function returns.
    fn on_function_result(&self, _name: &str, _result: &ExecutionResult) {}

    /// Called when the operator declines.
    fn on_cancelled(&self, _name: &str) {}
}

/// No-op display for tests and one-shot runs that only need the outcome.
pub struct NoDisplay;

impl TurnDisplay for NoDisplay {}
