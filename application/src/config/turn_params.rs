//! Turn parameters: orchestration loop control.
//!
//! [`TurnParams`] groups the static parameters of
//! [`RunTurnUseCase`](crate::use_cases::run_turn::RunTurnUseCase).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message appended on the operator's behalf when a confirmation is declined.
pub const DEFAULT_CANCELLATION_MESSAGE: &str =
    "I don't want to proceed with this operation. Please cancel it.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnParams {
    /// How long to wait for a yes/no before treating silence as "no".
    /// `None` waits indefinitely.
    pub confirmation_timeout: Option<Duration>,
    /// User message recorded when the operator declines.
    pub cancellation_message: String,
}

impl Default for TurnParams {
    fn default() -> Self {
        Self {
            confirmation_timeout: None,
            cancellation_message: DEFAULT_CANCELLATION_MESSAGE.to_string(),
        }
    }
}

impl TurnParams {
    pub fn with_confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_cancellation_message(mut self, message: impl Into<String>) -> Self {
        self.cancellation_message = message.into();
        self
    }
}
