//! Assistant and confirmation settings (`[assistant]`, `[confirmation]`)

use callgate_application::TurnParams;
use callgate_application::config::turn_params::DEFAULT_CANCELLATION_MESSAGE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAssistantConfig {
    /// Optional system prompt placed at the head of the conversation.
    pub system_prompt: Option<String>,
    /// User message recorded when the operator declines an operation.
    pub cancellation_message: String,
}

impl Default for FileAssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            cancellation_message: DEFAULT_CANCELLATION_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfirmationConfig {
    /// Seconds to wait for a yes/no before cancelling. Unset waits forever.
    pub timeout_seconds: Option<u64>,
    /// Approve every write operation without asking.
    pub auto_approve: bool,
}

impl FileConfirmationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Build the turn loop parameters from the two sections.
pub fn turn_params(assistant: &FileAssistantConfig, confirmation: &FileConfirmationConfig) -> TurnParams {
    TurnParams::default()
        .with_confirmation_timeout(confirmation.timeout())
        .with_cancellation_message(assistant.cancellation_message.clone())
}
