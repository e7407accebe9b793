//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section is optional; missing keys fall back to defaults.

mod assistant;
mod provider;
mod repl;
mod services;

pub use assistant::{FileAssistantConfig, FileConfirmationConfig, turn_params};
pub use provider::FileProviderConfig;
pub use repl::{FileLoggingConfig, FileReplConfig};
pub use services::{FileCalendarConfig, FileEmailConfig, FileExchangeConfig};

use callgate_application::TurnParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    ZeroValue { field: &'static str },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("calendar.default_timezone: unknown time zone '{0}'")]
    UnknownTimezone(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub provider: FileProviderConfig,
    pub assistant: FileAssistantConfig,
    pub confirmation: FileConfirmationConfig,
    pub exchange: FileExchangeConfig,
    pub email: FileEmailConfig,
    pub calendar: FileCalendarConfig,
    pub repl: FileReplConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        let non_empty = [
            ("provider.base_url", &self.provider.base_url),
            ("provider.model", &self.provider.model),
            ("exchange.base_url", &self.exchange.base_url),
            ("exchange.quote_currency", &self.exchange.quote_currency),
            ("email.smtp_server", &self.email.smtp_server),
            ("calendar.base_url", &self.calendar.base_url),
            ("calendar.calendar_id", &self.calendar.calendar_id),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                issues.push(ConfigValidationError::Empty { field });
            }
        }

        if self.provider.timeout_seconds == Some(0) {
            issues.push(ConfigValidationError::ZeroValue {
                field: "provider.timeout_seconds",
            });
        }
        if self.confirmation.timeout_seconds == Some(0) {
            issues.push(ConfigValidationError::ZeroValue {
                field: "confirmation.timeout_seconds",
            });
        }
        if self.email.smtp_port == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "email.smtp_port",
            });
        }
        if self
            .calendar
            .default_timezone
            .parse::<chrono_tz::Tz>()
            .is_err()
        {
            issues.push(ConfigValidationError::UnknownTimezone(
                self.calendar.default_timezone.clone(),
            ));
        }

        issues
    }

    pub fn turn_params(&self) -> TurnParams {
        turn_params(&self.assistant, &self.confirmation)
    }
}
