//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Function '{0}' is already registered")]
    DuplicateFunction(String),

    #[error("Invalid schema for function '{function}': {reason}")]
    InvalidSchema { function: String, reason: String },

    #[error("Invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_function_display() {
        let error = DomainError::DuplicateFunction("get_balance".to_string());
        assert_eq!(
            error.to_string(),
            "Function 'get_balance' is already registered"
        );
    }

    #[test]
    fn test_invalid_schema_display() {
        let error = DomainError::InvalidSchema {
            function: "send_email".to_string(),
            reason: "name must not be empty".to_string(),
        };
        assert!(error.to_string().contains("send_email"));
        assert!(error.to_string().contains("name must not be empty"));
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::DuplicateFunction("x".to_string()).is_cancelled());
    }
}
