//! `send_email`: deliver one message through the configured mailer.

use crate::services::{MailService, OutgoingEmail};
use async_trait::async_trait;
use callgate_domain::{ExecutionResult, FunctionArguments, FunctionSchema, FunctionUnit, OperationType};
use regex::Regex;
use serde_json::{Value, json};
use std::sync::{Arc, LazyLock};

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(address))
}

pub struct SendEmailFunction {
    mailer: Arc<dyn MailService>,
}

impl SendEmailFunction {
    pub fn new(mailer: Arc<dyn MailService>) -> Self {
        Self { mailer }
    }
}

fn string_arg(args: &FunctionArguments, key: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl FunctionUnit for SendEmailFunction {
    fn schema(&self) -> FunctionSchema {
        FunctionSchema::new(
            "send_email",
            "Send an email to a specified recipient",
            OperationType::Write,
        )
        .with_required_parameter(
            "to_email",
            json!({"type": "string", "description": "The recipient's email address"}),
        )
        .with_required_parameter(
            "subject",
            json!({"type": "string", "description": "The subject line of the email"}),
        )
        .with_required_parameter(
            "body",
            json!({
                "type": "string",
                "description": "The content of the email. Can include HTML formatting if is_html is true."
            }),
        )
        .with_parameter(
            "is_html",
            json!({
                "type": "boolean",
                "description": "Whether the body contains HTML formatting",
                "default": false
            }),
        )
    }

    async fn execute(&self, args: &FunctionArguments) -> ExecutionResult {
        let email = OutgoingEmail {
            to: string_arg(args, "to_email").trim().to_string(),
            subject: string_arg(args, "subject"),
            body: string_arg(args, "body"),
            is_html: args.get("is_html").and_then(Value::as_bool).unwrap_or(false),
        };

        if !is_valid_email(&email.to) {
            return ExecutionResult::failure("Invalid email address format");
        }

        match self.mailer.send(&email).await {
            Ok(()) => ExecutionResult::success()
                .with_field("message", format!("Email sent successfully to {}", email.to))
                .with_field(
                    "details",
                    json!({
                        "to": email.to,
                        "subject": email.subject,
                        "is_html": email.is_html,
                    }),
                ),
            Err(e) => ExecutionResult::failure(e.to_string()),
        }
    }
}
