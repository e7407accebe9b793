//! Plain-text rendering of function calls and results.

use callgate_domain::{ExecutionResult, FunctionArguments, FunctionSchema};
use serde_json::Value;

/// `key: value` lines, one per argument, sorted by key.
pub fn format_arguments(arguments: &FunctionArguments) -> Vec<String> {
    arguments
        .iter()
        .map(|(key, value)| format!("{}: {}", key, format_value(value)))
        .collect()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// One-line summary of a result: the message if there is one, else the error
/// or the payload keys.
pub fn result_summary(result: &ExecutionResult) -> String {
    if let Some(error) = result.error() {
        return error.to_string();
    }
    if let Some(message) = result.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    result
        .payload
        .iter()
        .map(|(key, value)| format!("{}={}", key, format_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Row for `/functions`: `[w] name  description`.
pub fn function_row(schema: &FunctionSchema) -> String {
    let marker = if schema.is_write() { "w" } else { "r" };
    let description = schema
        .description
        .split(". Current time reference")
        .next()
        .unwrap_or_default();
    format!("[{}] {:<24} {}", marker, schema.name, description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callgate_domain::OperationType;
    use serde_json::json;

    #[test]
    fn test_arguments_are_listed_in_order() {
        let args = json!({"to_email": "a@example.com", "attendees": ["x@y.io", "z@y.io"], "is_html": false});
        let lines = format_arguments(args.as_object().unwrap());
        assert!(lines.contains(&"to_email: a@example.com".to_string()));
        assert!(lines.contains(&"attendees: x@y.io, z@y.io".to_string()));
        assert!(lines.contains(&"is_html: false".to_string()));
    }

    #[test]
    fn test_result_summary_prefers_message() {
        let sent = ExecutionResult::success().with_field("message", "Email sent successfully to a@b.co");
        assert_eq!(result_summary(&sent), "Email sent successfully to a@b.co");

        let balance = ExecutionResult::success().with_field("asset", "BTC");
        assert_eq!(result_summary(&balance), "asset=BTC");

        let failed = ExecutionResult::failure("Invalid email address format");
        assert_eq!(result_summary(&failed), "Invalid email address format");
    }

    #[test]
    fn test_function_row_drops_time_reference() {
        let schema = FunctionSchema::new(
            "list_calendar_events",
            "Lists your upcoming calendar events. Current time reference: 2024-01-01T00:00:00+00:00 (UTC)",
            OperationType::Read,
        );
        let row = function_row(&schema);
        assert!(row.starts_with("[r] list_calendar_events"));
        assert!(row.ends_with("Lists your upcoming calendar events"));
    }
}
