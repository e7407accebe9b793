//! Argument validation against a [`FunctionSchema`]
//!
//! Pure checks, no I/O. The validator returns the normalized argument map
//! (defaults filled in, explicit `null` on optional keys dropped) so units
//! can assume every declared default is present.

use serde_json::Value;
use thiserror::Error;

use super::entities::{FunctionArguments, FunctionSchema};

/// Why a set of arguments does not satisfy a schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("Missing required parameter '{parameter}' for function '{function}'")]
    MissingRequired { function: String, parameter: String },

    #[error("Unknown parameter '{parameter}' for function '{function}'")]
    UnknownParameter { function: String, parameter: String },

    #[error("Parameter '{parameter}' must be of type {expected}, got {found}")]
    TypeMismatch {
        parameter: String,
        expected: String,
        found: String,
    },

    #[error("Parameter '{parameter}' must be one of {allowed}, got {found}")]
    NotAllowed {
        parameter: String,
        allowed: String,
        found: String,
    },

    #[error("Parameter '{parameter}' is out of range: {reason}")]
    OutOfRange { parameter: String, reason: String },
}

/// Validator for function arguments
pub trait ArgumentValidator {
    /// Validate `args` against `schema`, returning the normalized map.
    fn validate(
        &self,
        schema: &FunctionSchema,
        args: &FunctionArguments,
    ) -> Result<FunctionArguments, ArgumentError>;
}

/// Checks required keys, undeclared keys, primitive `type` (including unions),
/// `enum`, and numeric `minimum`/`maximum`, then applies `default`s.
#[derive(Debug, Clone, Default)]
pub struct DefaultArgumentValidator;

impl ArgumentValidator for DefaultArgumentValidator {
    fn validate(
        &self,
        schema: &FunctionSchema,
        args: &FunctionArguments,
    ) -> Result<FunctionArguments, ArgumentError> {
        let mut normalized = FunctionArguments::new();

        for (key, value) in args {
            let Some(property) = schema.parameter(key) else {
                if schema.additional_properties {
                    normalized.insert(key.clone(), value.clone());
                    continue;
                }
                return Err(ArgumentError::UnknownParameter {
                    function: schema.name.clone(),
                    parameter: key.clone(),
                });
            };

            if value.is_null() && !schema.is_required(key) && !allows_null(property) {
                continue;
            }

            check_type(key, property, value)?;
            check_enum(key, property, value)?;
            check_range(key, property, value)?;
            normalized.insert(key.clone(), value.clone());
        }

        for key in &schema.required {
            if !normalized.contains_key(key) {
                return Err(ArgumentError::MissingRequired {
                    function: schema.name.clone(),
                    parameter: key.clone(),
                });
            }
        }

        for (key, property) in &schema.parameters {
            if normalized.contains_key(key) {
                continue;
            }
            if let Some(default) = property.get("default") {
                normalized.insert(key.clone(), default.clone());
            }
        }

        Ok(normalized)
    }
}

fn declared_types(property: &Value) -> Vec<&str> {
    match property.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn allows_null(property: &Value) -> bool {
    declared_types(property).contains(&"null")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "string" => value.is_string(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        // Unknown type keywords are not enforced
        _ => true,
    }
}

fn check_type(key: &str, property: &Value, value: &Value) -> Result<(), ArgumentError> {
    let types = declared_types(property);
    if types.is_empty() || types.iter().any(|t| matches_type(t, value)) {
        return Ok(());
    }
    Err(ArgumentError::TypeMismatch {
        parameter: key.to_string(),
        expected: types.join(" | "),
        found: json_type_name(value).to_string(),
    })
}

fn check_enum(key: &str, property: &Value, value: &Value) -> Result<(), ArgumentError> {
    let Some(Value::Array(allowed)) = property.get("enum") else {
        return Ok(());
    };
    if allowed.contains(value) {
        return Ok(());
    }
    Err(ArgumentError::NotAllowed {
        parameter: key.to_string(),
        allowed: Value::Array(allowed.clone()).to_string(),
        found: value.to_string(),
    })
}

fn check_range(key: &str, property: &Value, value: &Value) -> Result<(), ArgumentError> {
    let Some(n) = value.as_f64() else {
        return Ok(());
    };
    if let Some(min) = property.get("minimum").and_then(Value::as_f64)
        && n < min
    {
        return Err(ArgumentError::OutOfRange {
            parameter: key.to_string(),
            reason: format!("{} is below minimum {}", n, min),
        });
    }
    if let Some(max) = property.get("maximum").and_then(Value::as_f64)
        && n > max
    {
        return Err(ArgumentError::OutOfRange {
            parameter: key.to_string(),
            reason: format!("{} is above maximum {}", n, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::entities::OperationType;
    use serde_json::json;

    fn order_schema() -> FunctionSchema {
        FunctionSchema::new("create_order", "Create an order", OperationType::Write)
            .with_required_parameter("action", json!({"type": "string", "enum": ["buy", "sell"]}))
            .with_required_parameter("amountInDollars", json!({"type": ["number", "string"]}))
            .with_required_parameter("asset", json!({"type": "string"}))
    }

    fn events_schema() -> FunctionSchema {
        FunctionSchema::new("list_calendar_events", "List events", OperationType::Read)
            .with_parameter(
                "max_results",
                json!({"type": "integer", "minimum": 1, "maximum": 100, "default": 10}),
            )
            .with_parameter("time_min", json!({"type": "string"}))
    }

    fn args(value: Value) -> FunctionArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_arguments_pass_through() {
        let out = DefaultArgumentValidator
            .validate(
                &order_schema(),
                &args(json!({"action": "sell", "amountInDollars": "all", "asset": "ETH"})),
            )
            .unwrap();
        assert_eq!(out["amountInDollars"], "all");
    }

    #[test]
    fn test_union_type_accepts_number() {
        let out = DefaultArgumentValidator.validate(
            &order_schema(),
            &args(json!({"action": "buy", "amountInDollars": 25.5, "asset": "BTC"})),
        );
        assert!(out.is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = DefaultArgumentValidator
            .validate(&order_schema(), &args(json!({"action": "buy", "asset": "BTC"})))
            .unwrap_err();
        assert!(matches!(err, ArgumentError::MissingRequired { ref parameter, .. } if parameter == "amountInDollars"));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let err = DefaultArgumentValidator
            .validate(
                &order_schema(),
                &args(json!({"action": "buy", "amountInDollars": 1, "asset": "BTC", "leverage": 10})),
            )
            .unwrap_err();
        assert!(matches!(err, ArgumentError::UnknownParameter { .. }));
    }

    #[test]
    fn test_enum_violation() {
        let err = DefaultArgumentValidator
            .validate(
                &order_schema(),
                &args(json!({"action": "short", "amountInDollars": 1, "asset": "BTC"})),
            )
            .unwrap_err();
        assert!(matches!(err, ArgumentError::NotAllowed { .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let err = DefaultArgumentValidator
            .validate(
                &order_schema(),
                &args(json!({"action": "buy", "amountInDollars": true, "asset": "BTC"})),
            )
            .unwrap_err();
        assert!(err.to_string().contains("number | string"));
    }

    #[test]
    fn test_defaults_are_applied() {
        let out = DefaultArgumentValidator
            .validate(&events_schema(), &FunctionArguments::new())
            .unwrap();
        assert_eq!(out["max_results"], 10);
        assert!(!out.contains_key("time_min"));
    }

    #[test]
    fn test_null_optional_is_dropped_then_defaulted() {
        let out = DefaultArgumentValidator
            .validate(&events_schema(), &args(json!({"max_results": null, "time_min": null})))
            .unwrap();
        assert_eq!(out["max_results"], 10);
        assert!(!out.contains_key("time_min"));
    }

    #[test]
    fn test_range_checked() {
        let err = DefaultArgumentValidator
            .validate(&events_schema(), &args(json!({"max_results": 500})))
            .unwrap_err();
        assert!(matches!(err, ArgumentError::OutOfRange { .. }));
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let err = DefaultArgumentValidator
            .validate(&events_schema(), &args(json!({"max_results": 2.5})))
            .unwrap_err();
        assert!(matches!(err, ArgumentError::TypeMismatch { .. }));
    }
}
