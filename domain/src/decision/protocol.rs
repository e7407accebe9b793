//! Decision meta-tool construction and decoding
//!
//! ```text
//! registry snapshot ──build()──▶ ToolDefinition "use_function_decision"
//!                                   │ forced tool_choice
//!                                   ▼
//!                         streamed arguments JSON
//!                                   │
//!                 decode() ◀────────┘
//!                    │
//!         Decision::Respond | Decision::Invoke
//! ```
//!
//! The meta-tool is rebuilt from the current registry for every turn, so
//! schemas that embed the current time stay fresh.

use serde_json::{Map, Value, json};

use super::entities::{Decision, DecisionDecodeError, DecisionPayload};
use super::{DECISION_TOOL_NAME, END_SENTINEL, START_SENTINEL};
use crate::conversation::entities::ToolDefinition;
use crate::function::entities::FunctionSchema;

const TOOL_DESCRIPTION: &str = "Decide if a function is needed and which function to use. \
Analyze if the user's request requires a concrete action (like creating, listing, deleting \
something) or if it's just a question that can be answered directly.";

/// Builds, encodes and decodes the decision meta-tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionProtocol;

impl DecisionProtocol {
    /// Build the meta-tool for the given registry snapshot.
    ///
    /// `function_name` is restricted to the registered names; the full
    /// name → parameter schema map is embedded in the `function_arguments`
    /// description so the model can produce valid arguments.
    pub fn build(schemas: &[FunctionSchema]) -> ToolDefinition {
        let mut names: Vec<Value> = schemas.iter().map(|s| json!(s.name)).collect();
        names.push(Value::Null);

        let listing = schemas
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n");

        let parameter_map: Map<String, Value> = schemas
            .iter()
            .map(|s| (s.name.clone(), s.parameter_schema()))
            .collect();

        let parameters = json!({
            "type": "object",
            "properties": {
                "use_function": {
                    "type": "boolean",
                    "description": "If TRUE, the user's request requires a concrete action using one of the available functions. If FALSE, respond directly without executing any function."
                },
                "function_name": {
                    "type": ["string", "null"],
                    "enum": names,
                    "description": format!(
                        "ONLY if use_function is TRUE, choose which function best meets the user's needs. Otherwise null. Available functions:\n{}",
                        listing
                    )
                },
                "response": {
                    "type": ["string", "null"],
                    "description": format!(
                        "The response to the user's request. Only if use_function is FALSE, otherwise null. Insert a {START_SENTINEL} at the start of the response and a {END_SENTINEL} at the end of the response to indicate the start and the end of the response. Do not include a whitespace after the {START_SENTINEL} or before the {END_SENTINEL}."
                    )
                },
                "function_arguments": {
                    "type": ["string", "null"],
                    "description": format!(
                        "The arguments to pass to the function as a JSON-encoded object. Only if use_function is TRUE, otherwise null. Available functions and their parameters: {}",
                        Value::Object(parameter_map)
                    )
                }
            },
            "required": ["use_function", "function_name", "response", "function_arguments"],
            "additionalProperties": false
        });

        ToolDefinition {
            name: DECISION_TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            parameters,
            strict: true,
        }
    }

    /// Encode a decision as the meta-tool arguments string a model would emit.
    pub fn encode(decision: &Decision) -> String {
        let payload = match decision {
            Decision::Respond { text } => json!({
                "use_function": false,
                "function_name": null,
                "response": format!("{START_SENTINEL}{text}{END_SENTINEL}"),
                "function_arguments": null,
            }),
            Decision::Invoke {
                function_name,
                arguments,
            } => json!({
                "use_function": true,
                "function_name": function_name,
                "response": null,
                "function_arguments": Value::Object(arguments.clone()).to_string(),
            }),
        };
        payload.to_string()
    }

    /// Decode the raw meta-tool arguments string.
    ///
    /// Empty strings count as absent. Exactly one branch must be populated;
    /// anything else is an error, never a guess.
    pub fn decode(raw: &str) -> Result<Decision, DecisionDecodeError> {
        let payload: DecisionPayload = serde_json::from_str(raw)
            .map_err(|e| DecisionDecodeError::InvalidJson(e.to_string()))?;

        let function_name = non_empty(payload.function_name);
        let response = non_empty(payload.response);
        let function_arguments = non_empty(payload.function_arguments);

        if payload.use_function {
            if response.is_some() {
                return Err(DecisionDecodeError::AmbiguousDecision);
            }
            let function_name = function_name.ok_or(DecisionDecodeError::MissingFunctionName)?;
            let raw_args = function_arguments
                .ok_or_else(|| DecisionDecodeError::MissingArguments(function_name.clone()))?;
            let parsed: Value = serde_json::from_str(&raw_args).map_err(|e| {
                DecisionDecodeError::InvalidArguments {
                    function: function_name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let Value::Object(arguments) = parsed else {
                return Err(DecisionDecodeError::ArgumentsNotObject(function_name));
            };
            Ok(Decision::Invoke {
                function_name,
                arguments,
            })
        } else {
            if function_name.is_some() || function_arguments.is_some() {
                return Err(DecisionDecodeError::AmbiguousDecision);
            }
            let response = response.ok_or(DecisionDecodeError::MissingResponse)?;
            Ok(Decision::Respond {
                text: extract_between_sentinels(&response)?.to_string(),
            })
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// The text strictly between the first start sentinel and the end sentinel after it.
pub fn extract_between_sentinels(response: &str) -> Result<&str, DecisionDecodeError> {
    let start = response
        .find(START_SENTINEL)
        .ok_or(DecisionDecodeError::UnterminatedResponse("start"))?;
    let body = &response[start + START_SENTINEL.len_utf8()..];
    let end = body
        .find(END_SENTINEL)
        .ok_or(DecisionDecodeError::UnterminatedResponse("end"))?;
    Ok(&body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::entities::OperationType;

    fn schemas() -> Vec<FunctionSchema> {
        vec![
            FunctionSchema::new("get_balance", "Get a balance", OperationType::Read)
                .with_required_parameter("asset", json!({"type": "string"})),
            FunctionSchema::new("send_email", "Send an email", OperationType::Write)
                .with_required_parameter("to_email", json!({"type": "string"})),
        ]
    }

    #[test]
    fn test_build_restricts_function_names() {
        let tool = DecisionProtocol::build(&schemas());
        assert_eq!(tool.name, DECISION_TOOL_NAME);
        assert!(tool.strict);

        let props = &tool.parameters["properties"];
        assert_eq!(
            props["function_name"]["enum"],
            json!(["get_balance", "send_email", null])
        );
        assert_eq!(tool.parameters["additionalProperties"], false);
        assert_eq!(tool.parameters["required"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_build_embeds_listing_and_parameters() {
        let tool = DecisionProtocol::build(&schemas());
        let props = &tool.parameters["properties"];

        let name_desc = props["function_name"]["description"].as_str().unwrap();
        assert!(name_desc.contains("- get_balance: Get a balance"));
        assert!(name_desc.contains("- send_email: Send an email"));

        let args_desc = props["function_arguments"]["description"].as_str().unwrap();
        assert!(args_desc.contains("\"to_email\""));

        let response_desc = props["response"]["description"].as_str().unwrap();
        assert!(response_desc.contains(START_SENTINEL));
        assert!(response_desc.contains(END_SENTINEL));
    }

    #[test]
    fn test_invoke_round_trip() {
        let mut arguments = Map::new();
        arguments.insert("asset".to_string(), json!("BTC"));
        arguments.insert("amountInDollars".to_string(), json!(12.5));
        let decision = Decision::Invoke {
            function_name: "create_order".to_string(),
            arguments: arguments.clone(),
        };

        let decoded = DecisionProtocol::decode(&DecisionProtocol::encode(&decision)).unwrap();
        match decoded {
            Decision::Invoke {
                function_name,
                arguments: decoded_args,
            } => {
                assert_eq!(function_name, "create_order");
                assert_eq!(decoded_args, arguments);
            }
            other => panic!("expected Invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_respond_round_trip() {
        let decision = Decision::Respond {
            text: "Hello \"there\"\nfriend".to_string(),
        };
        let decoded = DecisionProtocol::decode(&DecisionProtocol::encode(&decision)).unwrap();
        assert_eq!(decoded, decision);
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let raw = r#"{"use_function":true,"function_name":"get_balance","response":"","function_arguments":"{\"asset\":\"BTC\"}"}"#;
        let decoded = DecisionProtocol::decode(raw).unwrap();
        assert_eq!(decoded.function_name(), Some("get_balance"));
    }

    #[test]
    fn test_both_branches_is_ambiguous() {
        let raw = r#"{"use_function":true,"function_name":"get_balance","response":"▓hi░","function_arguments":"{}"}"#;
        assert_eq!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::AmbiguousDecision)
        );

        let raw = r#"{"use_function":false,"function_name":"get_balance","response":"▓hi░","function_arguments":null}"#;
        assert_eq!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::AmbiguousDecision)
        );
    }

    #[test]
    fn test_neither_branch_fails() {
        let raw = r#"{"use_function":false,"function_name":null,"response":null,"function_arguments":null}"#;
        assert_eq!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::MissingResponse)
        );

        let raw = r#"{"use_function":true,"function_name":null,"response":null,"function_arguments":null}"#;
        assert_eq!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::MissingFunctionName)
        );
    }

    #[test]
    fn test_missing_sentinels() {
        let raw = r#"{"use_function":false,"function_name":null,"response":"no markers","function_arguments":null}"#;
        assert_eq!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::UnterminatedResponse("start"))
        );

        let raw = r#"{"use_function":false,"function_name":null,"response":"▓cut off","function_arguments":null}"#;
        assert_eq!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::UnterminatedResponse("end"))
        );
    }

    #[test]
    fn test_invalid_arguments() {
        let raw = r#"{"use_function":true,"function_name":"get_balance","response":null,"function_arguments":"{\"asset\":"}"#;
        assert!(matches!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::InvalidArguments { .. })
        ));

        let raw = r#"{"use_function":true,"function_name":"get_balance","response":null,"function_arguments":"[1,2]"}"#;
        assert_eq!(
            DecisionProtocol::decode(raw),
            Err(DecisionDecodeError::ArgumentsNotObject("get_balance".to_string()))
        );
    }

    #[test]
    fn test_truncated_json() {
        assert!(matches!(
            DecisionProtocol::decode(r#"{"use_function":false,"resp"#),
            Err(DecisionDecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_empty_registry_still_builds() {
        let tool = DecisionProtocol::build(&[]);
        assert_eq!(
            tool.parameters["properties"]["function_name"]["enum"],
            json!([null])
        );
    }
}
