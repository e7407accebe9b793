//! Function domain entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments passed to a function, keyed by parameter name.
pub type FunctionArguments = Map<String, Value>;

/// Whether a function only observes external state or mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Observes state (balance lookup, listing events)
    Read,
    /// Mutates state (placing orders, sending email, creating events)
    Write,
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Read => "read",
            OperationType::Write => "write",
        }
    }

    /// Write operations go through the confirmation gate unless a unit
    /// overrides it.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, OperationType::Write)
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Schema describing one callable function.
///
/// `parameters` holds the JSON-schema-like `properties` map; `required`
/// lists the keys that must be present. [`parameter_schema`](Self::parameter_schema)
/// assembles both into the object schema handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    /// Unique function name (e.g., "get_balance")
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// Read or write
    pub operation_type: OperationType,
    /// Property name -> property schema
    pub parameters: Map<String, Value>,
    /// Required property names
    pub required: Vec<String>,
    /// Whether keys outside `parameters` are accepted
    #[serde(default)]
    pub additional_properties: bool,
}

impl FunctionSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        operation_type: OperationType,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            operation_type,
            parameters: Map::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }

    /// Add an optional parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.parameters.insert(name.into(), schema);
        self
    }

    /// Add a required parameter.
    pub fn with_required_parameter(mut self, name: impl Into<String>, schema: Value) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.parameters.insert(name, schema);
        self
    }

    pub fn is_write(&self) -> bool {
        self.operation_type == OperationType::Write
    }

    /// Schema of a single parameter, if declared.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// The full object schema for the function's arguments.
    pub fn parameter_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": self.parameters,
            "required": self.required,
            "additionalProperties": self.additional_properties,
        })
    }

    /// Structural checks applied at registration time.
    ///
    /// Names must be non-empty and limited to `[A-Za-z0-9_-]` (the charset
    /// accepted for tool names by chat completion APIs), every required key
    /// must be declared, and every property schema must be an object.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::InvalidSchema {
                function: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }

        if let Some(c) = self
            .name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(DomainError::InvalidSchema {
                function: self.name.clone(),
                reason: format!("name contains invalid character '{}'", c),
            });
        }

        for key in &self.required {
            if !self.parameters.contains_key(key) {
                return Err(DomainError::InvalidSchema {
                    function: self.name.clone(),
                    reason: format!("required parameter '{}' is not declared", key),
                });
            }
        }

        for (key, schema) in &self.parameters {
            if !schema.is_object() {
                return Err(DomainError::InvalidSchema {
                    function: self.name.clone(),
                    reason: format!("schema for parameter '{}' must be an object", key),
                });
            }
        }

        Ok(())
    }
}
