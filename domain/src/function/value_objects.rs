//! Function execution result
//!
//! [`ExecutionResult`] is the only thing a function unit hands back. A failed
//! execution is still a normal value (`success = false`) so the turn loop can
//! forward it to the model without special-casing.
//!
//! Serialized form flattens the payload next to `success` / `error`:
//!
//! ```text
//! {"success": true, "asset": "BTC", "balance": 0.42}
//! {"success": false, "error": "Failed to fetch BTC balance"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ExecutionResult {
    /// Successful result with an empty payload.
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            payload: Map::new(),
        }
    }

    /// Successful result carrying `payload`.
    ///
    /// Reserved keys (`success`, `error`) in the payload are dropped.
    pub fn success_with(payload: Map<String, Value>) -> Self {
        let mut result = Self::success();
        for (key, value) in payload {
            result = result.with_field(key, value);
        }
        result
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            payload: Map::new(),
        }
    }

    /// Attach a payload field. `success` and `error` are reserved and ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "success" && key != "error" {
            self.payload.insert(key, value.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// JSON text placed into the conversation as the tool message content.
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // Map<String, Value> always serializes; keep a readable fallback anyway
            format!("{{\"success\":{}}}", self.success)
        })
    }
}
