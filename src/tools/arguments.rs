//! Typed access to tool call arguments.

use crate::error::SiftError;

/// Wrapper around the JSON arguments of a tool call.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a required string argument.
    pub fn get_str(&self, key: &str) -> Result<&str, SiftError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SiftError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get a required integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, SiftError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| SiftError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Get an optional non-negative integer argument.
    ///
    /// Absent or `null` yields `Ok(None)`; a negative or non-integer value is an error.
    pub fn get_usize_opt(&self, key: &str) -> Result<Option<usize>, SiftError> {
        match self.value.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => v
                .as_u64()
                .map(|n| Some(n as usize))
                .ok_or_else(|| {
                    SiftError::InvalidArgument(format!(
                        "Argument {key} must be a non-negative integer"
                    ))
                }),
        }
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, SiftError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            SiftError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
