//! Validate tool call arguments against JSON Schema before execution.

use thiserror::Error;

/// A tool call whose arguments do not satisfy the tool's schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected object arguments, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' expected type '{expected}', got {actual}")]
    WrongType {
        field: String,
        expected: String,
        actual: &'static str,
    },

    #[error("field '{field}' must be >= {minimum}")]
    BelowMinimum { field: String, minimum: f64 },
}

/// Validate tool arguments against a JSON Schema.
///
/// Top-level only: object type, required fields, per-property `type` and
/// numeric `minimum`. Returns the first violation found.
pub fn validate_arguments(
    args: &serde_json::Value,
    schema: &serde_json::Value,
) -> Result<(), ValidationError> {
    if schema.get("type").and_then(|v| v.as_str()) == Some("object") && !args.is_object() {
        return Err(ValidationError::NotAnObject(json_type_name(args)));
    }

    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for name in required.iter().filter_map(|f| f.as_str()) {
            if !obj.contains_key(name) {
                return Err(ValidationError::MissingField(name.to_string()));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) else {
        return Ok(());
    };

    for (key, value) in obj {
        let Some(prop_schema) = properties.get(key) else {
            continue;
        };
        if let Some(expected) = prop_schema.get("type").and_then(|v| v.as_str()) {
            if !value_matches_type(value, expected) {
                return Err(ValidationError::WrongType {
                    field: key.clone(),
                    expected: expected.to_string(),
                    actual: json_type_name(value),
                });
            }
        }
        if let (Some(minimum), Some(n)) = (
            prop_schema.get("minimum").and_then(|v| v.as_f64()),
            value.as_f64(),
        ) {
            if n < minimum {
                return Err(ValidationError::BelowMinimum {
                    field: key.clone(),
                    minimum,
                });
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fetch_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string" },
                "page_num": { "type": "integer", "minimum": 0 },
            },
            "required": ["url"],
        })
    }

    #[test]
    fn rejects_non_object_args_when_schema_expects_object() {
        let err = validate_arguments(&json!("https://example.com"), &fetch_schema()).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject("string"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = validate_arguments(&json!({ "page_num": 1 }), &fetch_schema()).unwrap_err();
        assert_eq!(err.to_string(), "missing required field 'url'");
    }

    #[test]
    fn rejects_field_with_wrong_type() {
        let err = validate_arguments(
            &json!({ "url": "https://example.com", "page_num": "two" }),
            &fetch_schema(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected type 'integer'"));
    }

    #[test]
    fn rejects_float_for_integer_field() {
        let result = validate_arguments(
            &json!({ "url": "https://example.com", "page_num": 1.5 }),
            &fetch_schema(),
        );
        assert!(matches!(result, Err(ValidationError::WrongType { .. })));
    }

    #[test]
    fn rejects_value_below_minimum() {
        let err = validate_arguments(
            &json!({ "url": "https://example.com", "page_num": -1 }),
            &fetch_schema(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "field 'page_num' must be >= 0");
        assert_eq!(
            err,
            ValidationError::BelowMinimum {
                field: "page_num".into(),
                minimum: 0.0,
            }
        );
    }

    #[test]
    fn accepts_optional_field_when_absent() {
        assert!(validate_arguments(&json!({ "url": "https://example.com" }), &fetch_schema()).is_ok());
    }

    #[test]
    fn accepts_extra_fields_not_in_schema_properties() {
        let args = json!({ "url": "https://example.com", "extra": true });
        assert!(validate_arguments(&args, &fetch_schema()).is_ok());
    }

    #[test]
    fn accepts_anything_when_schema_is_empty() {
        assert!(validate_arguments(&serde_json::Value::Null, &json!({})).is_ok());
        assert!(validate_arguments(&json!({ "anything": 42 }), &json!({})).is_ok());
    }
}
