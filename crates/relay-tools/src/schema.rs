//! Argument validation against tool parameter schemas.
//!
//! [`validate_arguments`] is a pure function run before every dispatch.
//! If it fails, the handler never runs — the caller gets a
//! [`ToolError::SchemaViolation`] describing the first mismatch.
//!
//! Covers the subset of JSON Schema the tool definitions use: required
//! properties, primitive types (`string`, `number`, `integer`, `boolean`,
//! `array`, `object`), and string `enum`s.

use serde_json::{Map, Value};
use relay_core::tools::ToolParameterSchema;

use crate::errors::ToolError;

/// Validate `arguments` against `schema`.
///
/// Properties not described by the schema are ignored; described
/// properties must match their declared type.
pub fn validate_arguments(
    schema: &ToolParameterSchema,
    arguments: &Map<String, Value>,
) -> Result<(), ToolError> {
    if schema.schema_type != "object" {
        return Ok(());
    }

    if let Some(required) = &schema.required {
        for key in required {
            if !arguments.contains_key(key) {
                return Err(ToolError::SchemaViolation {
                    message: format!("missing required property: {key}"),
                });
            }
        }
    }

    if let Some(properties) = &schema.properties {
        for (key, value) in arguments {
            let Some(spec) = properties.get(key) else {
                continue;
            };
            check_property(key, value, spec)?;
        }
    }

    Ok(())
}

fn check_property(key: &str, value: &Value, spec: &Value) -> Result<(), ToolError> {
    if let Some(expected) = spec.get("type").and_then(Value::as_str) {
        if !type_matches(expected, value) {
            return Err(ToolError::SchemaViolation {
                message: format!(
                    "property {key} expected type {expected}, got {}",
                    type_name(value)
                ),
            });
        }
    }

    if let Some(allowed) = spec.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            return Err(ToolError::SchemaViolation {
                message: format!("property {key} is not one of the allowed values"),
            });
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
