//! Scalar type coercion for parameter values.
//!
//! Path, query, header and cookie values arrive as strings. Before they are
//! checked, each value whose type does not match its schema is converted to
//! the first declared type it can represent:
//!
//! | target    | accepted input                                        |
//! |-----------|-------------------------------------------------------|
//! | `number`  | numeric string, `true`/`false` (1/0), `null` (0)      |
//! | `integer` | integral numeric string, `true`/`false`, `null`       |
//! | `boolean` | `"true"`/`"false"`, `1`/`0`, `null` (false)           |
//! | `null`    | `""`, `0`, `false`                                    |
//! | `string`  | numbers, booleans, `null` (`""`)                      |
//!
//! Values that cannot be converted are left alone and fail the type check.
//! Coercion descends through `properties`, schema-valued
//! `additionalProperties` and object-valued `items`.

use serde_json::{Map, Number, Value};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Coerce `value` in place to match `schema`.
pub fn coerce(schema: &Value, value: &mut Value) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    let types = declared_types(schema);
    if !types.is_empty() && !types.iter().any(|t| matches_type(t, value)) {
        if let Some(coerced) = types.iter().find_map(|t| coerce_scalar(value, t)) {
            *value = coerced;
        }
    }

    match value {
        Value::Object(map) => coerce_properties(schema, map),
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items").filter(|s| s.is_object()) {
                for item in items {
                    coerce(item_schema, item);
                }
            }
        }
        _ => {}
    }
}

fn coerce_properties(schema: &Map<String, Value>, map: &mut Map<String, Value>) {
    let properties = schema.get("properties").and_then(Value::as_object);
    let additional = schema
        .get("additionalProperties")
        .filter(|s| s.is_object());

    for (key, child) in map.iter_mut() {
        let child_schema = properties.and_then(|p| p.get(key)).or(additional);
        if let Some(child_schema) = child_schema {
            coerce(child_schema, child);
        }
    }
}

fn declared_types(schema: &Map<String, Value>) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn matches_type(name: &str, value: &Value) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.as_f64().is_some_and(|n| n.fract() == 0.0),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => false,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Build a JSON number, preferring an integer representation when exact.
#[allow(clippy::cast_possible_truncation)]
fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Some(Value::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number)
    }
}

fn bool_number(b: bool) -> Value {
    Value::from(i64::from(b))
}

fn coerce_scalar(value: &Value, target: &str) -> Option<Value> {
    match (target, value) {
        ("number", Value::String(s)) => parse_number(s).and_then(number_value),
        ("integer", Value::String(s)) => parse_number(s)
            .filter(|n| n.fract() == 0.0)
            .and_then(number_value),
        ("number" | "integer", Value::Bool(b)) => Some(bool_number(*b)),
        ("number" | "integer", Value::Null) => Some(Value::from(0)),

        ("boolean", Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Number(n)) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(Value::Bool(true)),
            Some(x) if x == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Null) => Some(Value::Bool(false)),

        ("null", Value::String(s)) if s.is_empty() => Some(Value::Null),
        ("null", Value::Number(n)) if n.as_f64() == Some(0.0) => Some(Value::Null),
        ("null", Value::Bool(false)) => Some(Value::Null),

        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        ("string", Value::Null) => Some(Value::String(String::new())),

        _ => None,
    }
}
