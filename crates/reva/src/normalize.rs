//! Request value normalization.
//!
//! Turns the raw request pieces into the per-location values checked against
//! the synthesized schemas: case-folded headers, parsed cookies and decoded
//! JSON-encoded parameters.

use serde_json::{Map, Value};

use crate::model::{Location, RevaRequest};
use crate::synth::LocationSchema;

/// Request headers with every key lower-cased.
///
/// Keys differing only by case collapse into one entry; the last one wins.
#[must_use]
pub fn lowercase_keys(headers: &Map<String, Value>) -> Map<String, Value> {
    headers
        .iter()
        .map(|(key, value)| (key.to_lowercase(), value.clone()))
        .collect()
}

/// Parse a `Cookie` header into `name → value` pairs.
///
/// Pairs are separated by `;`. Each pair splits on its first `=`, so values
/// may contain `=`. A pair without `=` maps to an empty value. An absent or
/// empty header yields an empty map.
#[must_use]
pub fn parse_cookies(header: Option<&str>) -> Map<String, Value> {
    let Some(header) = header else {
        return Map::new();
    };

    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.trim().to_string(), Value::String(value.to_string()))
        })
        .collect()
}

/// Decode a JSON-encoded value. Non-strings pass through; strings that are
/// not valid JSON become `{}` so the schema check reports the real problem
/// (typically a missing required field) instead of a parse error.
#[must_use]
pub fn decode_json(value: &Value) -> Value {
    match value {
        Value::String(raw) => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Map::new()))
        }
        other => other.clone(),
    }
}

/// Decode the values in `values` that `schema` marks as JSON-encoded.
fn decode_json_properties(
    values: &Map<String, Value>,
    schema: &LocationSchema,
) -> Map<String, Value> {
    values
        .iter()
        .map(|(key, value)| {
            let value = if schema.expects_json(key) {
                decode_json(value)
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}

/// Decode only values of `content` parameters; everything else is passed
/// through exactly as the caller parsed it.
fn decode_content_properties(
    values: &Map<String, Value>,
    schema: &LocationSchema,
) -> Map<String, Value> {
    values
        .iter()
        .map(|(key, value)| {
            let value = if schema.json_encoded.iter().any(|k| k == key) {
                decode_json(value)
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}

/// The value of one location, shaped for its synthesized schema.
///
/// `headers` must already be lower-cased (see [`lowercase_keys`]).
#[must_use]
pub fn location_value(
    location: Location,
    schema: &LocationSchema,
    request: &RevaRequest,
    headers: &Map<String, Value>,
) -> Map<String, Value> {
    match location {
        Location::Header => decode_json_properties(headers, schema),
        Location::Path => decode_content_properties(&request.path_parameters, schema),
        Location::Query => decode_content_properties(&request.query_parameters, schema),
        Location::Cookie => {
            let cookies = parse_cookies(headers.get("cookie").and_then(Value::as_str));
            decode_json_properties(&cookies, schema)
        }
    }
}
