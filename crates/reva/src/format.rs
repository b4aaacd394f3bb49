//! Human-readable error records.
//!
//! Turns [`RawError`]s into [`ValidationError`]s: one error per offending
//! property, dot-notation paths under a base path (`request.query.limit`),
//! a sentence-style message and, where a likely typo is detected, a
//! "Did you mean ...?" suggestion.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::{ErrorParams, RawError};

/// A single validation failure, ready to be returned to an API client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dot-notation location, e.g. `request.body.owner.email`.
    pub path: String,

    /// Sentence describing the failure.
    pub message: String,

    /// Likely intended value, when the failure looks like a typo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Machine-readable details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
}

/// Machine-readable details of a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Failing keyword (`required`, `type`, ...) or `contentType`.
    #[serde(rename = "errorType")]
    pub error_type: String,

    /// Keyword-specific fields such as `allowedValues`.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ErrorContext {
    /// Context carrying only the error type.
    #[must_use]
    pub fn new(error_type: &str) -> Self {
        Self {
            error_type: error_type.to_string(),
            details: Map::new(),
        }
    }

    /// Add a detail field.
    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

/// Format raw validator output.
///
/// `data` and `schema` are the instance and schema that produced `raw`; they
/// are consulted for suggestions. `base_path` prefixes every path.
#[must_use]
pub fn format(
    raw: &[RawError],
    data: &Value,
    schema: &Value,
    base_path: &str,
) -> Vec<ValidationError> {
    single_error_per_property(raw)
        .into_iter()
        .map(|error| format_one(error, data, schema, base_path))
        .collect()
}

/// Ranking used when several errors point at the same property.
fn weight(error: &RawError) -> u8 {
    u8::from(error.keyword == "enum")
}

fn property_key(error: &RawError) -> String {
    let property = match &error.params {
        ErrorParams::Required { missing_property } => missing_property.as_str(),
        ErrorParams::AdditionalProperty { property } => property.as_str(),
        _ => "",
    };
    format!("{}{property}", error.instance_path)
}

/// Keep one error per property, preferring `enum` over `type`. Order follows
/// the first error reported for each property.
fn single_error_per_property(raw: &[RawError]) -> Vec<&RawError> {
    let mut kept: IndexMap<String, &RawError> = IndexMap::new();
    for error in raw {
        let key = property_key(error);
        match kept.get_mut(&key) {
            Some(existing) if weight(error) > weight(existing) => *existing = error,
            Some(_) => {}
            None => {
                kept.insert(key, error);
            }
        }
    }
    kept.into_values().collect()
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// `request.body` + `/owner/email` → `request.body.owner.email`.
fn dot_path(base_path: &str, pointer: &str) -> String {
    let mut path = base_path.to_string();
    for segment in pointer.split('/').skip(1) {
        path.push('.');
        path.push_str(&unescape(segment));
    }
    path
}

fn last_segment(pointer: &str) -> Option<String> {
    pointer
        .rsplit_once('/')
        .map(|(_, segment)| unescape(segment))
}

fn clean_message(message: &str) -> String {
    message.replace('"', "'")
}

fn format_one(error: &RawError, data: &Value, schema: &Value, base_path: &str) -> ValidationError {
    let path = dot_path(base_path, &error.instance_path);
    let prop = last_segment(&error.instance_path);
    let context = ErrorContext::new(&error.keyword);

    let (message, suggestion, context) = match &error.params {
        ErrorParams::Required { missing_property } => (
            format!("{path} must have required property '{missing_property}'"),
            None,
            context,
        ),
        ErrorParams::AdditionalProperty { property } => {
            let candidates = declared_properties(schema, &error.schema_path);
            (
                format!("'{property}' property is not expected to be here"),
                suggest(property, &candidates).map(|s| format!("Did you mean property '{s}'?")),
                context,
            )
        }
        ErrorParams::Type { expected } => (
            match &prop {
                Some(prop) => format!("'{prop}' property type must be {expected}"),
                None => format!("{path} must be {expected}"),
            },
            None,
            context,
        ),
        ErrorParams::Enum { allowed_values } => {
            let candidates: Vec<String> = allowed_values.iter().map(display_value).collect();
            let suggestion = data
                .pointer(&error.instance_path)
                .and_then(Value::as_str)
                .and_then(|value| suggest(value, &candidates))
                .map(|s| format!("Did you mean '{s}'?"));
            (
                match &prop {
                    Some(prop) => {
                        format!("'{prop}' property must be equal to one of the allowed values")
                    }
                    None => format!("{path} must be equal to one of the allowed values"),
                },
                suggestion,
                context.with("allowedValues", Value::Array(allowed_values.clone())),
            )
        }
        ErrorParams::Const { allowed_value } => (
            match &prop {
                Some(prop) => format!("'{prop}' property must be equal to the allowed value"),
                None => format!("{path} must be equal to the allowed value"),
            },
            None,
            context.with("allowedValue", allowed_value.clone()),
        ),
        ErrorParams::Other => (
            match &prop {
                Some(prop) => format!("property '{prop}' {}", clean_message(&error.message)),
                None => format!("{path} {}", clean_message(&error.message)),
            },
            None,
            context,
        ),
    };

    ValidationError {
        path,
        message,
        suggestion,
        context: Some(context),
    }
}

/// Property names declared next to the failing `additionalProperties`.
fn declared_properties(schema: &Value, schema_path: &str) -> Vec<String> {
    let parent = schema_path
        .strip_suffix("/additionalProperties")
        .unwrap_or(schema_path);
    schema
        .pointer(&format!("{parent}/properties"))
        .and_then(Value::as_object)
        .map(|properties| properties.keys().cloned().collect())
        .unwrap_or_default()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Closest candidate to `value`, if it is close enough to be a typo.
fn suggest<'a>(value: &str, candidates: &'a [String]) -> Option<&'a str> {
    if value.is_empty() {
        return None;
    }
    let (best, distance) = candidates
        .iter()
        .map(|candidate| (candidate, levenshtein(value, candidate)))
        .min_by_key(|(_, distance)| *distance)?;
    (distance < value.chars().count()).then_some(best.as_str())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
