//! Per-location schema synthesis.
//!
//! `OpenAPI` declares parameters one by one; JSON Schema validates whole
//! values. Each location's parameters are folded into one `type: object`
//! schema whose properties are the parameters, so a location's values can be
//! checked in a single pass.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::config::AdditionalParameters;
use crate::model::{Location, Parameter};

/// Synthesized `type: object` schema for one location (or a merged group).
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSchema {
    /// Required property keys, in declaration order.
    pub required: Vec<String>,

    /// Property key → parameter schema, in declaration order.
    pub properties: Map<String, Value>,

    /// Whether keys with no matching property are accepted.
    pub additional_properties: bool,

    /// Property keys whose raw values are JSON-encoded (`content` parameters).
    pub json_encoded: Vec<String>,
}

impl LocationSchema {
    /// An empty schema with the given additional-properties policy.
    #[must_use]
    pub fn new(additional_properties: bool) -> Self {
        Self {
            required: Vec::new(),
            properties: Map::new(),
            additional_properties,
            json_encoded: Vec::new(),
        }
    }

    /// Add (or replace) a property. A later parameter with the same key
    /// replaces the earlier schema in place.
    pub fn insert(&mut self, key: String, schema: Value, required: bool, json_encoded: bool) {
        if required && !self.required.contains(&key) {
            self.required.push(key.clone());
        }
        if json_encoded {
            if !self.json_encoded.contains(&key) {
                self.json_encoded.push(key.clone());
            }
        } else {
            self.json_encoded.retain(|k| k != &key);
        }
        self.properties.insert(key, schema);
    }

    /// Schema of a single property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Whether the value under `key` must be JSON-decoded before checking.
    ///
    /// True for `content` parameters and for properties declaring
    /// `type: object`, whose values always arrive as strings.
    #[must_use]
    pub fn expects_json(&self, key: &str) -> bool {
        self.json_encoded.iter().any(|k| k == key)
            || self
                .property(key)
                .is_some_and(|schema| declares_type(schema, "object"))
    }

    /// Render as a JSON Schema value.
    #[must_use]
    pub fn to_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": self.required,
            "properties": self.properties,
            "additionalProperties": self.additional_properties,
        })
    }
}

/// Whether `schema` declares `type: <name>` (or lists it in a type array).
#[must_use]
pub fn declares_type(schema: &Value, name: &str) -> bool {
    match schema.get("type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

/// Build one [`LocationSchema`] per location that declares at least one
/// parameter with a usable schema.
///
/// Parameters without `schema` or `content["application/json"].schema` are
/// skipped. A location with no usable parameters gets no entry and is not
/// validated at all.
pub fn synthesize<'a>(
    parameters: impl IntoIterator<Item = &'a Parameter>,
    additional: &AdditionalParameters,
) -> BTreeMap<Location, LocationSchema> {
    let mut schemas: BTreeMap<Location, LocationSchema> = BTreeMap::new();

    for param in parameters {
        let Some(source) = param.schema_source() else {
            tracing::trace!(
                name = %param.name,
                location = %param.location,
                "parameter has no schema"
            );
            continue;
        };

        schemas
            .entry(param.location)
            .or_insert_with(|| LocationSchema::new(additional.allows(param.location)))
            .insert(
                param.key(),
                source.schema().clone(),
                param.required,
                source.is_json_encoded(),
            );
    }

    schemas
}
