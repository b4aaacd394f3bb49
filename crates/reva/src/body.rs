//! Request body schema transforms.
//!
//! - Strip `readOnly` properties (server-generated fields clients never send)
//! - Drop the top-level `required` list for partial bodies

use serde_json::Value;

use crate::synth::declares_type;

/// Whether a property schema is flagged `readOnly: true`.
fn is_read_only(schema: &Value) -> bool {
    schema
        .get("readOnly")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Remove `readOnly` properties from an object schema, recursing into nested
/// `type: object` properties.
///
/// Removed properties are dropped from both `properties` and `required`.
/// Schemas without `properties` are left untouched.
fn strip_read_only_in_place(schema: &mut Value) {
    let Some(map) = schema.as_object_mut() else {
        return;
    };
    let Some(properties) = map.get_mut("properties").and_then(Value::as_object_mut) else {
        return;
    };

    let read_only: Vec<String> = properties
        .iter()
        .filter(|(_, prop)| is_read_only(prop))
        .map(|(key, _)| key.clone())
        .collect();

    for key in &read_only {
        properties.shift_remove(key);
    }

    for prop in properties.values_mut() {
        if declares_type(prop, "object") {
            strip_read_only_in_place(prop);
        }
    }

    if let Some(required) = map.get_mut("required").and_then(Value::as_array_mut) {
        required.retain(|field| {
            field
                .as_str()
                .is_none_or(|name| !read_only.iter().any(|k| k == name))
        });
    }
}

/// Return a copy of `schema` with every `readOnly` property removed.
///
/// The input is never modified, so an operation can be validated repeatedly
/// without accumulating stripped state.
#[must_use]
pub fn strip_read_only(schema: &Value) -> Value {
    let mut schema = schema.clone();
    strip_read_only_in_place(&mut schema);
    schema
}

/// Derive the schema a request body is validated against.
///
/// Strips `readOnly` properties and, for partial bodies, the top-level
/// `required` list. Nested `required` lists are kept.
#[must_use]
pub fn body_schema(schema: &Value, partial: bool) -> Value {
    let mut schema = strip_read_only(schema);
    if partial {
        if let Some(map) = schema.as_object_mut() {
            map.shift_remove("required");
        }
    }
    schema
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_read_only_properties_and_required_entries() {
        let schema = json!({
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": {"type": "string", "readOnly": true},
                "name": {"type": "string"}
            }
        });
        assert_eq!(
            strip_read_only(&schema),
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"}
                }
            })
        );
    }

    #[test]
    fn strips_nested_object_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "owner": {
                    "type": "object",
                    "required": ["createdAt", "email"],
                    "properties": {
                        "createdAt": {"type": "string", "readOnly": true},
                        "email": {"type": "string"}
                    }
                }
            }
        });
        let stripped = strip_read_only(&schema);
        assert_eq!(
            stripped["properties"]["owner"],
            json!({
                "type": "object",
                "required": ["email"],
                "properties": {"email": {"type": "string"}}
            })
        );
    }

    #[test]
    fn read_only_false_is_kept() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string", "readOnly": false}}
        });
        assert_eq!(strip_read_only(&schema), schema);
    }

    #[test]
    fn non_object_properties_are_not_recursed() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"id": {"readOnly": true}}
                    }
                }
            }
        });
        assert_eq!(strip_read_only(&schema), schema);
    }

    #[test]
    fn schema_without_properties_is_unchanged() {
        let schema = json!({"type": "string", "readOnly": true});
        assert_eq!(strip_read_only(&schema), schema);
    }

    #[test]
    fn input_is_not_mutated() {
        let schema = json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "string", "readOnly": true}}
        });
        let before = schema.clone();
        let _ = body_schema(&schema, true);
        assert_eq!(schema, before);
    }

    #[test]
    fn partial_body_drops_top_level_required_only() {
        let schema = json!({
            "type": "object",
            "required": ["foo"],
            "properties": {
                "foo": {"type": "string"},
                "nested": {
                    "type": "object",
                    "required": ["bar"],
                    "properties": {"bar": {"type": "string"}}
                }
            }
        });
        let partial = body_schema(&schema, true);
        assert!(partial.get("required").is_none());
        assert_eq!(partial["properties"]["nested"]["required"], json!(["bar"]));

        let full = body_schema(&schema, false);
        assert_eq!(full["required"], json!(["foo"]));
    }
}
