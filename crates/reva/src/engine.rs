//! Schema validator seam.
//!
//! The executor never talks to a JSON Schema implementation directly. It
//! hands a schema and an instance to a [`SchemaValidator`] and receives
//! [`RawError`]s back. [`JsonSchemaEngine`] is the default implementation,
//! backed by the `jsonschema` crate.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

use crate::coerce::coerce;
use crate::config::{Draft, EngineOptions};

/// Keyword-specific details of a [`RawError`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorParams {
    /// `required`: the missing property.
    Required {
        /// Name of the missing property.
        missing_property: String,
    },
    /// `additionalProperties`: the unexpected property.
    AdditionalProperty {
        /// Name of the unexpected property.
        property: String,
    },
    /// `type`: the declared type(s), comma-separated.
    Type {
        /// Declared type, e.g. `number` or `string,null`.
        expected: String,
    },
    /// `enum`: the allowed values.
    Enum {
        /// Values listed by the schema.
        allowed_values: Vec<Value>,
    },
    /// `const`: the allowed value.
    Const {
        /// Value required by the schema.
        allowed_value: Value,
    },
    /// Any other keyword.
    Other,
}

/// A single failure reported by a [`SchemaValidator`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawError {
    /// Failing keyword, e.g. `required` or `minimum`.
    pub keyword: String,
    /// JSON pointer to the failing value (`""` for the root).
    pub instance_path: String,
    /// JSON pointer to the failing keyword within the schema.
    pub schema_path: String,
    /// Keyword-specific details.
    pub params: ErrorParams,
    /// Short message without a subject, e.g. `must be >= 1`.
    pub message: String,
}

/// A schema the validator refused to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SchemaError {
    /// Compiler diagnostic.
    pub message: String,
}

/// Validates instances against JSON schemas.
///
/// Implementations hold no per-request state. `instance` may be rewritten in
/// place (type coercion); an empty result means the instance is valid.
pub trait SchemaValidator: Send + Sync {
    /// Check `instance` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if `schema` cannot be compiled.
    fn validate(&self, schema: &Value, instance: &mut Value) -> Result<Vec<RawError>, SchemaError>;
}

/// Upper bound on compiled schemas kept by one [`JsonSchemaEngine`].
pub const SCHEMA_CACHE_CAPACITY: usize = 256;

/// [`SchemaValidator`] backed by the `jsonschema` crate.
///
/// Compiled schemas are cached by their serialized text, so validating the
/// same operation again skips compilation. Once [`SCHEMA_CACHE_CAPACITY`]
/// schemas are cached, further ones are compiled on every call.
pub struct JsonSchemaEngine {
    options: EngineOptions,
    compiled: RwLock<HashMap<String, Arc<jsonschema::Validator>>>,
}

impl std::fmt::Debug for JsonSchemaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaEngine")
            .field("options", &self.options)
            .field("cached_schemas", &self.cached_schemas())
            .finish()
    }
}

impl JsonSchemaEngine {
    /// Create an engine with the given settings.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// The engine's settings.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Number of compiled schemas currently cached.
    #[must_use]
    pub fn cached_schemas(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn compile(&self, schema: &Value) -> Result<Arc<jsonschema::Validator>, SchemaError> {
        let key = schema.to_string();
        if let Some(validator) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(validator));
        }

        let validator = jsonschema::options()
            .with_draft(draft(self.options.draft))
            .should_validate_formats(self.options.validate_formats)
            .build(schema)
            .map_err(|err| SchemaError {
                message: err.to_string(),
            })?;
        let validator = Arc::new(validator);

        let mut compiled = self
            .compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if compiled.len() < SCHEMA_CACHE_CAPACITY {
            compiled.insert(key, Arc::clone(&validator));
        } else {
            tracing::trace!("schema cache full, compiling without caching");
        }
        Ok(validator)
    }
}

const fn draft(draft: Draft) -> jsonschema::Draft {
    match draft {
        Draft::Draft4 => jsonschema::Draft::Draft4,
        Draft::Draft6 => jsonschema::Draft::Draft6,
        Draft::Draft7 => jsonschema::Draft::Draft7,
        Draft::Draft201909 => jsonschema::Draft::Draft201909,
        Draft::Draft202012 => jsonschema::Draft::Draft202012,
    }
}

impl SchemaValidator for JsonSchemaEngine {
    fn validate(&self, schema: &Value, instance: &mut Value) -> Result<Vec<RawError>, SchemaError> {
        let validator = self.compile(schema)?;

        if self.options.coerce_types {
            coerce(schema, instance);
        }

        let limit = if self.options.all_errors { usize::MAX } else { 1 };
        let errors = validator
            .iter_errors(instance)
            .flat_map(|error| raw_errors(&error, schema))
            .take(limit)
            .collect();
        Ok(errors)
    }
}

/// Convert one `jsonschema` error. `additionalProperties` failures list
/// every unexpected key at once and are split into one error per key.
fn raw_errors(error: &jsonschema::ValidationError<'_>, schema: &Value) -> Vec<RawError> {
    let instance_path = error.instance_path.to_string();
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path.rsplit('/').next().unwrap_or_default().to_string();
    let keyword_value = schema.pointer(&schema_path);

    let raw = |params: ErrorParams, message: String| RawError {
        keyword: keyword.clone(),
        instance_path: instance_path.clone(),
        schema_path: schema_path.clone(),
        params,
        message,
    };

    match &error.kind {
        ValidationErrorKind::Required { property, .. } => {
            let name = property
                .as_str()
                .map_or_else(|| property.to_string(), str::to_string);
            let message = format!("must have required property '{name}'");
            vec![raw(
                ErrorParams::Required {
                    missing_property: name,
                },
                message,
            )]
        }
        ValidationErrorKind::AdditionalProperties { unexpected, .. } => unexpected
            .iter()
            .map(|property| {
                raw(
                    ErrorParams::AdditionalProperty {
                        property: property.clone(),
                    },
                    "must NOT have additional properties".to_string(),
                )
            })
            .collect(),
        _ => {
            let params = keyword_params(&keyword, keyword_value);
            let message = keyword_message(&keyword, keyword_value)
                .unwrap_or_else(|| error.to_string());
            vec![raw(params, message)]
        }
    }
}

fn keyword_params(keyword: &str, value: Option<&Value>) -> ErrorParams {
    match (keyword, value) {
        ("type", Some(value)) => ErrorParams::Type {
            expected: type_label(value),
        },
        ("enum", Some(Value::Array(values))) => ErrorParams::Enum {
            allowed_values: values.clone(),
        },
        ("const", Some(value)) => ErrorParams::Const {
            allowed_value: value.clone(),
        },
        _ => ErrorParams::Other,
    }
}

fn type_label(value: &Value) -> String {
    match value {
        Value::String(t) => t.clone(),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Short messages for the keywords clients trip over most often.
fn keyword_message(keyword: &str, value: Option<&Value>) -> Option<String> {
    let value = value?;
    let message = match keyword {
        "type" => format!("must be {}", type_label(value)),
        "enum" => "must be equal to one of the allowed values".to_string(),
        "const" => "must be equal to constant".to_string(),
        "minimum" => format!("must be >= {value}"),
        "maximum" => format!("must be <= {value}"),
        "exclusiveMinimum" => format!("must be > {value}"),
        "exclusiveMaximum" => format!("must be < {value}"),
        "multipleOf" => format!("must be multiple of {value}"),
        "minLength" => format!("must NOT have fewer than {value} characters"),
        "maxLength" => format!("must NOT have more than {value} characters"),
        "minItems" => format!("must NOT have fewer than {value} items"),
        "maxItems" => format!("must NOT have more than {value} items"),
        "minProperties" => format!("must NOT have fewer than {value} properties"),
        "maxProperties" => format!("must NOT have more than {value} properties"),
        "uniqueItems" => "must NOT have duplicate items".to_string(),
        "pattern" => format!("must match pattern \"{}\"", value.as_str()?),
        "format" => format!("must match format \"{}\"", value.as_str()?),
        _ => return None,
    };
    Some(message)
}
