//! Request validation.
//!
//! [`Reva`] ties the pieces together: it synthesizes one schema per
//! parameter location, normalizes the request values to match, optionally
//! folds grouped locations together, checks each pair with the parameter
//! engine, then negotiates and checks the body with the body engine. Every
//! failure is collected; nothing short-circuits.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::body::body_schema;
use crate::config::{RevaOptions, RevaOverrides};
use crate::content_type::{negotiate, ContentType, Negotiated, DEFAULT_CONTENT_TYPE};
use crate::engine::{JsonSchemaEngine, SchemaValidator};
use crate::format::{format, ErrorContext, ValidationError};
use crate::group::{partition, LocationEntry, GROUPED_BASE_PATH};
use crate::model::{Location, Operation, RequestBody, RevaRequest};
use crate::normalize::{location_value, lowercase_keys};
use crate::synth::{synthesize, LocationSchema};
use crate::{Error, Result};

/// Base path for errors reported against the request body.
pub const BODY_BASE_PATH: &str = "request.body";

/// Path of the error reported for an unsupported `Content-Type`.
pub const CONTENT_TYPE_PATH: &str = "request.header.Content-Type";

/// Result of validating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The request satisfies the operation.
    Valid,
    /// The request violates the operation. Never empty.
    Invalid(Vec<ValidationError>),
}

impl Outcome {
    /// `Valid` for an empty list, `Invalid` otherwise.
    #[must_use]
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    /// Whether the request is valid.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The collected errors (empty when valid).
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }

    /// Consume the outcome, returning its errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        match self {
            Self::Valid => Vec::new(),
            Self::Invalid(errors) => errors,
        }
    }
}

/// `{"ok": true}` or `{"ok": false, "errors": [...]}`.
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Valid => {
                let mut state = serializer.serialize_struct("Outcome", 1)?;
                state.serialize_field("ok", &true)?;
                state.end()
            }
            Self::Invalid(errors) => {
                let mut state = serializer.serialize_struct("Outcome", 2)?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("errors", errors)?;
                state.end()
            }
        }
    }
}

/// Validates requests against `OpenAPI` operations.
///
/// Holds no per-request state; share one instance (e.g. in an `Arc`) across
/// handlers.
///
/// # Example
///
/// ```
/// use reva::{Operation, Reva, RevaOptions, RevaRequest};
///
/// let operation = Operation::from_yaml(r#"
/// parameters:
///   - in: query
///     name: limit
///     required: true
///     schema: { type: integer, minimum: 1 }
/// "#)?;
///
/// let reva = Reva::new(RevaOptions::default())?;
///
/// let ok = reva.validate(&operation, &RevaRequest::new().query("limit", "10"))?;
/// assert!(ok.is_ok());
///
/// let bad = reva.validate(&operation, &RevaRequest::new().query("limit", "0"))?;
/// assert_eq!(bad.errors()[0].path, "request.query.limit");
/// # Ok::<(), reva::Error>(())
/// ```
pub struct Reva {
    options: RevaOptions,
    param_validator: Box<dyn SchemaValidator>,
    body_validator: Box<dyn SchemaValidator>,
}

impl fmt::Debug for Reva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reva")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reva {
    /// Create an engine using [`JsonSchemaEngine`]s configured by
    /// `options.param_engine` and `options.body_engine`.
    ///
    /// Each engine caches the schemas it compiles, so share one `Reva`
    /// (e.g. behind an `Arc`) across requests rather than building one per
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if either engine cannot compile a
    /// trivial schema under its configured draft.
    pub fn new(options: RevaOptions) -> Result<Self> {
        let param = JsonSchemaEngine::new(options.param_engine);
        let body = JsonSchemaEngine::new(options.body_engine);
        let reva = Self::with_validators(options, param, body);
        reva.self_check()?;
        Ok(reva)
    }

    /// Create an engine with custom schema validators.
    #[must_use]
    pub fn with_validators(
        options: RevaOptions,
        param: impl SchemaValidator + 'static,
        body: impl SchemaValidator + 'static,
    ) -> Self {
        Self {
            options,
            param_validator: Box::new(param),
            body_validator: Box::new(body),
        }
    }

    /// The construction-time options.
    #[must_use]
    pub const fn options(&self) -> &RevaOptions {
        &self.options
    }

    fn self_check(&self) -> Result<()> {
        let schema = Value::Object(Map::new());
        for (validator, base_path) in [
            (&self.param_validator, "parameters"),
            (&self.body_validator, BODY_BASE_PATH),
        ] {
            validator
                .validate(&schema, &mut Value::Object(Map::new()))
                .map_err(|err| Error::InvalidSchema {
                    base_path: base_path.to_string(),
                    message: err.message,
                })?;
        }
        Ok(())
    }

    /// The per-location schemas `operation`'s parameters produce under the
    /// construction-time options.
    #[must_use]
    pub fn parameter_schemas(&self, operation: &Operation) -> BTreeMap<Location, LocationSchema> {
        synthesize(
            operation.inline_parameters(),
            &self.options.allow_additional_parameters,
        )
    }

    /// Validate `request` against `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if a declared schema cannot be
    /// compiled. Validation failures are reported through [`Outcome`].
    pub fn validate(&self, operation: &Operation, request: &RevaRequest) -> Result<Outcome> {
        self.validate_with(operation, request, &RevaOverrides::default())
    }

    /// Validate with per-call policy overrides.
    ///
    /// # Errors
    ///
    /// Same as [`Reva::validate`].
    pub fn validate_with(
        &self,
        operation: &Operation,
        request: &RevaRequest,
        overrides: &RevaOverrides,
    ) -> Result<Outcome> {
        let options = self.options.merged(overrides);
        let headers = lowercase_keys(&request.headers);
        let mut errors = Vec::new();

        let entries: Vec<LocationEntry> = synthesize(
            operation.inline_parameters(),
            &options.allow_additional_parameters,
        )
        .into_iter()
        .map(|(location, schema)| LocationEntry {
            location,
            value: location_value(location, &schema, request, &headers),
            schema,
        })
        .collect();

        let (grouped, individual) = partition(
            entries,
            &options.grouped_parameters,
            options.allow_additional_parameters.is_all(),
        );

        if let Some(group) = grouped {
            errors.extend(check(
                self.param_validator.as_ref(),
                &group.schema.to_schema(),
                Value::Object(group.value),
                GROUPED_BASE_PATH,
            )?);
        }

        for entry in individual {
            errors.extend(check(
                self.param_validator.as_ref(),
                &entry.schema.to_schema(),
                Value::Object(entry.value),
                &entry.location.base_path(),
            )?);
        }

        if let Some(body) = &operation.request_body {
            errors.extend(self.check_body(body, request, &headers, options.partial_body)?);
        }

        Ok(Outcome::from_errors(errors))
    }

    fn check_body(
        &self,
        body: &RequestBody,
        request: &RevaRequest,
        headers: &Map<String, Value>,
        partial: bool,
    ) -> Result<Vec<ValidationError>> {
        let header = headers
            .get("content-type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let content_type = ContentType::parse(header);

        let negotiated = negotiate(&body.content, &content_type.media_type);
        let Negotiated::Matched { media_type, media } = negotiated else {
            tracing::debug!(media_type = %content_type.media_type, "unsupported content type");
            return Ok(vec![unsupported_content_type(&content_type.media_type, body)]);
        };
        tracing::trace!(
            requested = %content_type.media_type,
            selected = media_type,
            "selected body schema"
        );

        let Some(schema) = &media.schema else {
            return Ok(Vec::new());
        };

        let value = match &request.body {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value.clone(),
        };
        check(
            self.body_validator.as_ref(),
            &body_schema(schema, partial),
            value,
            BODY_BASE_PATH,
        )
    }
}

fn unsupported_content_type(media_type: &str, body: &RequestBody) -> ValidationError {
    let supported = body.content.keys().cloned().map(Value::String).collect();
    ValidationError {
        path: CONTENT_TYPE_PATH.to_string(),
        message: format!("\"{media_type}\" Content-Type is not supported."),
        suggestion: None,
        context: Some(
            ErrorContext::new("contentType").with("supportedContentTypes", Value::Array(supported)),
        ),
    }
}

fn check(
    validator: &dyn SchemaValidator,
    schema: &Value,
    mut instance: Value,
    base_path: &str,
) -> Result<Vec<ValidationError>> {
    let raw = validator
        .validate(schema, &mut instance)
        .map_err(|err| Error::InvalidSchema {
            base_path: base_path.to_string(),
            message: err.message,
        })?;
    let errors = format(&raw, &instance, schema, base_path);
    tracing::debug!(base_path, errors = errors.len(), "validated");
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::engine::{ErrorParams, RawError, SchemaError};
    use crate::model::Parameter;

    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reva>();
    };

    /// Records the schemas it is asked to check and reports nothing.
    #[derive(Default, Clone)]
    struct Recorder {
        calls: Arc<AtomicUsize>,
    }

    impl SchemaValidator for Recorder {
        fn validate(
            &self,
            _: &Value,
            _: &mut Value,
        ) -> std::result::Result<Vec<RawError>, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct Failing;

    impl SchemaValidator for Failing {
        fn validate(
            &self,
            _: &Value,
            _: &mut Value,
        ) -> std::result::Result<Vec<RawError>, SchemaError> {
            Err(SchemaError {
                message: "boom".to_string(),
            })
        }
    }

    struct AlwaysRequired;

    impl SchemaValidator for AlwaysRequired {
        fn validate(
            &self,
            _: &Value,
            _: &mut Value,
        ) -> std::result::Result<Vec<RawError>, SchemaError> {
            Ok(vec![RawError {
                keyword: "required".to_string(),
                instance_path: String::new(),
                schema_path: "/required".to_string(),
                params: ErrorParams::Required {
                    missing_property: "x".to_string(),
                },
                message: String::new(),
            }])
        }
    }

    fn operation(parameters: Vec<Parameter>) -> Operation {
        Operation {
            parameters: parameters.into_iter().map(Into::into).collect(),
            request_body: None,
        }
    }

    #[test]
    fn outcome_from_errors() {
        assert_eq!(Outcome::from_errors(Vec::new()), Outcome::Valid);
        assert!(Outcome::Valid.errors().is_empty());
        assert!(Outcome::Valid.is_ok());
    }

    #[test]
    fn outcome_serialization() {
        assert_eq!(serde_json::to_value(Outcome::Valid).unwrap(), json!({"ok": true}));

        let invalid = Outcome::from_errors(vec![ValidationError {
            path: "request.body".to_string(),
            message: "m".to_string(),
            suggestion: None,
            context: None,
        }]);
        assert_eq!(
            serde_json::to_value(invalid).unwrap(),
            json!({"ok": false, "errors": [{"path": "request.body", "message": "m"}]})
        );
    }

    #[test]
    fn empty_operation_skips_validators() {
        let recorder = Recorder::default();
        let reva =
            Reva::with_validators(RevaOptions::default(), recorder.clone(), recorder.clone());
        let outcome = reva
            .validate(&Operation::default(), &RevaRequest::new().query("x", "1"))
            .unwrap();
        assert!(outcome.is_ok());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn one_check_per_declared_location() {
        let recorder = Recorder::default();
        let reva =
            Reva::with_validators(RevaOptions::default(), recorder.clone(), recorder.clone());
        let op = operation(vec![
            Parameter::new(Location::Query, "a", json!({})),
            Parameter::new(Location::Query, "b", json!({})),
            Parameter::new(Location::Path, "id", json!({})),
        ]);
        reva.validate(&op, &RevaRequest::new()).unwrap();
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn errors_are_reported_in_location_order() {
        let reva = Reva::with_validators(RevaOptions::default(), AlwaysRequired, AlwaysRequired);
        let op = operation(vec![
            Parameter::new(Location::Cookie, "c", json!({})),
            Parameter::new(Location::Query, "q", json!({})),
            Parameter::new(Location::Header, "h", json!({})),
        ]);
        let paths: Vec<_> = reva
            .validate(&op, &RevaRequest::new())
            .unwrap()
            .into_errors()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(paths, vec!["request.header", "request.query", "request.cookie"]);
    }

    #[test]
    fn compile_failures_carry_base_path() {
        let reva = Reva::with_validators(RevaOptions::default(), Failing, Failing);
        let op = operation(vec![Parameter::new(Location::Path, "id", json!({}))]);
        let err = reva.validate(&op, &RevaRequest::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSchema { ref base_path, .. } if base_path == "request.path"
        ));
    }

    #[test]
    fn new_with_default_options() {
        assert!(Reva::new(RevaOptions::default()).is_ok());
    }

    #[test]
    fn unsupported_content_type_error_shape() {
        let body = RequestBody::with_schema("application/json", json!({}));
        let error = unsupported_content_type("text/plain", &body);
        assert_eq!(
            serde_json::to_value(error).unwrap(),
            json!({
                "path": "request.header.Content-Type",
                "message": "\"text/plain\" Content-Type is not supported.",
                "context": {
                    "errorType": "contentType",
                    "supportedContentTypes": ["application/json"]
                }
            })
        );
    }
}
