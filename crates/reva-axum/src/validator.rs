//! Per-operation validator for use in handlers and middleware.

use std::sync::Arc;

use http::request::Parts;
use http::{HeaderMap, Uri};
use serde_json::Value;

use reva::{Operation, Outcome, Reva, RevaOverrides, RevaRequest};

use crate::rejection::ValidationRejection;
use crate::request::{request_from_http, request_from_parts};

/// A shared [`Reva`] bound to one operation.
///
/// Cheap to clone; suitable as axum router state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use reva::{Operation, Reva, RevaOptions, RevaRequest};
/// use reva_axum::RequestValidator;
///
/// let reva = Arc::new(Reva::new(RevaOptions::default()).unwrap());
/// let operation = Operation::from_yaml("
/// parameters:
///   - { in: query, name: page, schema: { type: integer } }
/// ").unwrap();
///
/// let validator = RequestValidator::new(reva, operation);
/// assert!(validator.validate(&RevaRequest::new().query("page", "2")).is_ok());
/// assert!(validator.validate(&RevaRequest::new().query("page", "two")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RequestValidator {
    reva: Arc<Reva>,
    operation: Arc<Operation>,
    overrides: RevaOverrides,
}

impl RequestValidator {
    /// Bind `operation` to a shared engine.
    #[must_use]
    pub fn new(reva: Arc<Reva>, operation: Operation) -> Self {
        Self {
            reva,
            operation: Arc::new(operation),
            overrides: RevaOverrides::default(),
        }
    }

    /// Apply per-operation policy overrides (e.g. `partial_body` for PATCH).
    #[must_use]
    pub fn with_overrides(mut self, overrides: RevaOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The bound operation.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Check an already-built request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRejection::Invalid`] with every failure if the
    /// request does not match, or [`ValidationRejection::Engine`] if the
    /// operation's schemas cannot be compiled.
    pub fn validate(&self, request: &RevaRequest) -> Result<(), ValidationRejection> {
        let outcome = self
            .reva
            .validate_with(&self.operation, request, &self.overrides)?;

        match outcome {
            Outcome::Valid => Ok(()),
            Outcome::Invalid(errors) => {
                tracing::debug!(errors = errors.len(), "rejecting invalid request");
                Err(ValidationRejection::Invalid(errors))
            }
        }
    }

    /// Build a request from axum parts and check it.
    ///
    /// # Errors
    ///
    /// Same as [`RequestValidator::validate`], plus
    /// [`ValidationRejection::Query`] for an undecodable query string.
    pub fn validate_parts<K, V>(
        &self,
        parts: &Parts,
        path_params: impl IntoIterator<Item = (K, V)>,
        body: Option<&Value>,
    ) -> Result<(), ValidationRejection>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request = request_from_parts(parts, path_params, body.cloned())?;
        self.validate(&request)
    }

    /// Build a request from an extracted [`Uri`] and [`HeaderMap`] and check
    /// it.
    ///
    /// # Errors
    ///
    /// Same as [`RequestValidator::validate_parts`].
    pub fn validate_http<K, V>(
        &self,
        uri: &Uri,
        headers: &HeaderMap,
        path_params: impl IntoIterator<Item = (K, V)>,
        body: Option<&Value>,
    ) -> Result<(), ValidationRejection>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request = request_from_http(uri, headers, path_params, body.cloned())?;
        self.validate(&request)
    }
}
