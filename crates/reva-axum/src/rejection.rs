//! Validation rejection: renders failed checks as HTTP error responses.

use axum::extract::rejection::QueryRejection;
use axum::extract::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use reva::ValidationError;

/// Why a request was turned away before reaching its handler.
///
/// Rendered as a JSON body following the
/// [Google API error model](https://cloud.google.com/apis/design/errors),
/// with the individual validation errors under `details`:
///
/// ```json
/// {
///   "error": {
///     "code": 400,
///     "message": "'limit' property type must be integer",
///     "status": "INVALID_ARGUMENT",
///     "details": [
///       { "path": "request.query.limit", "message": "...", "context": { "errorType": "type" } }
///     ]
///   }
/// }
/// ```
///
/// # Examples
///
/// ```
/// use axum::response::IntoResponse;
/// use reva_axum::ValidationRejection;
///
/// let response = ValidationRejection::Invalid(Vec::new()).into_response();
/// assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum ValidationRejection {
    /// The request does not match the operation.
    Invalid(Vec<ValidationError>),

    /// The query string could not be decoded.
    Query(QueryRejection),

    /// The operation could not be checked at all (e.g. a broken schema).
    Engine(reva::Error),
}

impl std::fmt::Display for ValidationRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(errors) => {
                write!(f, "request failed validation ({} errors)", errors.len())
            }
            Self::Query(rejection) => write!(f, "invalid query string: {}", rejection.body_text()),
            Self::Engine(err) => write!(f, "request validation could not run: {err}"),
        }
    }
}

impl std::error::Error for ValidationRejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(_) => None,
            Self::Query(rejection) => Some(rejection),
            Self::Engine(err) => Some(err),
        }
    }
}

impl From<reva::Error> for ValidationRejection {
    fn from(err: reva::Error) -> Self {
        Self::Engine(err)
    }
}

impl From<QueryRejection> for ValidationRejection {
    fn from(rejection: QueryRejection) -> Self {
        Self::Query(rejection)
    }
}

impl ValidationRejection {
    /// HTTP status the rejection renders with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Invalid(_) | Self::Query(_) => StatusCode::BAD_REQUEST,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The validation errors, if the request was rejected as invalid.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let http_status = self.status_code();

        let body = match &self {
            Self::Invalid(errors) => serde_json::json!({
                "error": {
                    "code": http_status.as_u16(),
                    "message": errors
                        .first()
                        .map_or("request failed validation", |e| e.message.as_str()),
                    "status": "INVALID_ARGUMENT",
                    "details": errors,
                }
            }),
            Self::Query(rejection) => serde_json::json!({
                "error": {
                    "code": http_status.as_u16(),
                    "message": rejection.body_text(),
                    "status": "INVALID_ARGUMENT",
                }
            }),
            Self::Engine(err) => {
                tracing::error!(error = %err, "request validation failed to run");
                serde_json::json!({
                    "error": {
                        "code": http_status.as_u16(),
                        "message": err.to_string(),
                        "status": "INTERNAL",
                    }
                })
            }
        };

        (http_status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use reva::ErrorContext;
    use serde_json::{json, Value};

    use super::*;

    /// Parse the JSON error body from a rejection response.
    async fn error_body(rejection: ValidationRejection) -> (StatusCode, Value) {
        let response = rejection.into_response();
        let http_status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        (http_status, json)
    }

    fn type_error() -> ValidationError {
        ValidationError {
            path: "request.query.limit".to_string(),
            message: "'limit' property type must be integer".to_string(),
            suggestion: None,
            context: Some(ErrorContext::new("type")),
        }
    }

    #[tokio::test]
    async fn invalid_request_response() {
        let (status, json) = error_body(ValidationRejection::Invalid(vec![type_error()])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({
                "error": {
                    "code": 400,
                    "message": "'limit' property type must be integer",
                    "status": "INVALID_ARGUMENT",
                    "details": [{
                        "path": "request.query.limit",
                        "message": "'limit' property type must be integer",
                        "context": {"errorType": "type"}
                    }]
                }
            })
        );
    }

    #[tokio::test]
    async fn engine_error_response() {
        let err = reva::Error::InvalidSchema {
            base_path: "request.body".to_string(),
            message: "bad pattern".to_string(),
        };
        let (status, json) = error_body(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], 500);
        assert_eq!(json["error"]["status"], "INTERNAL");
        assert_eq!(
            json["error"]["message"],
            "invalid schema for 'request.body': bad pattern"
        );
    }

    #[test]
    fn display_and_accessors() {
        let rejection = ValidationRejection::Invalid(vec![type_error(), type_error()]);
        assert_eq!(rejection.to_string(), "request failed validation (2 errors)");
        assert_eq!(rejection.errors().len(), 2);
        assert_eq!(rejection.status_code(), StatusCode::BAD_REQUEST);
    }
}
