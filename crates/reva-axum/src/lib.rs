//! axum glue for [`reva`] request validation.
//!
//! # Types
//!
//! - [`request_from_parts`] / [`request_from_http`] - Build a
//!   [`reva::RevaRequest`] from request parts (or `Uri` + `HeaderMap`),
//!   router path parameters and a decoded body
//! - [`RequestValidator`] - A shared [`reva::Reva`] bound to one operation,
//!   usable as router state
//! - [`ValidationRejection`] - Renders failures as `400` (or `500` for broken
//!   schemas) JSON error responses
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use axum::extract::{Json, Path, State};
//! use axum::routing::post;
//! use axum::Router;
//! use http::{HeaderMap, Uri};
//! use reva::{Operation, Reva, RevaOptions};
//! use reva_axum::{RequestValidator, ValidationRejection};
//! use serde_json::Value;
//!
//! async fn create_user(
//!     State(validator): State<RequestValidator>,
//!     Path(params): Path<HashMap<String, String>>,
//!     uri: Uri,
//!     headers: HeaderMap,
//!     Json(body): Json<Value>,
//! ) -> Result<Json<Value>, ValidationRejection> {
//!     validator.validate_http(&uri, &headers, params, Some(&body))?;
//!     Ok(Json(body))
//! }
//!
//! # fn router(operation: Operation) -> Router {
//! let reva = Arc::new(Reva::new(RevaOptions::default()).unwrap());
//! Router::new()
//!     .route("/orgs/{org}/users", post(create_user))
//!     .with_state(RequestValidator::new(reva, operation))
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod rejection;
mod request;
mod validator;

pub use rejection::ValidationRejection;
pub use request::{header_values, query_parameters, request_from_http, request_from_parts};
pub use validator::RequestValidator;
