//! Validate already-parsed HTTP requests against `OpenAPI` 3 operations.
//!
//! Given a dereferenced operation object and a request (query, path and
//! header values plus a decoded body), [`Reva`] checks every parameter
//! location and the body, then returns either [`Outcome::Valid`] or the full
//! list of [`ValidationError`]s:
//!
//! ```text
//! request.query.limit   property 'limit' must be >= 1
//! request.body          request.body must have required property 'name'
//! request.header.Content-Type   "text/plain" Content-Type is not supported.
//! ```
//!
//! ## Pipeline
//!
//! 1. One object schema per location is synthesized from the declared
//!    parameters (headers keyed lower-case).
//! 2. Request values are normalized: headers case-folded, cookies parsed,
//!    JSON-encoded parameters decoded.
//! 3. Optionally, several locations are merged and checked together
//!    ([`RevaOptions::grouped_parameters`]).
//! 4. Parameters are checked with type coercion (`"5"` satisfies
//!    `type: number`).
//! 5. The body schema is chosen by `Content-Type`, stripped of `readOnly`
//!    properties, and checked strictly.
//!
//! Schema evaluation is pluggable through [`SchemaValidator`];
//! [`JsonSchemaEngine`] is the default.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod body;
mod coerce;
mod config;
mod content_type;
mod engine;
mod error;
mod format;
mod group;
mod model;
mod normalize;
mod synth;
mod validate;

pub use body::{body_schema, strip_read_only};
pub use coerce::coerce;
pub use config::{AdditionalParameters, Draft, EngineOptions, RevaOptions, RevaOverrides};
pub use content_type::{negotiate, ContentType, Negotiated, DEFAULT_CONTENT_TYPE, WILDCARD};
pub use engine::{
    ErrorParams, JsonSchemaEngine, RawError, SchemaError, SchemaValidator, SCHEMA_CACHE_CAPACITY,
};
pub use error::{Error, Result};
pub use format::{format, ErrorContext, ValidationError};
pub use group::{merge, partition, GroupedEntry, LocationEntry, GROUPED_BASE_PATH};
pub use model::{
    Location, MediaType, Operation, Parameter, ParameterOrRef, RequestBody, RevaRequest,
    SchemaSource, JSON_MEDIA_TYPE,
};
pub use normalize::{decode_json, location_value, lowercase_keys, parse_cookies};
pub use synth::{declares_type, synthesize, LocationSchema};
pub use validate::{Outcome, Reva, BODY_BASE_PATH, CONTENT_TYPE_PATH};
