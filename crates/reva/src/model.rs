//! Input models: the slice of an `OpenAPI` operation the engine reads, and the
//! already-parsed request it checks.
//!
//! Operations are deserialized straight from a dereferenced `OpenAPI` document
//! (JSON or YAML); keys the engine does not use are ignored.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Media type whose schema marks a parameter as JSON-encoded.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// An `OpenAPI` parameter container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// `in: header`
    Header,
    /// `in: path`
    Path,
    /// `in: query`
    Query,
    /// `in: cookie`
    Cookie,
}

impl Location {
    /// All locations in validation order.
    pub const ALL: [Location; 4] = [
        Location::Header,
        Location::Path,
        Location::Query,
        Location::Cookie,
    ];

    /// The `OpenAPI` spelling of this location.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Path => "path",
            Self::Query => "query",
            Self::Cookie => "cookie",
        }
    }

    /// Base path used for errors reported against this location.
    #[must_use]
    pub fn base_path(self) -> String {
        format!("request.{}", self.as_str())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "path" => Ok(Self::Path),
            "query" => Ok(Self::Query),
            "cookie" => Ok(Self::Cookie),
            other => Err(format!(
                "unknown parameter location '{other}' (expected header, path, query or cookie)"
            )),
        }
    }
}

/// The operation subset needed for request validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    /// Declared parameters, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,

    /// Declared request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
}

impl Operation {
    /// Parse an operation object from YAML (JSON is accepted too).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid operation object.
    pub fn from_yaml(input: &str) -> crate::Result<Self> {
        Ok(serde_yaml_ng::from_str(input)?)
    }

    /// Load an operation object from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Inline parameters, skipping unresolved `$ref` entries and parameters
    /// outside the four validated locations.
    pub fn inline_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter_map(|entry| match entry {
            ParameterOrRef::Parameter(param) => Some(param),
            ParameterOrRef::Reference { reference } => {
                tracing::warn!(%reference, "skipping unresolved parameter reference");
                None
            }
            ParameterOrRef::Unsupported(raw) => {
                tracing::warn!(
                    location = raw.get("in").and_then(serde_json::Value::as_str).unwrap_or_default(),
                    name = raw.get("name").and_then(serde_json::Value::as_str).unwrap_or_default(),
                    "skipping parameter in unsupported location"
                );
                None
            }
        })
    }
}

/// A `parameters` entry: an inline parameter, an unresolved `$ref`, or an
/// entry this crate does not validate (e.g. `in: querystring`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    /// Inline parameter object.
    Parameter(Parameter),
    /// Reference the caller did not dereference. Cannot be validated.
    Reference {
        /// The `$ref` target.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// Any other entry, kept verbatim and never validated.
    Unsupported(Value),
}

impl From<Parameter> for ParameterOrRef {
    fn from(param: Parameter) -> Self {
        Self::Parameter(param)
    }
}

/// An inline `OpenAPI` parameter object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Where the parameter lives.
    #[serde(rename = "in")]
    pub location: Location,

    /// Parameter name (case-insensitive for headers).
    #[serde(default)]
    pub name: String,

    /// Whether the parameter must be present.
    #[serde(default)]
    pub required: bool,

    /// Schema for plain (style-serialized) parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    /// Media-type map for JSON-encoded parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

/// Where a parameter's schema came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaSource<'a> {
    /// `parameter.schema`: the raw value is checked as-is.
    Direct(&'a Value),
    /// `parameter.content["application/json"].schema`: the raw value is
    /// JSON-encoded and must be decoded before checking.
    Content(&'a Value),
}

impl<'a> SchemaSource<'a> {
    /// The schema regardless of source.
    #[must_use]
    pub const fn schema(self) -> &'a Value {
        match self {
            Self::Direct(schema) | Self::Content(schema) => schema,
        }
    }

    /// Whether the raw value is JSON-encoded.
    #[must_use]
    pub const fn is_json_encoded(self) -> bool {
        matches!(self, Self::Content(_))
    }
}

impl Parameter {
    /// Build a parameter with a direct schema.
    #[must_use]
    pub fn new(location: Location, name: &str, schema: Value) -> Self {
        Self {
            location,
            name: name.to_string(),
            required: false,
            schema: Some(schema),
            content: None,
        }
    }

    /// Build a parameter whose value is JSON-encoded `application/json`.
    #[must_use]
    pub fn json(location: Location, name: &str, schema: Value) -> Self {
        let mut content = IndexMap::new();
        content.insert(
            JSON_MEDIA_TYPE.to_string(),
            MediaType {
                schema: Some(schema),
            },
        );
        Self {
            location,
            name: name.to_string(),
            required: false,
            schema: None,
            content: Some(content),
        }
    }

    /// Mark the parameter as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Resolve the schema to validate against, if any.
    ///
    /// `schema` takes precedence over `content`.
    #[must_use]
    pub fn schema_source(&self) -> Option<SchemaSource<'_>> {
        match (&self.schema, &self.content) {
            (Some(schema), _) => Some(SchemaSource::Direct(schema)),
            (None, Some(content)) => content
                .get(JSON_MEDIA_TYPE)
                .and_then(|media| media.schema.as_ref())
                .map(SchemaSource::Content),
            (None, None) => None,
        }
    }

    /// Property key used in the synthesized location schema.
    ///
    /// Header names are lower-cased; all other names are kept verbatim.
    #[must_use]
    pub fn key(&self) -> String {
        match self.location {
            Location::Header => self.name.to_lowercase(),
            Location::Path | Location::Query | Location::Cookie => self.name.clone(),
        }
    }
}

/// An `OpenAPI` request body object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    /// Media type → schema, in declaration order.
    pub content: IndexMap<String, MediaType>,
}

impl RequestBody {
    /// Build a request body with a single media type.
    #[must_use]
    pub fn with_schema(media_type: &str, schema: Value) -> Self {
        let mut content = IndexMap::new();
        content.insert(
            media_type.to_string(),
            MediaType {
                schema: Some(schema),
            },
        );
        Self { content }
    }
}

/// An `OpenAPI` media type object (only `schema` is read).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaType {
    /// Schema describing the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// An already-parsed HTTP request.
///
/// The host framework decodes the URL, path template and body; the engine
/// only sees the resulting values. Header keys may use any case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevaRequest {
    /// Decoded query string parameters.
    pub query_parameters: Map<String, Value>,

    /// Path template parameters.
    pub path_parameters: Map<String, Value>,

    /// Request headers, including `cookie` and `content-type`.
    pub headers: Map<String, Value>,

    /// Decoded request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RevaRequest {
    /// Create an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.query_parameters.insert(name.to_string(), value.into());
        self
    }

    /// Add a path parameter.
    #[must_use]
    pub fn path(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.path_parameters.insert(name.to_string(), value.into());
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Load a request from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&content)?)
    }
}
