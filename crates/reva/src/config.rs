//! Validator options, loadable from YAML or JSON.
//!
//! # File format
//!
//! ```yaml
//! # reva.yaml
//!
//! # `true` allows unexpected keys everywhere; a list allows them only in the
//! # listed locations; `false` allows them nowhere.
//! allow_additional_parameters: [header, cookie]
//!
//! # Locations validated together as one merged object.
//! grouped_parameters: [path, query]
//!
//! # Drop the body schema's top-level `required` list (PATCH-style bodies).
//! partial_body: false
//!
//! # Schema engine used for parameters (coerces strings by default).
//! param_engine:
//!   coerce_types: true
//!   all_errors: true
//!
//! # Schema engine used for bodies (strict by default).
//! body_engine:
//!   validate_formats: true
//!   draft: draft2020-12
//! ```
//!
//! Every key is optional; missing keys keep their defaults. The three policy
//! keys also accept their camelCase spellings (`allowAdditionalParameters`,
//! `groupedParameters`, `partialBody`).

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Location;

/// Which locations accept keys that no parameter declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalParameters {
    /// Every location accepts unexpected keys (`true`).
    All,
    /// Only the listed locations accept unexpected keys.
    Only(Vec<Location>),
}

impl AdditionalParameters {
    /// Whether unexpected keys are allowed in `location`.
    #[must_use]
    pub fn allows(&self, location: Location) -> bool {
        match self {
            Self::All => true,
            Self::Only(locations) => locations.contains(&location),
        }
    }

    /// Whether this is the blanket `true` policy.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Additional headers and cookies are allowed; additional path and query
/// parameters are not.
impl Default for AdditionalParameters {
    fn default() -> Self {
        Self::Only(vec![Location::Header, Location::Cookie])
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AdditionalParametersRepr {
    Flag(bool),
    Locations(Vec<Location>),
}

impl<'de> Deserialize<'de> for AdditionalParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match AdditionalParametersRepr::deserialize(deserializer)? {
            AdditionalParametersRepr::Flag(true) => Self::All,
            AdditionalParametersRepr::Flag(false) => Self::Only(Vec::new()),
            AdditionalParametersRepr::Locations(locations) => Self::Only(locations),
        })
    }
}

impl Serialize for AdditionalParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_bool(true),
            Self::Only(locations) => locations.serialize(serializer),
        }
    }
}

/// JSON Schema draft used to compile schemas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Draft {
    /// Draft 4 (`OpenAPI` 3.0 heritage, boolean `exclusiveMinimum`).
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft 6.
    #[serde(rename = "draft6")]
    Draft6,
    /// Draft 7.
    #[default]
    #[serde(rename = "draft7")]
    Draft7,
    /// Draft 2019-09.
    #[serde(rename = "draft2019-09")]
    Draft201909,
    /// Draft 2020-12 (`OpenAPI` 3.1).
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

/// Settings for one schema engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EngineOptions {
    /// Coerce values to the declared scalar type before checking
    /// (`"5"` → `5` for `type: number`).
    pub coerce_types: bool,

    /// Report every failure instead of stopping at the first.
    pub all_errors: bool,

    /// Enforce the `format` keyword (`email`, `date-time`, ...).
    pub validate_formats: bool,

    /// Draft used to compile schemas.
    pub draft: Draft,
}

impl EngineOptions {
    /// Defaults for the parameter engine: coerce, collect all errors.
    #[must_use]
    pub const fn parameters() -> Self {
        Self {
            coerce_types: true,
            all_errors: true,
            validate_formats: false,
            draft: Draft::Draft7,
        }
    }

    /// Defaults for the body engine: strict, collect all errors.
    #[must_use]
    pub const fn body() -> Self {
        Self {
            coerce_types: false,
            all_errors: true,
            validate_formats: false,
            draft: Draft::Draft7,
        }
    }

    fn apply(&mut self, overrides: &EngineOverrides) {
        if let Some(coerce_types) = overrides.coerce_types {
            self.coerce_types = coerce_types;
        }
        if let Some(all_errors) = overrides.all_errors {
            self.all_errors = all_errors;
        }
        if let Some(validate_formats) = overrides.validate_formats {
            self.validate_formats = validate_formats;
        }
        if let Some(draft) = overrides.draft {
            self.draft = draft;
        }
    }
}

/// Partial [`EngineOptions`] as written in an options file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineOverrides {
    #[serde(alias = "coerceTypes")]
    coerce_types: Option<bool>,
    #[serde(alias = "allErrors")]
    all_errors: Option<bool>,
    #[serde(alias = "validateFormats")]
    validate_formats: Option<bool>,
    draft: Option<Draft>,
}

/// Options for a [`Reva`](crate::Reva) instance.
///
/// Build programmatically with [`RevaOptions::default`] and the builder
/// methods, or load from a file with [`RevaOptions::load`].
///
/// # Example
///
/// ```
/// use reva::{AdditionalParameters, Location, RevaOptions};
///
/// let options = RevaOptions::default()
///     .allow_additional_parameters(AdditionalParameters::All)
///     .grouped_parameters(&[Location::Path, Location::Query])
///     .partial_body(true);
/// assert!(options.partial_body);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "OptionsRepr")]
pub struct RevaOptions {
    /// Locations that accept undeclared keys.
    pub allow_additional_parameters: AdditionalParameters,

    /// Locations validated together as one merged object.
    pub grouped_parameters: Vec<Location>,

    /// Ignore the body schema's top-level `required` list.
    pub partial_body: bool,

    /// Engine settings for parameter validation.
    pub param_engine: EngineOptions,

    /// Engine settings for body validation.
    pub body_engine: EngineOptions,
}

impl Default for RevaOptions {
    fn default() -> Self {
        Self {
            allow_additional_parameters: AdditionalParameters::default(),
            grouped_parameters: Vec::new(),
            partial_body: false,
            param_engine: EngineOptions::parameters(),
            body_engine: EngineOptions::body(),
        }
    }
}

impl RevaOptions {
    /// Load options from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let options: Self = serde_yaml_ng::from_str(&content)?;
        Ok(options)
    }

    /// Set which locations accept undeclared keys.
    #[must_use]
    pub fn allow_additional_parameters(mut self, policy: AdditionalParameters) -> Self {
        self.allow_additional_parameters = policy;
        self
    }

    /// Set the locations validated together as one merged object.
    #[must_use]
    pub fn grouped_parameters(mut self, locations: &[Location]) -> Self {
        self.grouped_parameters = locations.to_vec();
        self
    }

    /// Enable or disable partial body validation.
    #[must_use]
    pub fn partial_body(mut self, enabled: bool) -> Self {
        self.partial_body = enabled;
        self
    }

    /// Replace the parameter engine settings.
    #[must_use]
    pub fn param_engine(mut self, engine: EngineOptions) -> Self {
        self.param_engine = engine;
        self
    }

    /// Replace the body engine settings.
    #[must_use]
    pub fn body_engine(mut self, engine: EngineOptions) -> Self {
        self.body_engine = engine;
        self
    }

    /// Shallow-merge per-call overrides over these options.
    #[must_use]
    pub fn merged(&self, overrides: &RevaOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(policy) = &overrides.allow_additional_parameters {
            merged.allow_additional_parameters = policy.clone();
        }
        if let Some(locations) = &overrides.grouped_parameters {
            merged.grouped_parameters.clone_from(locations);
        }
        if let Some(partial_body) = overrides.partial_body {
            merged.partial_body = partial_body;
        }
        merged
    }
}

/// Per-call overrides for the policy options of [`RevaOptions`].
///
/// Unset fields keep the value the [`Reva`](crate::Reva) instance was built
/// with. Engine settings cannot be overridden per call: the engines are built
/// once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RevaOverrides {
    /// Overrides [`RevaOptions::allow_additional_parameters`].
    #[serde(alias = "allowAdditionalParameters")]
    pub allow_additional_parameters: Option<AdditionalParameters>,

    /// Overrides [`RevaOptions::grouped_parameters`].
    #[serde(alias = "groupedParameters")]
    pub grouped_parameters: Option<Vec<Location>>,

    /// Overrides [`RevaOptions::partial_body`].
    #[serde(alias = "partialBody")]
    pub partial_body: Option<bool>,
}

impl RevaOverrides {
    /// Override [`RevaOptions::allow_additional_parameters`].
    #[must_use]
    pub fn allow_additional_parameters(mut self, policy: AdditionalParameters) -> Self {
        self.allow_additional_parameters = Some(policy);
        self
    }

    /// Override [`RevaOptions::grouped_parameters`].
    #[must_use]
    pub fn grouped_parameters(mut self, locations: &[Location]) -> Self {
        self.grouped_parameters = Some(locations.to_vec());
        self
    }

    /// Override [`RevaOptions::partial_body`].
    #[must_use]
    pub fn partial_body(mut self, enabled: bool) -> Self {
        self.partial_body = Some(enabled);
        self
    }
}

/// On-disk shape: every key optional, applied over [`RevaOptions::default`].
#[derive(Default, Deserialize)]
#[serde(default)]
struct OptionsRepr {
    #[serde(alias = "allowAdditionalParameters")]
    allow_additional_parameters: Option<AdditionalParameters>,
    #[serde(alias = "groupedParameters")]
    grouped_parameters: Option<Vec<Location>>,
    #[serde(alias = "partialBody")]
    partial_body: Option<bool>,
    #[serde(alias = "paramEngine")]
    param_engine: EngineOverrides,
    #[serde(alias = "bodyEngine")]
    body_engine: EngineOverrides,
}

impl From<OptionsRepr> for RevaOptions {
    fn from(repr: OptionsRepr) -> Self {
        let policy = RevaOverrides {
            allow_additional_parameters: repr.allow_additional_parameters,
            grouped_parameters: repr.grouped_parameters,
            partial_body: repr.partial_body,
        };
        let mut options = Self::default().merged(&policy);
        options.param_engine.apply(&repr.param_engine);
        options.body_engine.apply(&repr.body_engine);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_defaults() {
        let options: RevaOptions = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(options, RevaOptions::default());
        assert_eq!(
            options.allow_additional_parameters,
            AdditionalParameters::Only(vec![Location::Header, Location::Cookie])
        );
        assert!(options.grouped_parameters.is_empty());
        assert!(!options.partial_body);
        assert!(options.param_engine.coerce_types);
        assert!(!options.body_engine.coerce_types);
    }

    #[test]
    fn deserialize_full() {
        let yaml = r"
allow_additional_parameters: true
grouped_parameters: [path, query]
partial_body: true
param_engine:
  all_errors: false
body_engine:
  validate_formats: true
  draft: draft2020-12
";
        let options: RevaOptions = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(options.allow_additional_parameters, AdditionalParameters::All);
        assert_eq!(
            options.grouped_parameters,
            vec![Location::Path, Location::Query]
        );
        assert!(options.partial_body);
        // Partial engine sections keep the remaining defaults
        assert!(options.param_engine.coerce_types);
        assert!(!options.param_engine.all_errors);
        assert!(options.body_engine.validate_formats);
        assert!(!options.body_engine.coerce_types);
        assert_eq!(options.body_engine.draft, Draft::Draft202012);
    }

    #[test]
    fn deserialize_camel_case_keys() {
        let json = r#"{"allowAdditionalParameters": ["cookie"], "partialBody": true}"#;
        let options: RevaOptions = serde_yaml_ng::from_str(json).unwrap();
        assert_eq!(
            options.allow_additional_parameters,
            AdditionalParameters::Only(vec![Location::Cookie])
        );
        assert!(options.partial_body);
    }

    #[test]
    fn false_allows_nothing() {
        let options: RevaOptions =
            serde_yaml_ng::from_str("allow_additional_parameters: false").unwrap();
        for location in Location::ALL {
            assert!(!options.allow_additional_parameters.allows(location));
        }
    }

    #[test]
    fn unknown_location_is_rejected() {
        let result: Result<RevaOptions, _> =
            serde_yaml_ng::from_str("grouped_parameters: [body]");
        assert!(result.is_err());
    }

    #[test]
    fn overrides_merge_shallowly() {
        let base = RevaOptions::default().grouped_parameters(&[Location::Query]);
        let merged = base.merged(&RevaOverrides::default().partial_body(true));
        assert!(merged.partial_body);
        assert_eq!(merged.grouped_parameters, vec![Location::Query]);
        assert_eq!(
            merged.allow_additional_parameters,
            AdditionalParameters::default()
        );

        let merged = base.merged(&RevaOverrides::default().grouped_parameters(&[]));
        assert!(merged.grouped_parameters.is_empty());
    }

    #[test]
    fn additional_parameters_serializes_like_it_parses() {
        assert_eq!(
            serde_json::to_value(AdditionalParameters::All).unwrap(),
            serde_json::json!(true)
        );
        assert_eq!(
            serde_json::to_value(AdditionalParameters::default()).unwrap(),
            serde_json::json!(["header", "cookie"])
        );
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("reva-options-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reva.yaml");
        std::fs::write(&path, "partial_body: true\ngrouped_parameters: [query]\n").unwrap();

        let options = RevaOptions::load(&path).unwrap();
        assert!(options.partial_body);
        assert_eq!(options.grouped_parameters, vec![Location::Query]);
        // Defaults still apply
        assert!(options.param_engine.coerce_types);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let result = RevaOptions::load(Path::new("/nonexistent/reva.yaml"));
        assert!(result.is_err());
    }
}
