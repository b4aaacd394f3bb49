//! Typed error enum for the `reva` library API.
//!
//! Validation failures are not errors: they come back as
//! [`Outcome::Invalid`](crate::Outcome::Invalid). The variants here cover
//! broken inputs the engine cannot work with at all (unreadable option files,
//! schemas the validator refuses to compile). The CLI (`main.rs`) converts
//! these to `anyhow::Error` at the binary boundary.

/// Errors produced by `reva` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading options, operation, or request files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON parsing or serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A synthesized or declared schema could not be compiled.
    ///
    /// Usually means the operation carries a schema that is not valid for the
    /// configured JSON Schema draft (e.g. `exclusiveMinimum: true` under
    /// draft 7).
    #[error("invalid schema for '{base_path}': {message}")]
    InvalidSchema {
        /// Base path of the check that failed (e.g. `request.query`).
        base_path: String,
        /// Compiler diagnostic.
        message: String,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `Error` is `Send + Sync`.
    /// Required for use in async handlers and across thread boundaries.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    };

    #[test]
    fn invalid_schema_display() {
        let err = Error::InvalidSchema {
            base_path: "request.body".to_string(),
            message: "true is not of type \"number\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid schema for 'request.body': true is not of type \"number\""
        );
    }
}
