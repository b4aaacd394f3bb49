//! Content-Type parsing and request body media type selection.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::model::MediaType;

/// Media type assumed when the request carries no `Content-Type` header.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// The only wildcard media type recognized when selecting a body schema.
pub const WILDCARD: &str = "*/*";

/// A parsed `Content-Type` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Media type, e.g. `application/json`.
    pub media_type: String,
    /// Parameters, e.g. `charset → utf-8`.
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Parse a `Content-Type` header value.
    ///
    /// Segments are separated by `;` and trimmed. The first is the media
    /// type; the rest are `key=value` parameters (split on the first `=`,
    /// segments without `=` are ignored). Matching is exact, so no case
    /// folding is applied.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut segments = value.split(';').map(str::trim);
        let media_type = segments.next().unwrap_or_default().to_string();
        let parameters = segments
            .filter_map(|segment| segment.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect();

        Self {
            media_type,
            parameters,
        }
    }
}

/// Result of matching a request's media type against declared body content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Negotiated<'a> {
    /// A declared media type matched (exactly, or through `*/*`).
    Matched {
        /// The declared media type key that was selected.
        media_type: &'a str,
        /// Its media type object.
        media: &'a MediaType,
    },
    /// Neither the media type nor `*/*` is declared.
    Unsupported,
}

/// Select the declared media type for `media_type`.
///
/// An exact entry wins over `*/*`; `*/*` matches anything else.
#[must_use]
pub fn negotiate<'a>(content: &'a IndexMap<String, MediaType>, media_type: &str) -> Negotiated<'a> {
    content
        .get_key_value(media_type)
        .or_else(|| content.get_key_value(WILDCARD))
        .map_or(Negotiated::Unsupported, |(key, media)| Negotiated::Matched {
            media_type: key.as_str(),
            media,
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn content(entries: &[(&str, serde_json::Value)]) -> IndexMap<String, MediaType> {
        entries
            .iter()
            .map(|(key, schema)| {
                (
                    (*key).to_string(),
                    MediaType {
                        schema: Some(schema.clone()),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn parse_media_type_only() {
        let ct = ContentType::parse("application/json");
        assert_eq!(ct.media_type, "application/json");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn parse_with_parameters() {
        let ct = ContentType::parse("multipart/form-data; boundary=abc=def ; charset=utf-8");
        assert_eq!(ct.media_type, "multipart/form-data");
        assert_eq!(ct.parameters["boundary"], "abc=def");
        assert_eq!(ct.parameters["charset"], "utf-8");
    }

    #[test]
    fn parse_ignores_malformed_parameters() {
        let ct = ContentType::parse("text/plain; bogus;");
        assert_eq!(ct.media_type, "text/plain");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn parse_empty_value() {
        assert_eq!(ContentType::parse("").media_type, "");
    }

    #[test]
    fn exact_match_wins_over_wildcard() {
        let declared = content(&[
            ("*/*", json!({"type": "string"})),
            ("application/json", json!({"type": "object"})),
        ]);
        match negotiate(&declared, "application/json") {
            Negotiated::Matched { media_type, media } => {
                assert_eq!(media_type, "application/json");
                assert_eq!(media.schema, Some(json!({"type": "object"})));
            }
            Negotiated::Unsupported => panic!("expected a match"),
        }
    }

    #[test]
    fn wildcard_matches_anything() {
        let declared = content(&[("*/*", json!({}))]);
        assert!(matches!(
            negotiate(&declared, "text/csv"),
            Negotiated::Matched { media_type: "*/*", .. }
        ));
    }

    #[test]
    fn subtype_wildcards_are_not_recognized() {
        let declared = content(&[("text/*", json!({}))]);
        assert_eq!(negotiate(&declared, "text/plain"), Negotiated::Unsupported);
    }

    #[test]
    fn unsupported_without_wildcard() {
        let declared = content(&[("application/json", json!({}))]);
        assert_eq!(negotiate(&declared, "application/xml"), Negotiated::Unsupported);
    }
}
