//! Grouped parameter validation.
//!
//! Some handlers receive several locations pre-merged into one argument
//! object (e.g. path + query for GraphQL-style resolvers). Grouping folds
//! those locations into a single schema/value pair so they are validated
//! together under `request.parameters`.

use serde_json::{Map, Value};

use crate::model::Location;
use crate::synth::LocationSchema;

/// Base path for errors reported against the merged group.
pub const GROUPED_BASE_PATH: &str = "request.parameters";

/// A location's synthesized schema together with its normalized value.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEntry {
    /// The location.
    pub location: Location,
    /// Synthesized schema.
    pub schema: LocationSchema,
    /// Normalized request values.
    pub value: Map<String, Value>,
}

/// Several locations merged into one schema/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedEntry {
    /// Locations folded into this entry, in validation order.
    pub members: Vec<Location>,
    /// Merged schema.
    pub schema: LocationSchema,
    /// Merged values.
    pub value: Map<String, Value>,
}

/// Fold `entries` into one schema/value pair.
///
/// - `required` lists are concatenated in entry order
/// - `properties` and values are shallow-merged; a later location overwrites
///   a same-named key from an earlier one
/// - `additionalProperties` comes only from `allow_all` (the blanket `true`
///   policy); per-location allow-lists do not apply to the merged object
///
/// Cross-location name collisions are not rejected. They are logged so the
/// shadowing is visible.
#[must_use]
pub fn merge<'a>(
    entries: impl IntoIterator<Item = &'a LocationEntry>,
    allow_all: bool,
) -> GroupedEntry {
    let mut grouped = GroupedEntry {
        members: Vec::new(),
        schema: LocationSchema::new(allow_all),
        value: Map::new(),
    };

    for entry in entries {
        for key in entry.schema.properties.keys() {
            if grouped.schema.properties.contains_key(key) {
                tracing::warn!(
                    property = %key,
                    location = %entry.location,
                    "grouped parameter shadows a property from an earlier location"
                );
            }
        }

        grouped.members.push(entry.location);
        grouped
            .schema
            .required
            .extend(entry.schema.required.iter().cloned());
        grouped.schema.json_encoded.extend(entry.schema.json_encoded.iter().cloned());
        for (key, schema) in &entry.schema.properties {
            grouped.schema.properties.insert(key.clone(), schema.clone());
        }
        for (key, value) in &entry.value {
            grouped.value.insert(key.clone(), value.clone());
        }
    }

    grouped
}

/// Split `entries` into the merged group (when `grouped` is non-empty) and the
/// entries still validated one location at a time.
///
/// The group is produced whenever grouping is configured, even if none of the
/// grouped locations declare parameters; it then validates an empty object.
#[must_use]
pub fn partition(
    entries: Vec<LocationEntry>,
    grouped: &[Location],
    allow_all: bool,
) -> (Option<GroupedEntry>, Vec<LocationEntry>) {
    if grouped.is_empty() {
        return (None, entries);
    }

    let (members, individual): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| grouped.contains(&entry.location));

    (Some(merge(&members, allow_all)), individual)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn entry(location: Location, schema: LocationSchema, value: Value) -> LocationEntry {
        LocationEntry {
            location,
            schema,
            value: value.as_object().cloned().unwrap(),
        }
    }

    fn schema(props: &[(&str, bool)], additional: bool) -> LocationSchema {
        let mut schema = LocationSchema::new(additional);
        for (name, required) in props {
            schema.insert((*name).to_string(), json!({"type": "string"}), *required, false);
        }
        schema
    }

    #[test]
    fn no_grouping_leaves_entries_untouched() {
        let entries = vec![entry(Location::Query, schema(&[("q", true)], false), json!({}))];
        let (group, rest) = partition(entries.clone(), &[], false);
        assert!(group.is_none());
        assert_eq!(rest, entries);
    }

    #[test]
    fn merges_grouped_locations() {
        let entries = vec![
            entry(Location::Header, schema(&[("x-h", false)], true), json!({"x-h": "1"})),
            entry(Location::Path, schema(&[("id", true)], false), json!({"id": "7"})),
            entry(Location::Query, schema(&[("q", true)], false), json!({"q": "a", "extra": "b"})),
        ];

        let (group, rest) = partition(entries, &[Location::Query, Location::Path], false);
        let group = group.unwrap();

        assert_eq!(group.members, vec![Location::Path, Location::Query]);
        assert_eq!(group.schema.required, vec!["id", "q"]);
        assert_eq!(
            group.schema.properties.keys().collect::<Vec<_>>(),
            vec!["id", "q"]
        );
        assert!(!group.schema.additional_properties);
        assert_eq!(
            Value::Object(group.value),
            json!({"id": "7", "q": "a", "extra": "b"})
        );

        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].location, Location::Header);
    }

    #[test]
    fn additional_properties_ignore_per_location_policy() {
        let entries = vec![entry(Location::Cookie, schema(&[("c", false)], true), json!({}))];
        let (group, _) = partition(entries.clone(), &[Location::Cookie], false);
        assert!(!group.unwrap().schema.additional_properties);

        let (group, _) = partition(entries, &[Location::Cookie], true);
        assert!(group.unwrap().schema.additional_properties);
    }

    #[test]
    fn later_location_wins_on_collision() {
        let mut path_schema = LocationSchema::new(false);
        path_schema.insert("id".to_string(), json!({"type": "integer"}), true, false);
        let mut query_schema = LocationSchema::new(false);
        query_schema.insert("id".to_string(), json!({"type": "string"}), false, false);

        let entries = vec![
            entry(Location::Path, path_schema, json!({"id": "1"})),
            entry(Location::Query, query_schema, json!({"id": "2"})),
        ];
        let group = merge(&entries, false);
        assert_eq!(group.schema.property("id"), Some(&json!({"type": "string"})));
        assert_eq!(group.value["id"], "2");
        assert_eq!(group.schema.required, vec!["id"]);
    }

    #[test]
    fn grouping_without_matching_entries_yields_empty_group() {
        let entries = vec![entry(Location::Header, schema(&[], true), json!({}))];
        let (group, rest) = partition(entries, &[Location::Query], false);
        let group = group.unwrap();
        assert!(group.members.is_empty());
        assert!(group.schema.properties.is_empty());
        assert_eq!(rest.len(), 1);
    }
}
