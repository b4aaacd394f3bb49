//! Request builder: bridges axum HTTP requests to [`RevaRequest`].

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use http::request::Parts;
use http::{HeaderMap, Uri};
use serde_json::{Map, Value};

use reva::RevaRequest;

/// Decode the query string of `uri`.
///
/// A key given once maps to a string; a repeated key maps to an array of
/// strings in request order.
///
/// # Errors
///
/// Returns the axum [`QueryRejection`] if the query string cannot be decoded.
pub fn query_parameters(uri: &Uri) -> Result<Map<String, Value>, QueryRejection> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)?;

    let mut params = Map::new();
    for (key, value) in pairs {
        match params.get_mut(&key) {
            None => {
                params.insert(key, Value::String(value));
            }
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    Ok(params)
}

/// Flatten a [`HeaderMap`] into `name → string`.
///
/// Repeated headers are joined with `, `, except `cookie`, whose values are
/// joined with `; ` so they parse as one cookie list. Values that are not
/// visible ASCII are skipped rather than rejected.
#[must_use]
pub fn header_values(headers: &HeaderMap) -> Map<String, Value> {
    headers
        .keys()
        .filter_map(|name| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            if values.is_empty() {
                return None;
            }
            let separator = if name == http::header::COOKIE { "; " } else { ", " };
            Some((name.as_str().to_string(), Value::String(values.join(separator))))
        })
        .collect()
}

/// Build a [`RevaRequest`] from request parts, matched path parameters and
/// an already-decoded body.
///
/// Path parameters come from the router (e.g. `Path<HashMap<String,
/// String>>`), since the parts alone do not know the route template.
///
/// # Errors
///
/// Returns the axum [`QueryRejection`] if the query string cannot be decoded.
///
/// # Examples
///
/// ```
/// use reva_axum::request_from_parts;
///
/// let (parts, ()) = http::Request::builder()
///     .uri("/users/7?expand=team&expand=roles")
///     .header("X-Trace", "abc")
///     .body(())
///     .unwrap()
///     .into_parts();
///
/// let request = request_from_parts(&parts, [("id", "7")], None).unwrap();
/// assert_eq!(request.path_parameters["id"], "7");
/// assert_eq!(request.query_parameters["expand"], serde_json::json!(["team", "roles"]));
/// assert_eq!(request.headers["x-trace"], "abc");
/// ```
pub fn request_from_parts<K, V>(
    parts: &Parts,
    path_params: impl IntoIterator<Item = (K, V)>,
    body: Option<Value>,
) -> Result<RevaRequest, QueryRejection>
where
    K: Into<String>,
    V: Into<String>,
{
    request_from_http(&parts.uri, &parts.headers, path_params, body)
}

/// Like [`request_from_parts`], for handlers that extract [`Uri`] and
/// [`HeaderMap`] separately.
///
/// # Errors
///
/// Returns the axum [`QueryRejection`] if the query string cannot be decoded.
pub fn request_from_http<K, V>(
    uri: &Uri,
    headers: &HeaderMap,
    path_params: impl IntoIterator<Item = (K, V)>,
    body: Option<Value>,
) -> Result<RevaRequest, QueryRejection>
where
    K: Into<String>,
    V: Into<String>,
{
    Ok(RevaRequest {
        query_parameters: query_parameters(uri)?,
        path_parameters: path_params
            .into_iter()
            .map(|(key, value)| (key.into(), Value::String(value.into())))
            .collect(),
        headers: header_values(headers),
        body,
    })
}
