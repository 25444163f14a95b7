//! Resource path construction and its inverse.
//!
//! # Design
//! `PathBuilder` turns `(resource, id?, criteria?)` into the relative path a
//! façade call targets. The storage and file adapters need the reverse
//! direction, so `parse_path` recovers `(key, id, query)` from the same
//! grammar. Query strings follow `encodeURIComponent` rules; mapping order is
//! kept, which relies on `serde_json`'s `preserve_order` feature.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::query::coerce;
use crate::types::Criteria;

/// Characters left untouched by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Keys additionally keep `$` readable.
const KEY: &AsciiSet = &COMPONENT.remove(b'$');

/// Builds resource paths with optional id segment and query string.
///
/// With `traditional` set, array criteria serialize as repeated keys
/// (`tag=a&tag=b`) instead of bracketed ones (`tag%5B%5D=a`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathBuilder {
    traditional: bool,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traditional(traditional: bool) -> Self {
        Self { traditional }
    }

    pub fn is_traditional(&self) -> bool {
        self.traditional
    }

    /// Build the path for `resource`.
    ///
    /// A scalar `id_or_criteria` becomes a path segment and `criteria` is then
    /// serialized as the query string. Field criteria in the second position
    /// take the place of `criteria`. A scalar in the third position becomes a
    /// further path segment.
    pub fn build(
        &self,
        resource: &str,
        id_or_criteria: Option<&Criteria>,
        criteria: Option<&Criteria>,
    ) -> String {
        let has_slash = resource.ends_with('/');
        let trailing = if has_slash { "/" } else { "" };
        let mut path = resource.to_string();
        let mut criteria = criteria;

        match id_or_criteria {
            Some(Criteria::Id(id)) => path = format!("{}{trailing}", join_segment(resource, id)),
            Some(fields @ Criteria::Fields(_)) => criteria = Some(fields),
            None => {}
        }

        match criteria {
            Some(Criteria::Fields(fields)) => {
                let query = build_query_string(fields, self.traditional);
                if !query.is_empty() {
                    path.push('?');
                    path.push_str(&query);
                }
            }
            Some(Criteria::Id(segment)) => {
                if !has_slash {
                    path.push('/');
                }
                path.push_str(segment);
                path.push_str(trailing);
            }
            None => {}
        }

        path
    }
}

/// Non-traditional `PathBuilder::build`.
pub fn build_path(resource: &str, id_or_criteria: Option<&Criteria>, criteria: Option<&Criteria>) -> String {
    PathBuilder::new().build(resource, id_or_criteria, criteria)
}

fn join_segment(resource: &str, segment: &str) -> String {
    if resource.is_empty() {
        return segment.to_string();
    }
    format!("{}/{segment}", resource.trim_end_matches('/'))
}

/// Serialize a mapping as URL-encoded `key=value` pairs joined by `&`.
///
/// `null` values are skipped. Nested mappings use bracketed keys.
pub fn build_query_string(params: &Map<String, Value>, traditional: bool) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        build_param(key, value, traditional, &mut pairs);
    }
    pairs.join("&")
}

fn build_param(key: &str, value: &Value, traditional: bool, pairs: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if traditional {
                    pairs.push(encode_pair(key, item));
                } else {
                    let nested = item.is_object() || item.is_array();
                    let item_key = if nested {
                        format!("{key}[{index}]")
                    } else {
                        format!("{key}[]")
                    };
                    build_param(&item_key, item, traditional, pairs);
                }
            }
        }
        Value::Object(fields) if !traditional => {
            for (name, field) in fields {
                build_param(&format!("{key}[{name}]"), field, traditional, pairs);
            }
        }
        scalar => pairs.push(encode_pair(key, scalar)),
    }
}

fn encode_pair(key: &str, value: &Value) -> String {
    format!(
        "{}={}",
        utf8_percent_encode(key, KEY),
        utf8_percent_encode(&coerce(value), COMPONENT)
    )
}

/// Join a relative path onto a base URL with exactly one separating slash.
///
/// Absolute URLs are returned unchanged.
pub fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() || path.contains("://") {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// A request path split back into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPath {
    /// The resource name, e.g. `posts`.
    pub key: String,
    /// Everything after the resource name, e.g. `3`.
    pub id: Option<String>,
    /// Decoded query parameters, in order of appearance.
    pub query: Map<String, Value>,
}

impl ParsedPath {
    /// The id and query merged into one field criteria mapping.
    pub fn criteria(&self) -> Map<String, Value> {
        let mut criteria = self.query.clone();
        if let Some(id) = &self.id {
            criteria.insert("id".to_string(), Value::String(id.clone()));
        }
        criteria
    }
}

/// Split `resource[/id][?query]`.
///
/// The first segment is the resource key. Any remaining segments form the
/// id. Repeated query keys keep their last value.
pub fn parse_path(path: &str) -> ParsedPath {
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path, ""),
    };

    let trimmed = path.trim_matches('/');
    let (key, id) = match trimmed.split_once('/') {
        Some((key, rest)) if !rest.is_empty() => (key, Some(rest.to_string())),
        Some((key, _)) => (key, None),
        None => (trimmed, None),
    };

    let query = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();

    ParsedPath {
        key: key.to_string(),
        id,
        query,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Criteria {
        Criteria::from(value)
    }

    #[test]
    fn resource_only() {
        assert_eq!(build_path("posts", None, None), "posts");
    }

    #[test]
    fn scalar_id_is_appended() {
        assert_eq!(build_path("posts", Some(&Criteria::from(5)), None), "posts/5");
        assert_eq!(build_path("posts", Some(&Criteria::from("abc")), None), "posts/abc");
    }

    #[test]
    fn trailing_slash_survives_id() {
        assert_eq!(build_path("posts/", Some(&Criteria::from(5)), None), "posts/5/");
    }

    #[test]
    fn criteria_in_second_position_is_query() {
        let c = fields(json!({"user": "john", "page": 2}));
        assert_eq!(build_path("posts", Some(&c), None), "posts?user=john&page=2");
    }

    #[test]
    fn id_then_criteria() {
        let c = fields(json!({"expand": "author"}));
        assert_eq!(build_path("posts", Some(&Criteria::from(1)), Some(&c)), "posts/1?expand=author");
    }

    #[test]
    fn scalar_criteria_is_extra_segment() {
        let path = build_path("posts", Some(&Criteria::from(1)), Some(&Criteria::from("comments")));
        assert_eq!(path, "posts/1/comments");
        let path = build_path("posts/", Some(&Criteria::from(1)), Some(&Criteria::from("comments")));
        assert_eq!(path, "posts/1/comments/");
    }

    #[test]
    fn empty_criteria_adds_nothing() {
        assert_eq!(build_path("posts", Some(&fields(json!({}))), None), "posts");
    }

    #[test]
    fn query_values_are_encoded() {
        let c = fields(json!({"q": "a b&c", "skip": null}));
        assert_eq!(build_path("search", Some(&c), None), "search?q=a%20b%26c");
    }

    #[test]
    fn arrays_bracketed_unless_traditional() {
        let c = fields(json!({"tag": ["a", "b"]}));
        assert_eq!(build_path("posts", Some(&c), None), "posts?tag%5B%5D=a&tag%5B%5D=b");
        let traditional = PathBuilder::traditional(true);
        assert_eq!(traditional.build("posts", Some(&c), None), "posts?tag=a&tag=b");
    }

    #[test]
    fn nested_mappings_use_bracket_keys() {
        let c = fields(json!({"filter": {"age": 30}}));
        assert_eq!(build_path("users", Some(&c), None), "users?filter%5Bage%5D=30");
    }

    #[test]
    fn join_url_uses_single_slash() {
        assert_eq!(join_url("http://api.test/", "/posts"), "http://api.test/posts");
        assert_eq!(join_url("http://api.test", "posts/1/"), "http://api.test/posts/1/");
        assert_eq!(join_url("", "posts"), "posts");
        assert_eq!(join_url("http://api.test", "https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn parse_path_inverts_build() {
        let parsed = parse_path("posts/3?user=john&x=a%20b");
        assert_eq!(parsed.key, "posts");
        assert_eq!(parsed.id.as_deref(), Some("3"));
        assert_eq!(Value::Object(parsed.query.clone()), json!({"user": "john", "x": "a b"}));
        assert_eq!(
            Value::Object(parsed.criteria()),
            json!({"user": "john", "x": "a b", "id": "3"})
        );
    }

    #[test]
    fn parse_path_without_id_or_query() {
        let parsed = parse_path("/posts/");
        assert_eq!(parsed.key, "posts");
        assert!(parsed.id.is_none());
        assert!(parsed.query.is_empty());
    }
}
