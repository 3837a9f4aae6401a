//! Shared schema utilities for consistent traversal and path construction.
//!
//! Provides two concerns used by both the normalizer and the parser:
//! 1. **JSON Pointer handling** (RFC 6901) for error paths and local `$ref` lookup
//! 2. **Shared traversal** that visits every schema-bearing child the same way
//!
//! ## Cross-Reference
//!
//! The parser does not walk children generically (each discriminator reads the
//! keywords it owns). When adding keywords to [`for_each_child_mut`], check
//! whether `parser.rs` needs to interpret them too.

use std::borrow::Cow;

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// JSON Pointer escaping (RFC 6901)
// ---------------------------------------------------------------------------

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a JSON Pointer path by appending segments to a parent path.
///
/// # Example
/// ```
/// use jsonschema_ts_core::build_path;
/// assert_eq!(build_path("#", &["properties", "a/b"]), "#/properties/a~1b");
/// ```
pub fn build_path(parent: &str, segments: &[&str]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_pointer_segment(segment));
    }
    path
}

/// Unescape a single path segment per RFC 6901.
///
/// Order matters: unescape `~1` first to avoid double-unescaping.
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains("~0") || segment.contains("~1") {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Split a JSON Pointer path into decoded segments.
///
/// Strips the leading `#` fragment identifier (if present), splits on `/`,
/// and unescapes each segment.
///
/// # Example
/// ```
/// use jsonschema_ts_core::split_path;
/// assert_eq!(split_path("#/definitions/a~1b"), vec!["definitions", "a/b"]);
/// assert_eq!(split_path("#"), Vec::<String>::new());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    let stripped = path.strip_prefix('#').unwrap_or(path);

    if stripped.is_empty() {
        return Vec::new();
    }

    let mut segments_iter = stripped.split('/');

    // A leading "/" yields an empty first segment that stands for the root.
    if stripped.starts_with('/') {
        segments_iter.next();
    }

    segments_iter
        .map(|s| unescape_pointer_segment(s).into_owned())
        .collect()
}

/// Resolve a local JSON Pointer (`#`, `#/definitions/Foo`, ...) against a document.
pub fn resolve_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer != "#" && !pointer.starts_with("#/") {
        return None;
    }

    let mut current = root;
    for segment in split_path(pointer) {
        current = match current {
            Value::Object(obj) => obj.get(&segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

// ---------------------------------------------------------------------------
// Shared schema traversal
// ---------------------------------------------------------------------------

/// Keywords whose value is a map from names to child schemas.
pub const MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "definitions", "$defs"];

/// Keywords whose value is a single child schema (or a boolean).
pub const SINGLE_KEYWORDS: &[&str] = &["additionalProperties", "additionalItems", "not"];

/// Keywords whose value is an ordered list of child schemas.
pub const ARRAY_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf"];

/// Call `visit` on every object-valued child schema of `obj`.
///
/// # Keywords visited
///
/// | Category    | Keywords                                               |
/// |-------------|--------------------------------------------------------|
/// | Object      | `properties`, `patternProperties`, `additionalProperties` |
/// | Array       | `items` (object + array), `additionalItems`            |
/// | Combinators | `allOf`, `anyOf`, `oneOf`, `not`                       |
/// | Definitions | `definitions`, `$defs`                                 |
///
/// Non-schema values (`additionalProperties: false`, `items: true`, a
/// malformed `anyOf: 42`) are left alone.
pub fn for_each_child_mut(obj: &mut Map<String, Value>, visit: &mut dyn FnMut(&mut Value)) {
    for keyword in MAP_KEYWORDS {
        if let Some(Value::Object(map)) = obj.get_mut(*keyword) {
            for child in map.values_mut().filter(|v| v.is_object()) {
                visit(child);
            }
        }
    }

    for keyword in SINGLE_KEYWORDS {
        if let Some(child) = obj.get_mut(*keyword).filter(|v| v.is_object()) {
            visit(child);
        }
    }

    for keyword in ARRAY_KEYWORDS {
        if let Some(Value::Array(children)) = obj.get_mut(*keyword) {
            for child in children.iter_mut().filter(|v| v.is_object()) {
                visit(child);
            }
        }
    }

    if let Some(items) = obj.get_mut("items") {
        if items.is_object() {
            visit(items);
        } else if let Value::Array(entries) = items {
            for child in entries.iter_mut().filter(|v| v.is_object()) {
                visit(child);
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_no_special() {
        let result = escape_pointer_segment("foo");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "foo");
    }

    #[test]
    fn test_escape_both() {
        assert_eq!(escape_pointer_segment("~/"), "~0~1");
    }

    #[test]
    fn test_build_path_escaping() {
        assert_eq!(build_path("#", &["properties", "a/b"]), "#/properties/a~1b");
        assert_eq!(build_path("#", &[]), "#");
    }

    #[test]
    fn test_escape_unescape_roundtrip() {
        let original = "my/key~with~special/chars";
        let escaped = escape_pointer_segment(original);
        assert_eq!(unescape_pointer_segment(&escaped), original);
    }

    #[test]
    fn test_split_path_with_escapes() {
        assert_eq!(
            split_path("#/properties/a~1b/items"),
            vec!["properties", "a/b", "items"]
        );
        assert_eq!(split_path("#/"), vec![""]);
    }

    #[test]
    fn test_resolve_pointer() {
        let doc = json!({
            "definitions": { "A": { "type": "string" } },
            "items": [{ "type": "integer" }]
        });
        assert_eq!(
            resolve_pointer(&doc, "#/definitions/A"),
            Some(&json!({ "type": "string" }))
        );
        assert_eq!(
            resolve_pointer(&doc, "#/items/0"),
            Some(&json!({ "type": "integer" }))
        );
        assert_eq!(resolve_pointer(&doc, "#"), Some(&doc));
        assert_eq!(resolve_pointer(&doc, "#/definitions/B"), None);
        assert_eq!(resolve_pointer(&doc, "other.json#/A"), None);
    }

    #[test]
    fn test_visits_all_keywords() {
        let mut schema = json!({
            "properties": { "a": { "type": "string" } },
            "patternProperties": { "^x-": { "type": "string" } },
            "additionalProperties": { "type": "integer" },
            "items": [{ "type": "string" }, { "type": "number" }],
            "additionalItems": { "type": "null" },
            "anyOf": [{ "type": "string" }],
            "oneOf": [{ "type": "integer" }],
            "allOf": [{ "type": "boolean" }],
            "not": { "type": "null" },
            "$defs": { "Foo": { "type": "string" } },
            "definitions": { "Bar": { "type": "integer" } }
        });
        let mut count = 0;
        for_each_child_mut(schema.as_object_mut().unwrap(), &mut |_| count += 1);
        assert_eq!(count, 12);
    }

    #[test]
    fn test_skips_non_schema_values() {
        let mut schema = json!({
            "additionalProperties": false,
            "items": true,
            "anyOf": "invalid",
            "definitions": 42
        });
        let before = schema.clone();
        let mut count = 0;
        for_each_child_mut(schema.as_object_mut().unwrap(), &mut |_| count += 1);
        assert_eq!(count, 0);
        assert_eq!(schema, before);
    }
}
