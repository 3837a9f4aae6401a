//! Identifier derivation for named types and enum members.

use std::path::Path;

use heck::ToUpperCamelCase;
use serde_json::Value;

/// Fallback identifier when a file name yields no usable characters.
pub const DEFAULT_ROOT_NAME: &str = "Schema";

/// Convert arbitrary text into an identifier-safe UpperCamelCase name.
///
/// Non-alphanumeric characters act as word boundaries and are dropped; a
/// leading digit is prefixed with `_`. May return an empty string.
///
/// # Example
/// ```
/// use jsonschema_ts_core::names::to_safe_string;
/// assert_eq!(to_safe_string("user-profile.v2"), "UserProfileV2");
/// assert_eq!(to_safe_string("3d point"), "_3dPoint");
/// ```
pub fn to_safe_string(input: &str) -> String {
    let mut name = input.to_upper_camel_case();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Identifier for a whole document, derived from its file name (directory and
/// extension stripped).
pub fn file_identifier(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = to_safe_string(stem);
    if name.is_empty() {
        DEFAULT_ROOT_NAME.to_string()
    } else {
        name
    }
}

/// Member name for an enum value when no explicit names were supplied.
pub fn enum_member_name(value: &Value, index: usize) -> String {
    let name = match value {
        Value::String(s) => to_safe_string(s),
        Value::Number(n) => format!(
            "Value{}",
            n.to_string().replace('-', "Minus").replace(['.', '+'], "_")
        ),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "Null".to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    };
    if name.is_empty() {
        format!("Member{index}")
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_safe_string() {
        assert_eq!(to_safe_string("foo_bar"), "FooBar");
        assert_eq!(to_safe_string("$ref"), "Ref");
        assert_eq!(to_safe_string("1st"), "_1st");
        assert_eq!(to_safe_string("***"), "");
    }

    #[test]
    fn test_file_identifier() {
        assert_eq!(file_identifier("schemas/my-schema.json"), "MySchema");
        assert_eq!(file_identifier("person.schema.json"), "PersonSchema");
        assert_eq!(file_identifier(""), DEFAULT_ROOT_NAME);
        assert_eq!(file_identifier("---.json"), DEFAULT_ROOT_NAME);
    }

    #[test]
    fn test_enum_member_names() {
        assert_eq!(enum_member_name(&json!("dark red"), 0), "DarkRed");
        assert_eq!(enum_member_name(&json!(-1.5), 1), "ValueMinus1_5");
        assert_eq!(enum_member_name(&json!(null), 2), "Null");
        assert_eq!(enum_member_name(&json!("!"), 3), "Member3");
        assert_eq!(enum_member_name(&json!({ "a": 1 }), 4), "Member4");
    }
}
