//! Structural classification of schema nodes.
//!
//! Normalizer rules and parser discriminators both need to know whether a node
//! "looks like" an object or an array. The answer depends on loosely-typed
//! keywords (`properties`, `items`, `type` as a string or list, the legacy
//! `"any"` type), so it is computed here once and consumed everywhere else.

use serde_json::Value;

/// Shape category of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Has `properties`, or `type` names `object`.
    ObjectLike,
    /// Has `items`, or `type` names `array`.
    ArrayLike,
    /// Qualifies as both: `type: "any"`, or a node mixing object and array evidence.
    Both,
    /// Neither object- nor array-like (primitives, combinators, untyped nodes).
    Neither,
}

impl Shape {
    pub fn is_object_like(self) -> bool {
        matches!(self, Shape::ObjectLike | Shape::Both)
    }

    pub fn is_array_like(self) -> bool {
        matches!(self, Shape::ArrayLike | Shape::Both)
    }
}

/// Classify a schema node. Non-object values (boolean schemas, malformed
/// entries) are always [`Shape::Neither`].
pub fn classify(node: &Value) -> Shape {
    let Some(obj) = node.as_object() else {
        return Shape::Neither;
    };

    let any = type_includes(node, "any");
    let object = any || obj.contains_key("properties") || type_includes(node, "object");
    let array = any || obj.contains_key("items") || type_includes(node, "array");

    match (object, array) {
        (true, true) => Shape::Both,
        (true, false) => Shape::ObjectLike,
        (false, true) => Shape::ArrayLike,
        (false, false) => Shape::Neither,
    }
}

/// Whether the node's `type` is `name`, or is a list containing `name`.
pub fn type_includes(node: &Value, name: &str) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}
