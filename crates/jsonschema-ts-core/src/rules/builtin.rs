//! Built-in normalization rules.
//!
//! Order matters: later rules assume the output of earlier ones (e.g. unary
//! `type` arrays are already scalars when tuple materialization runs, and
//! `minItems` has already been defaulted). Every rule checks applicability
//! before mutating and leaves shapes it cannot interpret untouched, which also
//! makes each rule idempotent.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Rule, RuleContext};
use crate::names::file_identifier;
use crate::schema_utils::{ARRAY_KEYWORDS, MAP_KEYWORDS, SINGLE_KEYWORDS};
use crate::shape::classify;

pub const REMOVE_NULL_TYPE_FOR_NULL_ENUM: &str = "remove-null-type-for-null-enum";
pub const DESTRUCTURE_UNARY_TYPES: &str = "destructure-unary-types";
pub const DEFAULT_REQUIRED: &str = "default-required";
pub const REQUIRED_FALSE_TO_EMPTY: &str = "required-false-to-empty";
pub const DEFAULT_ADDITIONAL_PROPERTIES: &str = "default-additional-properties";
pub const DEFAULT_ROOT_ID: &str = "default-root-id";
pub const ESCAPE_BLOCK_COMMENTS: &str = "escape-block-comments";
pub const REMOVE_MIN_MAX_ITEMS: &str = "remove-min-max-items";
pub const DEFAULT_MIN_ITEMS: &str = "default-min-items";
pub const MATERIALIZE_TUPLES: &str = "materialize-tuples";
pub const RENAME_DEFS: &str = "rename-defs";
pub const FOLD_CONST_INTO_ENUM: &str = "fold-const-into-enum";

/// Text fields that end up inside block comments in generated code.
const COMMENT_FIELDS: &[&str] = &["description", "title", "$comment"];

/// Upper bound on the schema nodes a single tuple materialization may produce,
/// counting the nested tuples its entries will expand into. Larger expansions
/// keep the single `items` schema (an ordinary array type).
pub const MAX_MATERIALIZED_NODES: usize = 4096;

/// The built-in rules in application order.
pub fn rules() -> Vec<(&'static str, Rule)> {
    vec![
        (REMOVE_NULL_TYPE_FOR_NULL_ENUM, rule(remove_null_type_for_null_enum)),
        (DESTRUCTURE_UNARY_TYPES, rule(destructure_unary_types)),
        (DEFAULT_REQUIRED, rule(default_required)),
        (REQUIRED_FALSE_TO_EMPTY, rule(required_false_to_empty)),
        (DEFAULT_ADDITIONAL_PROPERTIES, rule(default_additional_properties)),
        (DEFAULT_ROOT_ID, rule(default_root_id)),
        (ESCAPE_BLOCK_COMMENTS, rule(escape_block_comments)),
        (REMOVE_MIN_MAX_ITEMS, rule(remove_min_max_items)),
        (DEFAULT_MIN_ITEMS, rule(default_min_items)),
        (MATERIALIZE_TUPLES, rule(materialize_tuples)),
        (RENAME_DEFS, rule(rename_defs)),
        (FOLD_CONST_INTO_ENUM, rule(fold_const_into_enum)),
    ]
}

fn rule(f: fn(&mut Value, &RuleContext<'_>)) -> Rule {
    Arc::new(f)
}

/// `enum` already encodes nullability; a `"null"` entry in a `type` list would
/// duplicate it. `const: null` counts too, since it becomes `enum: [null]`.
pub fn remove_null_type_for_null_enum(node: &mut Value, _ctx: &RuleContext<'_>) {
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    let enum_has_null = obj
        .get("enum")
        .and_then(Value::as_array)
        .is_some_and(|values| values.iter().any(Value::is_null));
    if !enum_has_null && obj.get("const") != Some(&Value::Null) {
        return;
    }
    if let Some(Value::Array(types)) = obj.get_mut("type") {
        types.retain(|t| t.as_str() != Some("null"));
    }
}

/// `type: ["string"]` → `type: "string"`.
pub fn destructure_unary_types(node: &mut Value, _ctx: &RuleContext<'_>) {
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if let Some(Value::Array(types)) = obj.get_mut("type") {
        if types.len() == 1 {
            let sole = types.remove(0);
            obj.insert("type".to_string(), sole);
        }
    }
}

pub fn default_required(node: &mut Value, _ctx: &RuleContext<'_>) {
    let object_like = classify(node).is_object_like();
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if object_like && !obj.contains_key("required") {
        obj.insert("required".to_string(), Value::Array(Vec::new()));
    }
}

/// Draft 3 allowed `required: false`; later drafts expect a list.
pub fn required_false_to_empty(node: &mut Value, _ctx: &RuleContext<'_>) {
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if obj.get("required") == Some(&Value::Bool(false)) {
        obj.insert("required".to_string(), Value::Array(Vec::new()));
    }
}

/// Open-world default: object-like nodes without `additionalProperties` or
/// `patternProperties` accept additional properties. A caller rule registered
/// under the same name can replace this policy.
pub fn default_additional_properties(node: &mut Value, _ctx: &RuleContext<'_>) {
    let object_like = classify(node).is_object_like();
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if object_like
        && !obj.contains_key("additionalProperties")
        && !obj.contains_key("patternProperties")
    {
        obj.insert("additionalProperties".to_string(), Value::Bool(true));
    }
}

pub fn default_root_id(node: &mut Value, ctx: &RuleContext<'_>) {
    if !ctx.is_root {
        return;
    }
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if !obj.contains_key("id") && !obj.contains_key("$id") {
        obj.insert(
            "id".to_string(),
            Value::String(file_identifier(ctx.file_name)),
        );
    }
}

/// `*/` would close the block comment a renderer wraps descriptions in.
pub fn escape_block_comments(node: &mut Value, _ctx: &RuleContext<'_>) {
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    for field in COMMENT_FIELDS {
        if let Some(Value::String(text)) = obj.get_mut(*field) {
            if text.contains("*/") {
                *text = text.replace("*/", "*\\/");
            }
        }
    }
}

pub fn remove_min_max_items(node: &mut Value, ctx: &RuleContext<'_>) {
    if !ctx.options.ignore_min_and_max_items {
        return;
    }
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    obj.remove("minItems");
    obj.remove("maxItems");
}

/// `maxItems` is never defaulted: `maxItems: 0` is meaningful on its own.
pub fn default_min_items(node: &mut Value, ctx: &RuleContext<'_>) {
    if ctx.options.ignore_min_and_max_items {
        return;
    }
    let array_like = classify(node).is_array_like();
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if array_like && !obj.get("minItems").is_some_and(Value::is_number) {
        obj.insert("minItems".to_string(), Value::from(0));
    }
}

/// Expand a bounded single-schema `items` into a tuple of that schema, and
/// truncate tuple `items` that declare more entries than `maxItems` allows.
pub fn materialize_tuples(node: &mut Value, ctx: &RuleContext<'_>) {
    if ctx.options.ignore_min_and_max_items {
        return;
    }
    let Some(obj) = node.as_object_mut() else {
        return;
    };

    if let Some((arity, open)) = planned_tuple(obj) {
        if let Some(items) = obj.get_mut("items") {
            let single = std::mem::take(items);
            *items = Value::Array(vec![single.clone(); arity]);
            if open {
                obj.insert("additionalItems".to_string(), single);
            }
        }
    }

    let max_items = obj.get("maxItems").and_then(non_negative_int);
    if let (Some(max), Some(Value::Array(items))) = (max_items, obj.get_mut("items")) {
        items.truncate(max);
    }
}

/// Arity a bounded single-schema `items` expands to, and whether the tuple
/// stays open (no `maxItems`). Ignores the node budget.
fn requested_tuple(obj: &Map<String, Value>) -> Option<(usize, bool)> {
    if !obj.get("items").is_some_and(Value::is_object) {
        return None;
    }
    let max_items = obj.get("maxItems").and_then(non_negative_int);
    let min_items = obj
        .get("minItems")
        .and_then(non_negative_int)
        .filter(|n| *n > 0);
    if max_items.is_none() && min_items.is_none() {
        return None;
    }
    let arity = max_items.filter(|n| *n > 0).or(min_items).unwrap_or(0);
    Some((arity.min(max_items.unwrap_or(usize::MAX)), max_items.is_none()))
}

/// [`requested_tuple`] within [`MAX_MATERIALIZED_NODES`].
fn planned_tuple(obj: &Map<String, Value>) -> Option<(usize, bool)> {
    let (arity, open) = requested_tuple(obj)?;
    let single = obj.get("items").map_or(0, expanded_size);
    (arity.saturating_mul(single) <= MAX_MATERIALIZED_NODES).then_some((arity, open))
}

/// Schema nodes in `node`'s subtree once tuple materialization and the `$defs`
/// merge have run over it. Counts exactly what the normalizer traverses.
fn expanded_size(node: &Value) -> usize {
    let Some(obj) = node.as_object() else {
        return 0;
    };
    let mut size: usize = 1;

    // Materialization decisions mirror `planned_tuple`, sharing one subtree count.
    let planned = requested_tuple(obj).and_then(|(arity, open)| {
        let single = obj.get("items").map_or(0, expanded_size);
        let entries = arity.saturating_mul(single);
        (entries <= MAX_MATERIALIZED_NODES).then(|| (entries, open.then_some(single)))
    });

    let defs = obj.get("$defs").and_then(Value::as_object);
    for keyword in MAP_KEYWORDS {
        if let Some(Value::Object(map)) = obj.get(*keyword) {
            for (key, child) in map {
                // `$defs` entries replace same-named `definitions` entries.
                if *keyword == "definitions" && defs.is_some_and(|d| d.contains_key(key)) {
                    continue;
                }
                size = size.saturating_add(expanded_size(child));
            }
        }
    }

    for keyword in SINGLE_KEYWORDS {
        let replaced = *keyword == "additionalItems"
            && planned.is_some_and(|(_, rest)| rest.is_some());
        if !replaced {
            size = size.saturating_add(obj.get(*keyword).map_or(0, expanded_size));
        }
    }

    for keyword in ARRAY_KEYWORDS {
        if let Some(Value::Array(children)) = obj.get(*keyword) {
            for child in children {
                size = size.saturating_add(expanded_size(child));
            }
        }
    }

    let items = match (planned, obj.get("items")) {
        (Some((entries, rest)), _) => entries.saturating_add(rest.unwrap_or(0)),
        (None, Some(Value::Array(entries))) => {
            let kept = obj
                .get("maxItems")
                .and_then(non_negative_int)
                .unwrap_or(entries.len());
            entries
                .iter()
                .take(kept)
                .fold(0, |acc: usize, entry| acc.saturating_add(expanded_size(entry)))
        }
        (None, Some(single)) => expanded_size(single),
        (None, None) => 0,
    };
    size.saturating_add(items)
}

/// Merge `$defs` into `definitions`. On a key collision the `$defs` entry wins.
pub fn rename_defs(node: &mut Value, _ctx: &RuleContext<'_>) {
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if !obj.get("$defs").is_some_and(Value::is_object) {
        return;
    }
    let Some(Value::Object(defs)) = obj.remove("$defs") else {
        return;
    };
    match obj.get_mut("definitions") {
        Some(Value::Object(existing)) => existing.extend(defs),
        _ => {
            obj.insert("definitions".to_string(), Value::Object(defs));
        }
    }
}

pub fn fold_const_into_enum(node: &mut Value, _ctx: &RuleContext<'_>) {
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if let Some(value) = obj.remove("const") {
        obj.insert("enum".to_string(), Value::Array(vec![value]));
    }
}

/// Read `minItems`/`maxItems`, accepting integral floats (`2.0`).
fn non_negative_int(value: &Value) -> Option<usize> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .and_then(|n| usize::try_from(n).ok())
}
