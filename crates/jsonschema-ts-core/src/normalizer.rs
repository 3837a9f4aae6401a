//! Schema normalization.
//!
//! Canonicalizes a schema tree before type inference by running every rule of
//! a [`RuleRegistry`] over a deep copy of the input. Each rule gets one full
//! pre-order pass over the tree before the next rule starts; only the entry
//! node of the traversal is marked as the document root.
//!
//! Normalization is total: rules leave shapes they cannot interpret alone, so
//! there is no error path. The caller's schema is never mutated.

use serde_json::Value;

use crate::config::CompileOptions;
use crate::rules::{Rule, RuleContext, RuleRegistry};
use crate::schema_utils::for_each_child_mut;

/// Normalize `schema` with the built-in rules.
///
/// `file_name` identifies the document; the root `id` is derived from it when
/// the schema does not declare one.
pub fn normalize(schema: &Value, file_name: &str, options: &CompileOptions) -> Value {
    normalize_with_rules(schema, file_name, options, &RuleRegistry::builtin())
}

/// Normalize `schema` with an explicit rule set.
///
/// To append caller rules after the built-ins, pass
/// `RuleRegistry::builtin().with(&extra)`.
pub fn normalize_with_rules(
    schema: &Value,
    file_name: &str,
    options: &CompileOptions,
    rules: &RuleRegistry,
) -> Value {
    let mut root = schema.clone();

    for (name, rule) in rules.iter() {
        tracing::debug!(rule = name, "applying normalization rule");
        let snapshot = root.clone();
        let ctx = RuleContext {
            root: &snapshot,
            file_name,
            options,
            is_root: true,
        };
        apply_rule(&mut root, rule, &ctx);
    }

    root
}

/// Pre-order: the rule sees a node before its children are collected, so
/// children the rule adds (e.g. materialized tuple entries) are visited too.
fn apply_rule(node: &mut Value, rule: &Rule, ctx: &RuleContext<'_>) {
    rule(node, ctx);

    let Some(obj) = node.as_object_mut() else {
        return;
    };
    let child_ctx = RuleContext {
        is_root: false,
        ..*ctx
    };
    for_each_child_mut(obj, &mut |child| apply_rule(child, rule, &child_ctx));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn run(input: Value) -> Value {
        normalize(&input, "test.json", &CompileOptions::default())
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = json!({ "type": ["string"], "const": "a" });
        let before = input.clone();
        let _ = run(input.clone());
        assert_eq!(input, before);
    }

    #[test]
    fn test_rules_reach_nested_nodes() {
        let output = run(json!({
            "properties": {
                "a": { "type": ["string"] },
                "b": { "items": { "const": 1 } }
            },
            "definitions": { "D": { "properties": {} } },
            "anyOf": [{ "type": ["number"] }],
            "not": { "required": false, "properties": {} }
        }));

        assert_eq!(output["properties"]["a"]["type"], json!("string"));
        assert_eq!(output["properties"]["b"]["items"]["enum"], json!([1]));
        assert_eq!(output["definitions"]["D"]["required"], json!([]));
        assert_eq!(output["anyOf"][0]["type"], json!("number"));
        assert_eq!(output["not"]["required"], json!([]));
    }

    #[test]
    fn test_only_entry_node_is_root() {
        let output = run(json!({
            "properties": { "child": { "type": "object" } }
        }));
        assert_eq!(output["id"], json!("Test"));
        assert!(output["properties"]["child"].get("id").is_none());
    }

    #[test]
    fn test_materialized_entries_are_visited_in_same_pass() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mut extra = RuleRegistry::new();
        extra.register("count-strings", move |node: &mut Value, _: &RuleContext<'_>| {
            if node.get("type") == Some(&json!("string")) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        let rules = RuleRegistry::builtin().with(&extra);
        let output = normalize_with_rules(
            &json!({ "items": { "type": "string" }, "minItems": 3 }),
            "t.json",
            &CompileOptions::default(),
            &rules,
        );

        assert_eq!(output["items"].as_array().map(Vec::len), Some(3));
        // Three tuple entries plus the open-ended `additionalItems` tail.
        assert_eq!(seen.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_each_rule_completes_a_pass_before_the_next() {
        let mut rules = RuleRegistry::new();
        rules
            .register("mark", |node: &mut Value, _: &RuleContext<'_>| {
                if let Some(obj) = node.as_object_mut() {
                    obj.insert("marked".to_string(), json!(true));
                }
            })
            .register("check", |node: &mut Value, ctx: &RuleContext<'_>| {
                // Every node in the snapshot must already carry the mark.
                let child_marked = ctx.root["properties"]["a"]["marked"] == json!(true);
                if let Some(obj) = node.as_object_mut() {
                    obj.insert("saw_marked_child".to_string(), json!(child_marked));
                }
            });

        let output = normalize_with_rules(
            &json!({ "properties": { "a": {} } }),
            "t.json",
            &CompileOptions::default(),
            &rules,
        );
        assert_eq!(output["saw_marked_child"], json!(true));
        assert_eq!(output["properties"]["a"]["saw_marked_child"], json!(true));
    }

    #[test]
    fn test_custom_rule_replacing_builtin_keeps_position() {
        let mut overrides = RuleRegistry::new();
        overrides.register(
            crate::rules::builtin::DEFAULT_ADDITIONAL_PROPERTIES,
            |node: &mut Value, _: &RuleContext<'_>| {
                if crate::shape::classify(node).is_object_like() {
                    if let Some(obj) = node.as_object_mut() {
                        obj.entry("additionalProperties").or_insert(json!(false));
                    }
                }
            },
        );
        let rules = RuleRegistry::builtin().with(&overrides);
        assert_eq!(rules.len(), RuleRegistry::builtin().len());

        let output = normalize_with_rules(
            &json!({ "type": "object" }),
            "t.json",
            &CompileOptions::default(),
            &rules,
        );
        assert_eq!(output["additionalProperties"], json!(false));
    }
}
