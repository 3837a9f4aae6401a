//! Normalization rules and the ordered registry that holds them.
//!
//! A rule is a named, pure function that rewrites one schema node in place.
//! The normalizer applies each rule to every node of the tree before moving on
//! to the next rule, so rules may rely on the output of earlier rules but never
//! on traversal order within their own pass.
//!
//! The built-in set lives in [`builtin`]; callers extend it by building a new
//! registry with [`RuleRegistry::with`], never by mutating a shared instance.

pub mod builtin;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::CompileOptions;

/// Everything a rule may read besides the node it rewrites.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Snapshot of the whole document as it stood when the current rule's pass began.
    pub root: &'a Value,
    /// Caller-supplied file identifier (used to derive the root `id`).
    pub file_name: &'a str,
    pub options: &'a CompileOptions,
    /// True only for the entry node of the traversal.
    pub is_root: bool,
}

/// A normalization rule: `(node, context) -> ()`, mutating `node` in place.
pub type Rule = Arc<dyn Fn(&mut Value, &RuleContext<'_>) + Send + Sync>;

/// Ordered sequence of named rules.
///
/// Iteration order equals registration order. Registering a name that is
/// already present replaces that rule at its original position.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<(String, Rule)>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule set, in dependency order.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, rule) in builtin::rules() {
            registry.insert(name.to_string(), rule);
        }
        registry
    }

    /// Append `rule` under `name`, or replace the rule already registered
    /// under that name without moving it.
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F) -> &mut Self
    where
        F: Fn(&mut Value, &RuleContext<'_>) + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(rule));
        self
    }

    fn insert(&mut self, name: String, rule: Rule) {
        match self.rules.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = rule,
            None => self.rules.push((name, rule)),
        }
    }

    /// A new registry holding `self`'s rules followed by `additional`'s.
    /// `self` is left untouched.
    pub fn with(&self, additional: &RuleRegistry) -> Self {
        let mut combined = self.clone();
        for (name, rule) in &additional.rules {
            combined.insert(name.clone(), Arc::clone(rule));
        }
        combined
    }

    /// Rule names in application order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Value, _: &RuleContext<'_>) {}

    #[test]
    fn test_registration_order_is_iteration_order() {
        let mut registry = RuleRegistry::new();
        registry.register("b", noop).register("a", noop).register("c", noop);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_register_existing_name_replaces_in_place() {
        let mut registry = RuleRegistry::new();
        registry.register("first", noop).register("second", noop);
        registry.register("first", |node: &mut Value, _: &RuleContext<'_>| {
            *node = Value::Null;
        });

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["first", "second"]
        );

        let mut node = Value::Bool(true);
        let options = CompileOptions::default();
        let ctx = RuleContext {
            root: &Value::Null,
            file_name: "",
            options: &options,
            is_root: true,
        };
        let (_, rule) = registry.iter().next().unwrap();
        rule(&mut node, &ctx);
        assert_eq!(node, Value::Null);
    }

    #[test]
    fn test_with_leaves_base_untouched() {
        let base = RuleRegistry::builtin();
        let builtin_len = base.len();

        let mut extra = RuleRegistry::new();
        extra.register("custom", noop);

        let combined = base.with(&extra);
        assert_eq!(base.len(), builtin_len);
        assert_eq!(combined.len(), builtin_len + 1);
        assert_eq!(combined.names().last(), Some("custom"));
    }

    #[test]
    fn test_builtin_order() {
        let names: Vec<_> = RuleRegistry::builtin().names().map(String::from).collect();
        assert_eq!(names.len(), 12);
        let pos = |n: &str| names.iter().position(|x| x == n).unwrap();
        assert!(pos(builtin::DESTRUCTURE_UNARY_TYPES) < pos(builtin::MATERIALIZE_TUPLES));
        assert!(pos(builtin::DEFAULT_MIN_ITEMS) < pos(builtin::MATERIALIZE_TUPLES));
        assert_eq!(names.last().map(String::as_str), Some(builtin::FOLD_CONST_INTO_ENUM));
    }
}
