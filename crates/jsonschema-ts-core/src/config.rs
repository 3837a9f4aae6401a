//! Configuration for schema normalization and parsing.

use serde::{Deserialize, Serialize};

/// Options consumed by the normalizer rules and the type parser.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `ignore-min-and-max-items`,
/// `strict-index-signatures`). Missing fields fall back to [`Default`], so a
/// partial options file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompileOptions {
    /// Drop `minItems`/`maxItems` during normalization, which disables tuple
    /// materialization for bounded arrays.
    pub ignore_min_and_max_items: bool,
    /// Union an explicit `undefined` marker into every synthesized index
    /// signature value type.
    pub strict_index_signatures: bool,
    /// Untyped schemas become `unknown` instead of `any`.
    pub unknown_any: bool,
    /// Mark enums as eligible for constant-enum rendering.
    pub enable_const_enums: bool,
    /// Degrade nodes with no recognizable discriminator to `unknown`/`any`.
    /// When false, such nodes raise [`crate::CompileError::UnrecognizedShape`].
    pub fallback_to_any: bool,
    /// Maximum anonymous nesting depth below a named type (stack overflow guard).
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            ignore_min_and_max_items: false,
            strict_index_signatures: false,
            unknown_any: true,
            enable_const_enums: true,
            fallback_to_any: true,
            max_depth: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_options_serde_round_trip() {
        let opts = CompileOptions {
            ignore_min_and_max_items: true,
            strict_index_signatures: true,
            unknown_any: false,
            enable_const_enums: false,
            fallback_to_any: false,
            max_depth: 12,
        };

        let json = serde_json::to_string(&opts).unwrap();

        assert!(json.contains("\"ignore-min-and-max-items\""));
        assert!(json.contains("\"strict-index-signatures\""));
        assert!(json.contains("\"fallback-to-any\""));

        let deserialized: CompileOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, opts);
    }

    #[test]
    fn test_partial_options_use_defaults() {
        let opts: CompileOptions =
            serde_json::from_str(r#"{ "strict-index-signatures": true }"#).unwrap();

        assert!(opts.strict_index_signatures);
        assert!(opts.unknown_any);
        assert!(opts.fallback_to_any);
        assert_eq!(opts.max_depth, 50);
    }
}
