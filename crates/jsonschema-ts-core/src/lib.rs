//! # jsonschema-ts-core
//!
//! Compile [JSON Schema](https://json-schema.org/) documents into a type-AST
//! from which a renderer can emit deduplicated type declarations (TypeScript
//! interfaces, enums, unions and aliases).
//!
//! The pipeline has two stages:
//!
//! 1. **Normalization** ([`normalize`]): an ordered [`RuleRegistry`] of pure
//!    rewrite rules canonicalizes a deep copy of the schema (`type: ["x"]` →
//!    `type: "x"`, `const` → `enum`, bounded `items` → tuples, ...).
//! 2. **Parsing** ([`parse`]): the normalized tree is mapped onto [`AstNode`]s;
//!    named schemas are registered once and referenced by identifier.
//!
//! `$ref` dereferencing, cross-file linking, validation and text rendering
//! happen outside this crate.
//!
//! ## Example
//!
//! ```
//! use jsonschema_ts_core::{compile, AstNode, CompileOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "tags": { "type": "array", "items": { "type": "string" } }
//!     },
//!     "required": ["name"]
//! });
//!
//! let ast = compile(&schema, "person.json", &CompileOptions::default()).unwrap();
//! let person = ast.resolve(&ast.root).unwrap();
//! assert_eq!(person.name, "Person");
//! let AstNode::Interface(interface) = &person.body else { unreachable!() };
//! assert!(!interface.member("name").unwrap().optional);
//! assert!(interface.member("tags").unwrap().optional);
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod names;
pub mod normalizer;
pub mod parser;
pub mod rules;
pub mod schema_utils;
pub mod shape;

pub use ast::{
    AstNode, EnumMember, EnumType, Interface, Member, NamedType, Primitive, Tuple, TypeAst,
};
pub use config::CompileOptions;
pub use error::CompileError;
pub use normalizer::{normalize, normalize_with_rules};
pub use parser::parse;
pub use rules::{Rule, RuleContext, RuleRegistry};
pub use schema_utils::{build_path, split_path};
pub use shape::{classify, Shape};

use serde_json::Value;

/// Normalize `schema` with the built-in rules, then parse it.
pub fn compile(
    schema: &Value,
    file_name: &str,
    options: &CompileOptions,
) -> Result<TypeAst, CompileError> {
    let normalized = normalize(schema, file_name, options);
    parse(&normalized, options)
}

/// Like [`compile`], with caller rules appended after the built-ins.
pub fn compile_with_rules(
    schema: &Value,
    file_name: &str,
    options: &CompileOptions,
    additional_rules: &RuleRegistry,
) -> Result<TypeAst, CompileError> {
    let rules = RuleRegistry::builtin().with(additional_rules);
    let normalized = normalize_with_rules(schema, file_name, options, &rules);
    parse(&normalized, options)
}

/// Parse JSON text and [`compile`] it.
pub fn compile_str(
    json: &str,
    file_name: &str,
    options: &CompileOptions,
) -> Result<TypeAst, CompileError> {
    let schema: Value = serde_json::from_str(json)?;
    compile(&schema, file_name, options)
}
