//! Type parsing: normalized schema → Type-AST.
//!
//! Each node is matched against an ordered list of discriminators; the first
//! match decides the node kind:
//!
//! 1. `tsType` → `Custom`
//! 2. `enum` → `Enum`
//! 3. `const` (only present when the input skipped normalization) → `Literal`
//! 4. `allOf` → `Intersection`
//! 5. `anyOf` / `oneOf` → `Union`
//! 6. multi-entry `type` list → `Union` of single-type copies
//! 7. `properties` or `type: "object"` → `Interface`
//! 8. tuple `items` → `Tuple`
//! 9. single `items` or `type: "array"` → `Array`
//! 10. primitive `type` → `Primitive` (`"any"` → fallback)
//! 11. `$ref` → `Reference`
//! 12. no `type` → `Unknown` / `Any` (or an error when the fallback is disabled)
//!
//! Nodes with a name (`title`, `id`/`$id`, or the `definitions` key they were
//! reached through) are registered in the named-type arena *before* their body
//! is parsed, so self-referential and mutually-referential schemas terminate:
//! a second visit finds the entry and returns a reference to it.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::ast::{
    AstNode, EnumMember, EnumType, Interface, Member, NamedType, Primitive, Tuple, TypeAst,
};
use crate::config::CompileOptions;
use crate::error::CompileError;
use crate::names::{enum_member_name, file_identifier, to_safe_string, DEFAULT_ROOT_NAME};
use crate::schema_utils::{build_path, resolve_pointer, split_path};

/// Keys that name a schema node; stripped from per-type copies of a
/// multi-type node so the copies do not claim the original's name.
const NAMING_KEYS: &[&str] = &["title", "id", "$id"];

/// Keywords that only make sense on a copy narrowed to `type: "object"`.
const OBJECT_ONLY_KEYS: &[&str] = &[
    "properties",
    "patternProperties",
    "additionalProperties",
    "required",
];

/// Keywords that only make sense on a copy narrowed to `type: "array"`.
const ARRAY_ONLY_KEYS: &[&str] = &["items", "additionalItems", "minItems", "maxItems"];

/// Shared traversal state for a single `parse` call.
struct ParseContext<'a> {
    root: &'a Value,
    options: &'a CompileOptions,
    named: IndexMap<String, NamedType>,
}

/// Parse a normalized schema into a Type-AST.
///
/// Every entry of the root's `definitions` (or `$defs`, for input that skipped
/// normalization) is parsed and registered even when nothing references it.
pub fn parse(schema: &Value, options: &CompileOptions) -> Result<TypeAst, CompileError> {
    let mut ctx = ParseContext {
        root: schema,
        options,
        named: IndexMap::new(),
    };

    let root = ctx.parse_node(schema, "#", None, 0)?;

    for keyword in ["definitions", "$defs"] {
        if let Some(Value::Object(defs)) = schema.get(keyword) {
            for (key, def) in defs {
                let path = build_path("#", &[keyword, key]);
                ctx.parse_node(def, &path, Some(key), 1)?;
            }
        }
    }

    tracing::debug!(named_types = ctx.named.len(), "parsed schema");
    Ok(TypeAst {
        root,
        named: ctx.named,
    })
}

impl ParseContext<'_> {
    fn parse_node(
        &mut self,
        node: &Value,
        path: &str,
        definition_key: Option<&str>,
        depth: usize,
    ) -> Result<AstNode, CompileError> {
        if depth > self.options.max_depth {
            return Err(CompileError::RecursionDepthExceeded {
                path: path.to_string(),
                max_depth: self.options.max_depth,
            });
        }

        let obj = match node {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Ok(self.fallback()),
            Value::Bool(false) => return Ok(AstNode::Never),
            other => {
                return Err(CompileError::UnrecognizedShape {
                    path: path.to_string(),
                    message: format!("expected a schema object or boolean, found {other}"),
                })
            }
        };

        let Some(name) = derive_name(obj, definition_key) else {
            return self.parse_body(node, obj, path, depth);
        };

        if self.named.contains_key(&name) {
            return Ok(AstNode::reference(name));
        }

        // Placeholder first: the body may reference this name.
        self.named.insert(
            name.clone(),
            NamedType {
                name: name.clone(),
                path: path.to_string(),
                description: string_field(obj, "description"),
                deprecated: obj.get("deprecated") == Some(&Value::Bool(true)),
                body: AstNode::Unknown,
            },
        );
        tracing::debug!(name = %name, path, "registered named type");

        // Named types restart the count: the guard limits anonymous nesting,
        // and chains of named references already terminate at the placeholder.
        let body = self.parse_body(node, obj, path, 0)?;
        if let Some(entry) = self.named.get_mut(&name) {
            entry.body = body;
        }
        Ok(AstNode::reference(name))
    }

    fn parse_body(
        &mut self,
        node: &Value,
        obj: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<AstNode, CompileError> {
        if let Some(Value::String(expression)) = obj.get("tsType") {
            return Ok(AstNode::Custom {
                expression: expression.clone(),
            });
        }

        if let Some(values) = obj.get("enum") {
            return self.parse_enum(obj, values, path);
        }

        if let Some(value) = obj.get("const") {
            return Ok(AstNode::Literal {
                value: value.clone(),
            });
        }

        if let Some(children) = obj.get("allOf") {
            let members = self.parse_children(children, path, "allOf", depth)?;
            return Ok(AstNode::Intersection { members });
        }

        for keyword in ["anyOf", "oneOf"] {
            if let Some(children) = obj.get(keyword) {
                let members = self.parse_children(children, path, keyword, depth)?;
                return Ok(AstNode::Union { members });
            }
        }

        if let Some(Value::Array(types)) = obj.get("type") {
            if !types.is_empty() {
                return self.parse_type_list(obj, types, path, depth);
            }
        }

        let type_name = obj.get("type").and_then(Value::as_str);

        if obj.contains_key("properties") || type_name == Some("object") {
            return self.parse_interface(obj, path, depth).map(AstNode::Interface);
        }

        match obj.get("items") {
            Some(Value::Array(items)) => {
                return self.parse_tuple(obj, items, path, depth).map(AstNode::Tuple);
            }
            Some(items) => {
                let item_path = build_path(path, &["items"]);
                let element = self.parse_node(items, &item_path, None, depth + 1)?;
                return Ok(AstNode::array(element));
            }
            None if type_name == Some("array") => return Ok(AstNode::array(self.fallback())),
            None => {}
        }

        if let Some(type_name) = type_name {
            return match type_name {
                "string" => Ok(AstNode::primitive(Primitive::String)),
                "number" | "integer" => Ok(AstNode::primitive(Primitive::Number)),
                "boolean" => Ok(AstNode::primitive(Primitive::Boolean)),
                "null" => Ok(AstNode::primitive(Primitive::Null)),
                "any" => Ok(self.fallback()),
                other => Err(CompileError::UnrecognizedShape {
                    path: path.to_string(),
                    message: format!("unknown type \"{other}\""),
                }),
            };
        }

        if let Some(Value::String(reference)) = obj.get("$ref") {
            return self.parse_reference(reference, path, depth);
        }

        match obj.get("type") {
            None | Some(Value::Array(_)) if self.options.fallback_to_any => Ok(self.fallback()),
            None | Some(Value::Array(_)) => Err(CompileError::UnrecognizedShape {
                path: path.to_string(),
                message: format!("no type could be inferred from {node}"),
            }),
            Some(other) => Err(CompileError::UnrecognizedShape {
                path: path.to_string(),
                message: format!("\"type\" must be a string or a list of strings, found {other}"),
            }),
        }
    }

    fn fallback(&self) -> AstNode {
        if self.options.unknown_any {
            AstNode::Unknown
        } else {
            AstNode::Any
        }
    }

    fn parse_children(
        &mut self,
        children: &Value,
        path: &str,
        keyword: &str,
        depth: usize,
    ) -> Result<Vec<AstNode>, CompileError> {
        let Value::Array(children) = children else {
            return Err(CompileError::UnrecognizedShape {
                path: build_path(path, &[keyword]),
                message: format!("\"{keyword}\" must be a list of schemas"),
            });
        };
        children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                let child_path = build_path(path, &[keyword, &i.to_string()]);
                self.parse_node(child, &child_path, None, depth + 1)
            })
            .collect()
    }

    fn parse_enum(
        &mut self,
        obj: &Map<String, Value>,
        values: &Value,
        path: &str,
    ) -> Result<AstNode, CompileError> {
        let Value::Array(values) = values else {
            return Err(CompileError::UnrecognizedShape {
                path: build_path(path, &["enum"]),
                message: "\"enum\" must be a list of values".to_string(),
            });
        };

        let explicit_names: Option<Vec<&str>> = obj
            .get("tsEnumNames")
            .and_then(Value::as_array)
            .filter(|names| names.len() == values.len())
            .and_then(|names| names.iter().map(Value::as_str).collect());

        let mut seen = HashSet::new();
        let members = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let mut name = match &explicit_names {
                    Some(names) => names[i].to_string(),
                    None => enum_member_name(value, i),
                };
                if seen.contains(&name) {
                    let base = name;
                    let mut suffix = i;
                    name = format!("{base}{suffix}");
                    while seen.contains(&name) {
                        suffix += 1;
                        name = format!("{base}{suffix}");
                    }
                }
                seen.insert(name.clone());
                EnumMember {
                    name,
                    value: value.clone(),
                }
            })
            .collect();

        Ok(AstNode::Enum(EnumType {
            members,
            const_enum: self.options.enable_const_enums,
        }))
    }

    /// `type: ["string", "object"]` → one member per listed type, each parsed
    /// from a copy of the node narrowed to that type.
    fn parse_type_list(
        &mut self,
        obj: &Map<String, Value>,
        types: &[Value],
        path: &str,
        depth: usize,
    ) -> Result<AstNode, CompileError> {
        let mut members = Vec::with_capacity(types.len());
        for single in types {
            let mut narrowed = obj.clone();
            for key in NAMING_KEYS {
                narrowed.remove(*key);
            }
            if single.as_str() != Some("object") {
                for key in OBJECT_ONLY_KEYS {
                    narrowed.remove(*key);
                }
            }
            if single.as_str() != Some("array") {
                for key in ARRAY_ONLY_KEYS {
                    narrowed.remove(*key);
                }
            }
            narrowed.insert("type".to_string(), single.clone());
            members.push(self.parse_node(&Value::Object(narrowed), path, None, depth + 1)?);
        }

        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(AstNode::Union { members })
        }
    }

    fn parse_interface(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<Interface, CompileError> {
        let required: HashSet<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut members = Vec::new();
        if let Some(Value::Object(properties)) = obj.get("properties") {
            for (key, schema) in properties {
                let member_path = build_path(path, &["properties", key]);
                let ty = self.parse_node(schema, &member_path, None, depth + 1)?;
                members.push(Member {
                    name: key.clone(),
                    ty,
                    optional: !required.contains(key.as_str()),
                    description: schema.as_object().and_then(|s| string_field(s, "description")),
                    deprecated: schema.get("deprecated") == Some(&Value::Bool(true)),
                });
            }
        }

        let index_signature = self
            .parse_index_signature(obj, path, depth)?
            .map(Box::new);

        Ok(Interface {
            members,
            index_signature,
        })
    }

    /// Value type accepted for undeclared keys, or `None` for a closed interface.
    fn parse_index_signature(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<Option<AstNode>, CompileError> {
        let mut value_types = Vec::new();

        let patterns = match obj.get("patternProperties") {
            Some(Value::Object(patterns)) => Some(patterns),
            _ => None,
        };
        if let Some(patterns) = patterns {
            for (pattern, schema) in patterns {
                let pattern_path = build_path(path, &["patternProperties", pattern]);
                value_types.push(self.parse_node(schema, &pattern_path, None, depth + 1)?);
            }
        }

        match obj.get("additionalProperties") {
            Some(Value::Bool(false)) => {}
            None if patterns.is_some() => {}
            None | Some(Value::Bool(true)) => value_types.push(self.fallback()),
            Some(schema) => {
                let additional_path = build_path(path, &["additionalProperties"]);
                value_types.push(self.parse_node(schema, &additional_path, None, depth + 1)?);
            }
        }

        let value = match value_types.len() {
            0 => return Ok(None),
            1 => value_types.remove(0),
            _ => AstNode::Union {
                members: value_types,
            },
        };

        if !self.options.strict_index_signatures {
            return Ok(Some(value));
        }
        let members = match value {
            AstNode::Union { mut members } => {
                members.push(AstNode::primitive(Primitive::Undefined));
                members
            }
            other => vec![other, AstNode::primitive(Primitive::Undefined)],
        };
        Ok(Some(AstNode::Union { members }))
    }

    fn parse_tuple(
        &mut self,
        obj: &Map<String, Value>,
        items: &[Value],
        path: &str,
        depth: usize,
    ) -> Result<Tuple, CompileError> {
        let elements = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_path = build_path(path, &["items", &i.to_string()]);
                self.parse_node(item, &item_path, None, depth + 1)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let min_items = obj
            .get("minItems")
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
            .min(elements.len());

        let rest = match obj.get("additionalItems") {
            Some(Value::Bool(true)) => Some(self.fallback()),
            Some(schema) if schema.is_object() => {
                let rest_path = build_path(path, &["additionalItems"]);
                Some(self.parse_node(schema, &rest_path, None, depth + 1)?)
            }
            _ => None,
        };

        Ok(Tuple {
            elements,
            min_items,
            rest: rest.map(Box::new),
        })
    }

    /// A `$ref` that survived linking. Local pointers are resolved and the
    /// target parsed as a named type; anything else is kept as an opaque
    /// reference to the identifier its last segment implies.
    fn parse_reference(
        &mut self,
        reference: &str,
        path: &str,
        depth: usize,
    ) -> Result<AstNode, CompileError> {
        if !reference.starts_with('#') {
            let name = external_reference_name(reference);
            tracing::warn!(
                path,
                reference,
                name = %name,
                "non-local $ref left unresolved; emitting a named reference"
            );
            return Ok(AstNode::reference(name));
        }

        let target = resolve_pointer(self.root, reference)
            .or_else(|| resolve_pointer(self.root, &reference.replace("/$defs/", "/definitions/")))
            .ok_or_else(|| CompileError::UnresolvedReference {
                path: path.to_string(),
                reference: reference.to_string(),
            })?;

        // A referenced target must carry a name, or a cycle through it would
        // never terminate.
        let hint = local_reference_name(reference);
        self.parse_node(target, reference, Some(&hint), depth + 1)
    }
}

/// First usable name among `title`, `id`/`$id` and the definitions key.
fn derive_name(obj: &Map<String, Value>, definition_key: Option<&str>) -> Option<String> {
    let title = obj.get("title").and_then(Value::as_str).map(to_safe_string);
    let id = ["id", "$id"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(id_name);
    let key = definition_key.map(to_safe_string);

    [title, id, key]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
}

/// `http://example.com/schemas/person.json` → `Person`; `Person` → `Person`.
fn id_name(id: &str) -> String {
    let trimmed = id.trim_end_matches('#');
    let last = trimmed.rsplit(['/', '#']).next().unwrap_or(trimmed);
    to_safe_string(last.strip_suffix(".json").unwrap_or(last))
}

fn local_reference_name(reference: &str) -> String {
    let from_segment = split_path(reference)
        .last()
        .map(|segment| to_safe_string(segment))
        .unwrap_or_default();
    if !from_segment.is_empty() {
        return from_segment;
    }
    let from_pointer = to_safe_string(reference);
    if from_pointer.is_empty() {
        DEFAULT_ROOT_NAME.to_string()
    } else {
        from_pointer
    }
}

fn external_reference_name(reference: &str) -> String {
    match reference.split_once('#') {
        Some((_, fragment)) if !fragment.is_empty() && fragment != "/" => {
            local_reference_name(&format!("#{fragment}"))
        }
        Some((document, _)) => file_identifier(document),
        None => file_identifier(reference),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}
