//! Type-AST produced by the parser.
//!
//! Anonymous types are owned inline by their parent. Named types live once in
//! [`TypeAst::named`] and are pointed at with [`AstNode::Reference`], a lookup
//! key rather than ownership, so shared and self-referential schemas never
//! duplicate or recurse.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed document: the root type plus every named type it reaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAst {
    pub root: AstNode,
    /// Named types in first-registration order.
    pub named: IndexMap<String, NamedType>,
}

impl TypeAst {
    /// Look up a named type by identifier.
    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.named.get(name)
    }

    /// Follow a [`AstNode::Reference`] to its named type; `None` for any other node.
    pub fn resolve<'a>(&'a self, node: &AstNode) -> Option<&'a NamedType> {
        node.reference_name().and_then(|name| self.named.get(name))
    }
}

/// A type registered under a stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedType {
    pub name: String,
    /// JSON Pointer of the schema node the type was first built from.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    pub body: AstNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Null,
    /// Explicit "may be absent" marker used by strict index signatures.
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AstNode {
    Any,
    Unknown,
    Never,
    Primitive {
        primitive: Primitive,
    },
    Literal {
        value: Value,
    },
    /// Verbatim target-language type expression.
    Custom {
        expression: String,
    },
    Interface(Interface),
    Enum(EnumType),
    Array {
        element: Box<AstNode>,
    },
    Tuple(Tuple),
    Union {
        members: Vec<AstNode>,
    },
    Intersection {
        members: Vec<AstNode>,
    },
    /// Identifier of an entry in [`TypeAst::named`].
    Reference {
        name: String,
    },
}

impl AstNode {
    pub fn primitive(primitive: Primitive) -> Self {
        AstNode::Primitive { primitive }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        AstNode::Reference { name: name.into() }
    }

    pub fn array(element: AstNode) -> Self {
        AstNode::Array {
            element: Box::new(element),
        }
    }

    /// Identifier if this node is a reference to a named type.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            AstNode::Reference { name } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    /// Members in declaration order.
    pub members: Vec<Member>,
    /// `None` when only declared members are permitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_signature: Option<Box<AstNode>>,
}

impl Interface {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AstNode,
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub members: Vec<EnumMember>,
    /// Rendering hint only: the enum may be emitted as a constant enum.
    pub const_enum: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    pub elements: Vec<AstNode>,
    /// Elements at or beyond this index may be absent.
    pub min_items: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<Box<AstNode>>,
}
