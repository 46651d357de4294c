//! Declaration model.
//!
//! A language-neutral tree of modules, structs, enums and type aliases built
//! from ambient declarations. The tree is built once, renamed by
//! [`normalize`](crate::normalize), rewritten in place by
//! [`dedup`](crate::dedup) and consumed by the Rust writer.

use crate::convention::escape_ident;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// An identifier, before or after casing normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ident {
    /// Spelling as it appears in the source document.
    Raw(String),
    /// Normalized identifier: `from` is the wire spelling, `to` the Rust one.
    Resolved { from: String, to: String },
}

impl Ident {
    pub fn raw(name: impl Into<String>) -> Self {
        Ident::Raw(name.into())
    }


    /// The original (wire) spelling.
    pub fn original(&self) -> &str {
        match self {
            Ident::Raw(name) => name,
            Ident::Resolved { from, .. } => from,
        }
    }

    /// The spelling used in emitted code. Raw identifiers are used as-is.
    pub fn rust(&self) -> &str {
        match self {
            Ident::Raw(name) => name,
            Ident::Resolved { to, .. } => to,
        }
    }

    /// Whether normalization changed the spelling.
    pub fn is_renamed(&self) -> bool {
        self.original() != self.rust()
    }
}

/// Primitive leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Object,
    Any,
}

/// A fixed literal value, as used in literal types and enum initializers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Number(f64),
}

impl Literal {
    /// The literal as it is spelled on the wire, e.g. in a rename annotation.
    pub fn wire(&self) -> String {
        match self {
            Literal::String(s) => s.clone(),
            Literal::Number(n) => format_number(*n),
        }
    }

    /// A hashable key; `"1"` and `1` are different wire values.
    pub fn key(&self) -> WireKey {
        match self {
            Literal::String(s) => WireKey::String(s.clone()),
            // -0.0 and 0.0 are the same value on the wire
            Literal::Number(n) if *n == 0.0 => WireKey::Number(0.0f64.to_bits()),
            Literal::Number(n) => WireKey::Number(n.to_bits()),
        }
    }
}

/// Order-independent comparison key for wire values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireKey {
    String(String),
    Number(u64),
}

/// Render a number the way a JavaScript runtime prints it for whole values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A type expression without modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Primitive(Primitive),
    Literal(Literal),
    /// Bare name of a declaration, unresolved.
    Identifier(String),
    /// Dotted access path (`Outer.Inner`), unresolved.
    QualifiedPath(Vec<String>),
    /// Reference to another declaration. Wraps the referenced name as written
    /// in the source, or a [`Type::Resolved`] path after deduplication.
    Reference(Box<Type>),
    /// Path to a declared item relative to the referencing module.
    Resolved(RelativePath),
    /// Closed set of alternatives.
    Union(Vec<TypeExpr>),
    /// Placeholder for a type expression the builder could not translate.
    Unknown(String),
}

/// A Rust path relative to the module it is used from: `up` levels of
/// `super::` followed by `segments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativePath {
    pub up: usize,
    pub segments: Vec<String>,
}

impl RelativePath {
    /// Segments are escaped the way their declarations are (`r#type`).
    pub fn to_rust(&self) -> String {
        let mut parts: Vec<Cow<'_, str>> =
            std::iter::repeat_n(Cow::Borrowed("super"), self.up).collect();
        parts.extend(self.segments.iter().map(|s| escape_ident(s)));
        parts.join("::")
    }
}

/// A type with its modifiers. `array` and `optional` compose freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeExpr {
    pub ty: Type,
    pub array: bool,
    pub optional: bool,
}

impl TypeExpr {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            array: false,
            optional: false,
        }
    }

    pub fn primitive(kind: Primitive) -> Self {
        Self::new(Type::Primitive(kind))
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Literal members when this is a union made only of literals.
    pub fn literal_union(&self) -> Option<Vec<&Literal>> {
        let Type::Union(members) = &self.ty else {
            return None;
        };
        if members.is_empty() {
            return None;
        }
        members
            .iter()
            .map(|m| match &m.ty {
                Type::Literal(lit) if !m.array => Some(lit),
                _ => None,
            })
            .collect()
    }
}

/// A declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Module(Module),
    Struct(Struct),
    Enum(Enum),
    TypeAlias(TypeAlias),
}

impl Item {
    pub fn ident(&self) -> &Ident {
        match self {
            Item::Module(m) => &m.ident,
            Item::Struct(s) => &s.ident,
            Item::Enum(e) => &e.ident,
            Item::TypeAlias(a) => &a.ident,
        }
    }

    pub fn doc(&self) -> &str {
        match self {
            Item::Module(m) => &m.doc,
            Item::Struct(s) => &s.doc,
            Item::Enum(e) => &e.doc,
            Item::TypeAlias(a) => &a.doc,
        }
    }

    /// Name the Rust writer declares this item under. Aliases keep their
    /// source spelling.
    pub fn emitted_name(&self) -> &str {
        match self {
            Item::TypeAlias(a) => a.ident.original(),
            other => other.ident().rust(),
        }
    }
}

/// A namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub ident: Ident,
    pub doc: String,
    pub contents: Vec<Item>,
}

impl Module {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: Ident::raw(ident),
            doc: String::new(),
            contents: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.contents.push(item);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// A record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub ident: Ident,
    pub doc: String,
    pub members: Vec<Field>,
}

impl Struct {
    pub fn new(ident: impl Into<String>, members: Vec<Field>) -> Self {
        Self {
            ident: Ident::raw(ident),
            doc: String::new(),
            members,
        }
    }
}

/// A record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub ident: Ident,
    pub doc: String,
    pub ty: TypeExpr,
}

impl Field {
    pub fn new(ident: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            ident: Ident::raw(ident),
            doc: String::new(),
            ty,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// A closed set of named variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub ident: Ident,
    pub doc: String,
    pub members: Vec<Variant>,
}

impl Enum {
    pub fn new(ident: impl Into<String>, members: Vec<Variant>) -> Self {
        Self {
            ident: Ident::raw(ident),
            doc: String::new(),
            members,
        }
    }

    /// Values this enum serializes to: the initializer when present,
    /// otherwise the original variant spelling.
    pub fn wire_values(&self) -> Vec<Literal> {
        self.members.iter().map(Variant::wire_value).collect()
    }
}

/// An enum variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub ident: Ident,
    pub doc: String,
    pub init: Option<Literal>,
}

impl Variant {
    pub fn new(ident: impl Into<String>, init: Option<Literal>) -> Self {
        Self {
            ident: Ident::raw(ident),
            doc: String::new(),
            init,
        }
    }

    pub fn wire_value(&self) -> Literal {
        match &self.init {
            Some(init) => init.clone(),
            None => Literal::String(self.ident.original().to_string()),
        }
    }
}

/// `type Name = ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub ident: Ident,
    pub doc: String,
    pub def: TypeExpr,
}

impl TypeAlias {
    pub fn new(ident: impl Into<String>, def: TypeExpr) -> Self {
        Self {
            ident: Ident::raw(ident),
            doc: String::new(),
            def,
        }
    }
}
