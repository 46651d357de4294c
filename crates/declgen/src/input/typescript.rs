//! TypeScript declaration reader.
//!
//! Parses ambient declaration text (`.d.ts`) with tree-sitter and builds the
//! declaration model: namespaces, interfaces, enums and type aliases. Other
//! constructs are skipped. Doc comments are taken from the `/** ... */` block
//! directly preceding a declaration or member.

use super::ParseError;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::{
    Enum, Field, Ident, Item, Literal, Module, Primitive, Struct, Type, TypeAlias, TypeExpr,
    Variant,
};
use tree_sitter::{Node, Parser};

/// Parse declaration text into the root module of the model.
///
/// A document made of a single namespace uses that namespace as the root.
/// Anything else is wrapped in a module named `root_name`.
pub fn parse_declarations(
    source: &str,
    root_name: &str,
    diags: &mut Diagnostics,
) -> Result<Module, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_typescript::language().into())
        .map_err(|e| ParseError::Grammar(e.to_string()))?;

    let tree = parser.parse(source, None).ok_or(ParseError::Syntax)?;

    let mut builder = ModelBuilder {
        source,
        diags,
        path: Vec::new(),
    };
    let mut items = builder.block(tree.root_node())?;
    tracing::debug!(items = items.len(), "top-level declarations built");

    if items.len() == 1 && matches!(items[0], Item::Module(_)) {
        if let Some(Item::Module(root)) = items.pop() {
            return Ok(root);
        }
    }
    if items.is_empty() {
        return Err(ParseError::NoDeclarations);
    }
    Ok(Module {
        ident: Ident::raw(root_name),
        doc: String::new(),
        contents: items,
    })
}

struct ModelBuilder<'a> {
    source: &'a str,
    diags: &'a mut Diagnostics,
    /// Source names of the declarations being built, for diagnostics.
    path: Vec<String>,
}

impl<'a> ModelBuilder<'a> {
    fn node_text(&self, node: Node) -> &'a str {
        let source: &'a str = self.source;
        node.utf8_text(source.as_bytes()).unwrap_or("")
    }

    fn location(&self) -> String {
        self.path.join(".")
    }

    fn unsupported(&mut self, node: Node, what: &str) -> TypeExpr {
        let text = self.node_text(node).to_string();
        let location = self.location();
        self.diags.push(
            DiagnosticKind::UnsupportedType,
            location,
            format!("{what} `{text}` has no translation; using an opaque value"),
        );
        TypeExpr::new(Type::Unknown(text))
    }

    fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        let nodes = node.named_children(&mut cursor).collect();
        nodes
    }

    fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        let nodes = node.children(&mut cursor).collect();
        nodes
    }

    fn first_named<'t>(node: Node<'t>) -> Option<Node<'t>> {
        Self::named_children(node).into_iter().next()
    }

    fn field<'t>(node: Node<'t>, name: &'static str) -> Result<Node<'t>, ParseError> {
        node.child_by_field_name(name).ok_or_else(|| ParseError::Missing {
            kind: node.kind().to_string(),
            what: name,
        })
    }

    /// Declarations of a program or statement block, in source order.
    fn block(&mut self, node: Node) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        let mut pending_doc: Option<String> = None;
        for child in Self::children(node) {
            if child.kind() == "comment" {
                if let Some(doc) = self.doc_comment(child) {
                    pending_doc = Some(doc);
                }
                continue;
            }
            if !child.is_named() {
                continue;
            }
            let doc = pending_doc.take().unwrap_or_default();
            self.declaration(child, doc, &mut items)?;
        }
        Ok(items)
    }

    fn declaration(
        &mut self,
        node: Node,
        doc: String,
        out: &mut Vec<Item>,
    ) -> Result<(), ParseError> {
        match node.kind() {
            "ambient_declaration" => {
                for child in Self::named_children(node) {
                    if child.kind() == "statement_block" {
                        self.diags.push(
                            DiagnosticKind::SkippedDeclaration,
                            self.path.join("."),
                            "`declare global` blocks are not translated",
                        );
                        continue;
                    }
                    self.declaration(child, doc.clone(), out)?;
                }
            }
            "export_statement" => {
                if let Some(decl) = node.child_by_field_name("declaration") {
                    self.declaration(decl, doc, out)?;
                }
            }
            // `namespace X {}` without `declare` parses as an expression
            "expression_statement" => {
                if let Some(inner) = Self::first_named(node) {
                    if matches!(inner.kind(), "internal_module" | "module") {
                        self.declaration(inner, doc, out)?;
                    }
                }
            }
            "internal_module" | "module" => out.push(Item::Module(self.module(node, doc)?)),
            "interface_declaration" => out.push(Item::Struct(self.interface(node, doc)?)),
            "enum_declaration" => out.push(Item::Enum(self.enumeration(node, doc)?)),
            "type_alias_declaration" => out.push(Item::TypeAlias(self.alias(node, doc)?)),
            "ERROR" => {
                let text: String = self.node_text(node).chars().take(40).collect();
                self.diags.push(
                    DiagnosticKind::SkippedDeclaration,
                    self.path.join("."),
                    format!("syntax error near `{text}`"),
                );
            }
            other => tracing::debug!(kind = other, "skipping declaration"),
        }
        Ok(())
    }

    fn module(&mut self, node: Node, doc: String) -> Result<Module, ParseError> {
        let name = Self::field(node, "name")?;
        let names: Vec<String> = match name.kind() {
            "string" => vec![unquote(self.node_text(name))],
            _ => self
                .node_text(name)
                .split('.')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let depth = self.path.len();
        self.path.extend(names.iter().cloned());
        let contents = match node.child_by_field_name("body") {
            Some(body) => self.block(body)?,
            None => Vec::new(),
        };
        self.path.truncate(depth);

        // `namespace a.b {}` nests: the body belongs to the innermost module
        let mut names = names.into_iter().rev();
        let innermost = names.next().ok_or_else(|| ParseError::Missing {
            kind: node.kind().to_string(),
            what: "name",
        })?;
        let mut module = Module {
            ident: Ident::raw(innermost),
            doc: String::new(),
            contents,
        };
        for name in names {
            module = Module {
                ident: Ident::raw(name),
                doc: String::new(),
                contents: vec![Item::Module(module)],
            };
        }
        module.doc = doc;
        Ok(module)
    }

    fn interface(&mut self, node: Node, doc: String) -> Result<Struct, ParseError> {
        let name = self.node_text(Self::field(node, "name")?).to_string();
        let body = Self::field(node, "body")?;
        self.path.push(name.clone());

        let mut members = Vec::new();
        let mut pending_doc: Option<String> = None;
        for child in Self::children(body) {
            match child.kind() {
                "comment" => {
                    if let Some(doc) = self.doc_comment(child) {
                        pending_doc = Some(doc);
                    }
                }
                "property_signature" => {
                    let mut field = self.property(child)?;
                    field.doc = pending_doc.take().unwrap_or_default();
                    members.push(field);
                }
                kind if child.is_named() => {
                    tracing::debug!(kind, "skipping interface member");
                    pending_doc = None;
                }
                _ => {}
            }
        }

        self.path.pop();
        Ok(Struct {
            ident: Ident::raw(name),
            doc,
            members,
        })
    }

    fn property(&mut self, node: Node) -> Result<Field, ParseError> {
        let name = Self::field(node, "name")?;
        let name = match name.kind() {
            "string" => unquote(self.node_text(name)),
            _ => self.node_text(name).to_string(),
        };
        let optional = self.has_question_mark(node);

        self.path.push(name.clone());
        let ty = match node
            .child_by_field_name("type")
            .and_then(Self::first_named)
        {
            Some(ty) => self.type_expr(ty),
            None => TypeExpr::primitive(Primitive::Any),
        };
        self.path.pop();

        Ok(Field {
            ident: Ident::raw(name),
            doc: String::new(),
            ty: TypeExpr {
                optional: ty.optional || optional,
                ..ty
            },
        })
    }

    fn has_question_mark(&self, node: Node) -> bool {
        Self::children(node)
            .into_iter()
            .any(|child| !child.is_named() && self.node_text(child) == "?")
    }

    fn enumeration(&mut self, node: Node, doc: String) -> Result<Enum, ParseError> {
        let name = self.node_text(Self::field(node, "name")?).to_string();
        let body = Self::field(node, "body")?;
        self.path.push(name.clone());

        let mut members = Vec::new();
        let mut pending_doc: Option<String> = None;
        for child in Self::children(body) {
            let variant = match child.kind() {
                "comment" => {
                    if let Some(doc) = self.doc_comment(child) {
                        pending_doc = Some(doc);
                    }
                    continue;
                }
                "property_identifier" | "identifier" => {
                    Variant::new(self.node_text(child), None)
                }
                "string" => Variant::new(unquote(self.node_text(child)), None),
                "enum_assignment" => self.enum_assignment(child)?,
                _ => continue,
            };
            members.push(Variant {
                doc: pending_doc.take().unwrap_or_default(),
                ..variant
            });
        }

        self.path.pop();
        Ok(Enum {
            ident: Ident::raw(name),
            doc,
            members,
        })
    }

    fn enum_assignment(&mut self, node: Node) -> Result<Variant, ParseError> {
        let name = Self::field(node, "name")?;
        let name = match name.kind() {
            "string" => unquote(self.node_text(name)),
            _ => self.node_text(name).to_string(),
        };
        let init = match node.child_by_field_name("value") {
            Some(value) => match value.kind() {
                "string" => Some(Literal::String(unquote(self.node_text(value)))),
                "number" | "unary_expression" => {
                    parse_number(self.node_text(value)).map(Literal::Number)
                }
                _ => None,
            },
            None => None,
        };
        if init.is_none() {
            if let Some(value) = node.child_by_field_name("value") {
                let text = self.node_text(value).to_string();
                let location = format!("{}.{}", self.location(), name);
                self.diags.push(
                    DiagnosticKind::UnsupportedType,
                    location,
                    format!("initializer `{text}` is not a literal; using the member name"),
                );
            }
        }
        Ok(Variant::new(name, init))
    }

    fn alias(&mut self, node: Node, doc: String) -> Result<TypeAlias, ParseError> {
        let name = self.node_text(Self::field(node, "name")?).to_string();
        let value = Self::field(node, "value")?;
        self.path.push(name.clone());
        let def = self.type_expr(value);
        self.path.pop();
        Ok(TypeAlias {
            ident: Ident::raw(name),
            doc,
            def,
        })
    }

    /// Translate a type expression. Unrecognized kinds become
    /// [`Type::Unknown`] and an `UnsupportedType` diagnostic.
    fn type_expr(&mut self, node: Node) -> TypeExpr {
        match node.kind() {
            "parenthesized_type" | "readonly_type" => match Self::first_named(node) {
                Some(inner) => self.type_expr(inner),
                None => self.unsupported(node, "empty type"),
            },
            "union_type" => self.union(node),
            "literal_type" => match Self::first_named(node) {
                Some(inner) => self.literal(inner),
                None => self.unsupported(node, "literal"),
            },
            "array_type" => match Self::first_named(node) {
                Some(inner) => self.array_of(node, inner),
                None => self.unsupported(node, "array"),
            },
            "generic_type" => self.generic(node),
            "type_identifier" => TypeExpr::new(Type::Reference(Box::new(Type::Identifier(
                self.node_text(node).to_string(),
            )))),
            "identifier" => TypeExpr::new(Type::Identifier(self.node_text(node).to_string())),
            "nested_type_identifier" => TypeExpr::new(Type::Reference(Box::new(
                Type::QualifiedPath(split_path(self.node_text(node))),
            ))),
            "string" | "number" => self.literal(node),
            "predefined_type" => match self.node_text(node) {
                "string" => TypeExpr::primitive(Primitive::String),
                "number" => TypeExpr::primitive(Primitive::Number),
                "boolean" => TypeExpr::primitive(Primitive::Boolean),
                "object" => TypeExpr::primitive(Primitive::Object),
                "any" | "unknown" => TypeExpr::primitive(Primitive::Any),
                _ => self.unsupported(node, "predefined type"),
            },
            kind => {
                let what = kind.replace('_', " ");
                self.unsupported(node, &what)
            }
        }
    }

    fn literal(&mut self, node: Node) -> TypeExpr {
        let text = self.node_text(node);
        match node.kind() {
            "string" => TypeExpr::new(Type::Literal(Literal::String(unquote(text)))),
            "number" | "unary_expression" => match parse_number(text) {
                Some(n) => TypeExpr::new(Type::Literal(Literal::Number(n))),
                None => self.unsupported(node, "numeric literal"),
            },
            "true" | "false" => TypeExpr::primitive(Primitive::Boolean),
            "null" | "undefined" => TypeExpr::primitive(Primitive::Any).optional(),
            _ => self.unsupported(node, "literal"),
        }
    }

    fn array_of(&mut self, node: Node, element: Node) -> TypeExpr {
        let inner = self.type_expr(element);
        if inner.array {
            let location = self.location();
            let text = self.node_text(node).to_string();
            self.diags.push(
                DiagnosticKind::FlattenedArray,
                location,
                format!("`{text}` is emitted with a single Vec level"),
            );
        }
        inner.array()
    }

    fn generic(&mut self, node: Node) -> TypeExpr {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.node_text(n))
            .unwrap_or("");
        let element = node
            .child_by_field_name("type_arguments")
            .and_then(Self::first_named);
        match (name, element) {
            ("Array" | "ReadonlyArray", Some(element)) => self.array_of(node, element),
            _ => self.unsupported(node, "generic type"),
        }
    }

    /// Flatten nested unions. `null` and `undefined` members make the result
    /// optional instead of being members.
    fn union(&mut self, node: Node) -> TypeExpr {
        let mut nodes = Vec::new();
        flatten_union(node, &mut nodes);

        let mut optional = false;
        let mut members = Vec::new();
        for member in nodes {
            if self.is_nullish(member) {
                optional = true;
            } else {
                members.push(self.type_expr(member));
            }
        }

        let mut ty = match members.len() {
            0 => TypeExpr::primitive(Primitive::Any),
            1 => members.remove(0),
            _ => TypeExpr::new(Type::Union(members)),
        };
        ty.optional |= optional;
        ty
    }

    fn is_nullish(&self, node: Node) -> bool {
        match node.kind() {
            "literal_type" => Self::first_named(node)
                .is_some_and(|inner| matches!(inner.kind(), "null" | "undefined")),
            "predefined_type" => matches!(self.node_text(node), "null" | "undefined" | "void"),
            "null" | "undefined" => true,
            _ => false,
        }
    }

    /// Text of a `/** ... */` comment with delimiters, leading `*` and
    /// `@tag` sections removed. Line structure is kept.
    fn doc_comment(&self, node: Node) -> Option<String> {
        parse_doc_comment(self.node_text(node))
    }
}

fn flatten_union<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for mut child in node.named_children(&mut cursor) {
        while child.kind() == "parenthesized_type" {
            match child.named_child(0) {
                Some(inner) => child = inner,
                None => break,
            }
        }
        if child.kind() == "union_type" {
            flatten_union(child, out);
        } else {
            out.push(child);
        }
    }
}

fn split_path(text: &str) -> Vec<String> {
    text.split('.')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn parse_doc_comment(text: &str) -> Option<String> {
    let inner = text.strip_prefix("/**")?.strip_suffix("*/")?;
    let mut lines: Vec<&str> = Vec::new();
    for line in inner.lines() {
        let line = line.trim();
        let line = line.strip_prefix('*').map_or(line, str::trim_start);
        if line.starts_with('@') {
            break;
        }
        lines.push(line.trim_end());
    }
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Strip quotes from a string literal and resolve simple escapes.
pub(crate) fn unquote(text: &str) -> String {
    let inner = match text.chars().next() {
        Some(q @ ('"' | '\'' | '`')) if text.len() >= 2 && text.ends_with(q) => {
            &text[1..text.len() - 1]
        }
        _ => text,
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse a numeric literal, optionally signed: decimal, hex, octal, binary,
/// with `_` separators.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(cleaned.as_str())),
    };
    let radix = |prefix: [&str; 2], radix: u32| {
        prefix
            .iter()
            .find_map(|p| digits.strip_prefix(p))
            .map(|d| i64::from_str_radix(d, radix).ok().map(|v| v as f64))
    };
    let value = radix(["0x", "0X"], 16)
        .or_else(|| radix(["0o", "0O"], 8))
        .or_else(|| radix(["0b", "0B"], 2))
        .unwrap_or_else(|| digits.parse::<f64>().ok())?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Module, Diagnostics) {
        let mut diags = Diagnostics::new();
        let root = parse_declarations(source, "bindings", &mut diags).unwrap();
        (root, diags)
    }

    fn only_struct(module: &Module) -> &Struct {
        match &module.contents[..] {
            [Item::Struct(s)] => s,
            other => panic!("expected one struct, got {other:?}"),
        }
    }

    #[test]
    fn namespace_becomes_root() {
        let (root, _) = parse(
            r#"
            declare namespace net {
                interface Ping {
                    id: number;
                }
            }
            "#,
        );
        assert_eq!(root.ident.original(), "net");
        let ping = only_struct(&root);
        assert_eq!(ping.ident.original(), "Ping");
        assert_eq!(ping.members[0].ty, TypeExpr::primitive(Primitive::Number));
    }

    #[test]
    fn loose_declarations_are_wrapped() {
        let (root, _) = parse(
            r#"
            interface A { x: string; }
            type B = number;
            "#,
        );
        assert_eq!(root.ident.original(), "bindings");
        assert_eq!(root.contents.len(), 2);
    }

    #[test]
    fn question_mark_makes_field_optional() {
        let (root, _) = parse(
            r#"
            interface User {
                id: string;
                age?: number;
                tags?: string[];
            }
            "#,
        );
        let user = &root.contents[0];
        let Item::Struct(user) = user else {
            panic!("expected struct");
        };
        assert!(!user.members[0].ty.optional);
        assert!(user.members[1].ty.optional);
        let tags = &user.members[2].ty;
        assert!(tags.optional && tags.array);
        assert_eq!(tags.ty, Type::Primitive(Primitive::String));
    }

    #[test]
    fn unions_and_literals() {
        let (root, diags) = parse(
            r#"
            interface Ping {
                kind: "A" | 'B';
                level: (1 | 2 | -3);
                maybe: string | null;
            }
            "#,
        );
        let Item::Struct(ping) = &root.contents[0] else {
            panic!("expected struct");
        };
        let kinds = ping.members[0].ty.literal_union().unwrap();
        assert_eq!(
            kinds,
            vec![&Literal::String("A".into()), &Literal::String("B".into())]
        );
        let levels = ping.members[1].ty.literal_union().unwrap();
        assert_eq!(levels[2], &Literal::Number(-3.0));
        assert_eq!(
            ping.members[2].ty,
            TypeExpr::primitive(Primitive::String).optional()
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn parenthesized_unions_are_flattened() {
        let (root, _) = parse(
            r#"
            interface Ping {
                kind: "a" | ("b" | ("c"));
            }
            "#,
        );
        let Item::Struct(ping) = &root.contents[0] else {
            panic!("expected struct");
        };
        let kinds = ping.members[0].ty.literal_union().unwrap();
        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[2], &Literal::String("c".into()));
    }

    #[test]
    fn references_and_paths() {
        let (root, _) = parse(
            r#"
            interface Frame {
                parent: Frame;
                loader: Network.LoaderId;
                items: Array<Item>;
            }
            "#,
        );
        let Item::Struct(frame) = &root.contents[0] else {
            panic!("expected struct");
        };
        assert_eq!(
            frame.members[0].ty.ty,
            Type::Reference(Box::new(Type::Identifier("Frame".into())))
        );
        assert_eq!(
            frame.members[1].ty.ty,
            Type::Reference(Box::new(Type::QualifiedPath(vec![
                "Network".into(),
                "LoaderId".into()
            ])))
        );
        assert!(frame.members[2].ty.array);
    }

    #[test]
    fn unsupported_types_are_reported() {
        let (root, diags) = parse(
            r#"
            interface Handler {
                callback: (x: number) => void;
            }
            "#,
        );
        let Item::Struct(handler) = &root.contents[0] else {
            panic!("expected struct");
        };
        assert!(matches!(handler.members[0].ty.ty, Type::Unknown(_)));
        assert_eq!(diags.count(DiagnosticKind::UnsupportedType), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.path, "Handler.callback");
    }

    #[test]
    fn enums_keep_initializers() {
        let (root, _) = parse(
            r#"
            enum Kind {
                A = "a",
                B = 2,
                C,
            }
            "#,
        );
        let Item::Enum(kind) = &root.contents[0] else {
            panic!("expected enum");
        };
        let inits: Vec<_> = kind.members.iter().map(|m| m.init.clone()).collect();
        assert_eq!(
            inits,
            vec![
                Some(Literal::String("a".into())),
                Some(Literal::Number(2.0)),
                None
            ]
        );
        assert_eq!(kind.members[2].ident.original(), "C");
    }

    #[test]
    fn doc_comments_attach_to_the_next_declaration() {
        let (root, _) = parse(
            r#"
            /** A ping. */
            interface Ping {
                /**
                 * Identifier.
                 * Unique per session.
                 * @deprecated use uid
                 */
                id: number;
                // not documentation
                seq: number;
            }
            "#,
        );
        let Item::Struct(ping) = &root.contents[0] else {
            panic!("expected struct");
        };
        assert_eq!(ping.doc, "A ping.");
        assert_eq!(ping.members[0].doc, "Identifier.\nUnique per session.");
        assert_eq!(ping.members[1].doc, "");
    }

    #[test]
    fn other_constructs_are_skipped() {
        let (root, _) = parse(
            r#"
            declare function ping(): void;
            declare const VERSION: string;
            interface Kept { x: number; }
            "#,
        );
        let kept = only_struct(&root);
        assert_eq!(kept.ident.original(), "Kept");
    }

    #[test]
    fn empty_documents_are_errors() {
        let mut diags = Diagnostics::new();
        let err = parse_declarations("// nothing here", "bindings", &mut diags).unwrap_err();
        assert!(matches!(err, ParseError::NoDeclarations));
    }

    #[test]
    fn helpers() {
        assert_eq!(unquote(r#""a\"b""#), "a\"b");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(parse_number("0x10"), Some(16.0));
        assert_eq!(parse_number("- 2.5"), Some(-2.5));
        assert_eq!(parse_number("1_000"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_doc_comment("/** one */").as_deref(), Some("one"));
        assert_eq!(parse_doc_comment("/* plain */"), None);
        assert_eq!(parse_doc_comment("/** @internal */"), None);
    }
}
