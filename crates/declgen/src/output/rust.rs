//! Rust writer.
//!
//! Emits a normalized, deduplicated declaration tree as Rust modules with
//! serde derives. Renamed fields and every enum variant carry a
//! `#[serde(rename = "...")]` holding the original wire spelling.

use crate::convention::{
    Case, DeclKind, case_of, escape_ident, rust_convention, to_case, to_identifier,
};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::index::DeclIndex;
use crate::ir::{
    Enum, Field, Item, Literal, Module, Primitive, Struct, Type, TypeAlias, TypeExpr,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rust spelling of each primitive kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveNames {
    pub string: String,
    pub number: String,
    pub boolean: String,
    pub object: String,
    pub any: String,
}

impl Default for PrimitiveNames {
    fn default() -> Self {
        Self {
            string: "String".into(),
            number: "f64".into(),
            boolean: "bool".into(),
            object: "serde_json::Map<String, serde_json::Value>".into(),
            any: "serde_json::Value".into(),
        }
    }
}

impl PrimitiveNames {
    pub fn name(&self, kind: Primitive) -> &str {
        match kind {
            Primitive::String => &self.string,
            Primitive::Number => &self.number,
            Primitive::Boolean => &self.boolean,
            Primitive::Object => &self.object,
            Primitive::Any => &self.any,
        }
    }
}

/// Options for Rust generation.
#[derive(Debug, Clone)]
pub struct RustOptions {
    /// Derives on every struct and enum.
    pub derives: Vec<String>,
    /// Lines emitted at the top of every module.
    pub prelude: Vec<String>,
    /// Line emitted before the root module.
    pub header: Option<String>,
    /// Add `#[serde(default, skip_serializing_if = "Option::is_none")]` to
    /// optional fields.
    pub skip_serializing_none: bool,
    pub primitives: PrimitiveNames,
}

impl Default for RustOptions {
    fn default() -> Self {
        Self {
            derives: ["Debug", "Clone", "Serialize", "Deserialize"]
                .map(String::from)
                .to_vec(),
            prelude: vec!["use serde::{Deserialize, Serialize};".into()],
            header: None,
            skip_serializing_none: false,
            primitives: PrimitiveNames::default(),
        }
    }
}

/// Generate Rust source for a whole tree.
pub fn generate_rust_types(
    root: &Module,
    options: &RustOptions,
    diags: &mut Diagnostics,
) -> String {
    let index = DeclIndex::build(root);
    let mut writer = RustWriter {
        output: String::new(),
        indent: 0,
        options,
        index: &index,
        scope: Vec::new(),
        path: Vec::new(),
        taken: Vec::new(),
        diags,
    };
    if let Some(header) = &options.header {
        writer.line(header);
        writer.blank();
    }
    writer.write_module(root);
    writer.output
}

/// Name serde sees for an emitted identifier.
fn serde_name(emitted: &str) -> &str {
    emitted.strip_prefix("r#").unwrap_or(emitted)
}

/// Variant name for a literal value in a synthesized enum.
pub fn variant_name(value: &str) -> String {
    let members = rust_convention(DeclKind::Enum)
        .members
        .unwrap_or(Case::Pascal);
    to_identifier(value, members, case_of(value))
}

/// Hands out unique names within one enum.
#[derive(Default)]
struct VariantNames {
    used: HashSet<String>,
}

impl VariantNames {
    fn claim(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

struct RustWriter<'a> {
    output: String,
    indent: usize,
    options: &'a RustOptions,
    index: &'a DeclIndex,
    /// Source names of the enclosing modules, root first.
    scope: Vec<String>,
    /// Emitted path of the item being written, for diagnostics.
    path: Vec<String>,
    /// Item names already used in each enclosing module.
    taken: Vec<HashSet<String>>,
    diags: &'a mut Diagnostics,
}

impl RustWriter<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }

    fn doc(&mut self, doc: &str) {
        for line in doc.lines() {
            self.line(line);
        }
    }

    fn derives(&mut self) {
        if !self.options.derives.is_empty() {
            let derive = format!("#[derive({})]", self.options.derives.join(", "));
            self.line(&derive);
        }
    }

    fn rename(&mut self, wire: &str) {
        self.line(&format!("#[serde(rename = {wire:?})]"));
    }

    fn write_module(&mut self, module: &Module) {
        self.doc(&module.doc);
        self.line(&format!("pub mod {} {{", escape_ident(module.ident.rust())));
        self.indent += 1;
        self.scope.push(module.ident.original().to_string());
        self.path.push(module.ident.rust().to_string());
        self.taken.push(
            module
                .contents
                .iter()
                .map(|item| item.emitted_name().to_string())
                .collect(),
        );

        let options = self.options;
        for line in &options.prelude {
            self.line(line);
        }
        for item in &module.contents {
            if !self.output.ends_with("{\n") {
                self.blank();
            }
            self.write_item(item);
        }

        self.taken.pop();
        self.path.pop();
        self.scope.pop();
        self.indent -= 1;
        self.line("}");
    }

    fn write_item(&mut self, item: &Item) {
        match item {
            Item::Module(m) => self.write_module(m),
            Item::Struct(s) => self.write_struct(s),
            Item::Enum(e) => self.write_enum(e),
            Item::TypeAlias(a) => self.write_alias(a),
        }
    }

    fn write_struct(&mut self, s: &Struct) {
        let name = escape_ident(s.ident.rust()).into_owned();
        self.path.push(s.ident.rust().to_string());

        let mut hoisted: Vec<(String, &TypeExpr)> = Vec::new();
        self.doc(&s.doc);
        self.derives();
        self.line(&format!("pub struct {name} {{"));
        self.indent += 1;
        for field in &s.members {
            let ty = if let Type::Union(_) = field.ty.ty {
                let union_name = self.claim_item_name(format!(
                    "{}{}",
                    s.ident.rust(),
                    to_case(field.ident.rust(), Case::Pascal)
                ));
                let rendered = self.wrap(&field.ty, union_name.clone());
                hoisted.push((union_name, &field.ty));
                rendered
            } else {
                self.render(&field.ty)
            };
            self.write_field(field, &ty);
        }
        self.indent -= 1;
        self.line("}");

        for (union_name, ty) in hoisted {
            self.blank();
            self.write_union(&union_name, "", ty);
        }
        self.path.pop();
    }

    /// `base`, or `base` with a numeric suffix when the current module
    /// already declares that name.
    fn claim_item_name(&mut self, base: String) -> String {
        let Some(taken) = self.taken.last_mut() else {
            return base;
        };
        let mut name = base.clone();
        let mut n = 2;
        while !taken.insert(name.clone()) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }

    fn write_field(&mut self, field: &Field, ty: &str) {
        let emitted = escape_ident(field.ident.rust());
        self.doc(&field.doc);
        if serde_name(&emitted) != field.ident.original() {
            self.rename(field.ident.original());
        }
        if field.ty.optional && self.options.skip_serializing_none {
            self.line("#[serde(default, skip_serializing_if = \"Option::is_none\")]");
        }
        self.line(&format!("pub {emitted}: {ty},"));
    }

    fn write_enum(&mut self, e: &Enum) {
        self.doc(&e.doc);
        self.derives();
        self.line(&format!("pub enum {} {{", escape_ident(e.ident.rust())));
        self.indent += 1;
        for variant in &e.members {
            self.doc(&variant.doc);
            self.rename(&variant.wire_value().wire());
            self.line(&format!("{},", escape_ident(variant.ident.rust())));
        }
        self.indent -= 1;
        self.line("}");
    }

    fn write_alias(&mut self, a: &TypeAlias) {
        let name = escape_ident(a.ident.original()).into_owned();
        self.path.push(a.ident.original().to_string());
        if let Type::Union(_) = a.def.ty {
            self.write_union(&name, &a.doc, &a.def);
        } else {
            let ty = self.render(&a.def);
            self.doc(&a.doc);
            self.line(&format!("pub type {name} = {ty};"));
        }
        self.path.pop();
    }

    /// Synthesize an enum for an inline union: unit variants with renames for
    /// a closed literal union, otherwise an untagged enum of newtype variants.
    fn write_union(&mut self, name: &str, doc: &str, ty: &TypeExpr) {
        let Type::Union(members) = &ty.ty else {
            return;
        };
        let mut names = VariantNames::default();
        self.doc(doc);
        self.derives();
        match ty.literal_union() {
            Some(literals) => {
                self.line(&format!("pub enum {name} {{"));
                self.indent += 1;
                for literal in literals {
                    let wire = literal.wire();
                    let variant = names.claim(variant_name(&wire));
                    self.rename(&wire);
                    self.line(&format!("{variant},"));
                }
            }
            None => {
                self.line("#[serde(untagged)]");
                self.line(&format!("pub enum {name} {{"));
                self.indent += 1;
                let mut seen = HashSet::new();
                for member in members {
                    let rendered = self.render(member);
                    if !seen.insert(rendered.clone()) {
                        continue;
                    }
                    let variant = names.claim(member_variant_name(member));
                    self.line(&format!("{variant}({rendered}),"));
                }
            }
        }
        self.indent -= 1;
        self.line("}");
    }

    /// Apply modifiers around an already-rendered inner type:
    /// `Option<Vec<T>>`.
    fn wrap(&self, ty: &TypeExpr, inner: String) -> String {
        let inner = if ty.array {
            format!("Vec<{inner}>")
        } else {
            inner
        };
        if ty.optional {
            format!("Option<{inner}>")
        } else {
            inner
        }
    }

    fn render(&mut self, ty: &TypeExpr) -> String {
        let inner = self.render_type(&ty.ty);
        self.wrap(ty, inner)
    }

    fn render_type(&mut self, ty: &Type) -> String {
        let options: &RustOptions = self.options;
        let primitives = &options.primitives;
        match ty {
            Type::Primitive(kind) => primitives.name(*kind).to_string(),
            Type::Literal(Literal::String(_)) => primitives.string.clone(),
            Type::Literal(Literal::Number(_)) => primitives.number.clone(),
            Type::Identifier(name) => self.reference(std::slice::from_ref(name)),
            Type::QualifiedPath(segments) => self.reference(segments),
            Type::Reference(inner) => self.render_type(inner),
            Type::Resolved(path) => path.to_rust(),
            // unions only appear at field and alias positions, where they
            // are hoisted before rendering
            Type::Union(_) | Type::Unknown(_) => primitives.any.clone(),
        }
    }

    fn reference(&mut self, segments: &[String]) -> String {
        if let Some(path) = self.index.resolve(&self.scope, segments) {
            return path.to_rust();
        }
        let written = segments.join(".");
        self.diags.push(
            DiagnosticKind::UnresolvedReference,
            self.path.join("."),
            format!("`{written}` is not declared in this document; emitted verbatim"),
        );
        let (last, modules) = segments.split_last().map_or(("", &[][..]), |(l, m)| (l.as_str(), m));
        modules
            .iter()
            .map(|m| escape_ident(&to_case(m, Case::Snake)).into_owned())
            .chain(std::iter::once(escape_ident(last).into_owned()))
            .collect::<Vec<_>>()
            .join("::")
    }
}

/// Variant name for a member of an untagged union, derived from its type.
fn member_variant_name(member: &TypeExpr) -> String {
    let base = match &member.ty {
        Type::Primitive(Primitive::String) | Type::Literal(Literal::String(_)) => "String".into(),
        Type::Primitive(Primitive::Number) | Type::Literal(Literal::Number(_)) => "Number".into(),
        Type::Primitive(Primitive::Boolean) => "Boolean".into(),
        Type::Primitive(Primitive::Object) => "Object".into(),
        Type::Primitive(Primitive::Any) | Type::Unknown(_) | Type::Union(_) => "Value".into(),
        Type::Identifier(name) => to_case(name, Case::Pascal),
        Type::QualifiedPath(segments) => segments
            .last()
            .map(|s| to_case(s, Case::Pascal))
            .unwrap_or_default(),
        Type::Reference(inner) => member_variant_name(&TypeExpr::new((**inner).clone())),
        Type::Resolved(path) => path
            .segments
            .last()
            .map(|s| to_case(s, Case::Pascal))
            .unwrap_or_default(),
    };
    let base = if base.is_empty() { "Value".to_string() } else { base };
    if member.array {
        format!("{base}List")
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::deduplicate;
    use crate::ir::{Enum, Field, Struct, TypeAlias, Variant};
    use crate::normalize::normalize;

    fn emit(root: Module) -> (String, Diagnostics) {
        let mut root = normalize(root);
        let mut diags = Diagnostics::new();
        deduplicate(&mut root, &mut diags);
        let out = generate_rust_types(&root, &RustOptions::default(), &mut diags);
        (out, diags)
    }

    fn lit(s: &str) -> TypeExpr {
        TypeExpr::new(Type::Literal(Literal::String(s.into())))
    }

    #[test]
    fn modifiers_nest_option_outside_vec() {
        let (out, _) = emit(Module::new("net").with_item(Item::Struct(Struct::new(
            "Lists",
            vec![
                Field::new(
                    "tags",
                    TypeExpr::primitive(Primitive::String).array().optional(),
                ),
                Field::new("scores", TypeExpr::primitive(Primitive::Number).array()),
            ],
        ))));
        assert!(out.contains("pub tags: Option<Vec<String>>,"), "{out}");
        assert!(out.contains("pub scores: Vec<f64>,"), "{out}");
    }

    #[test]
    fn renamed_fields_carry_original_spelling() {
        let (out, _) = emit(Module::new("net").with_item(Item::Struct(Struct::new(
            "Request",
            vec![
                Field::new("requestId", TypeExpr::primitive(Primitive::String)),
                Field::new("hasPostData", TypeExpr::primitive(Primitive::Boolean)),
                Field::new("type", TypeExpr::primitive(Primitive::String)),
            ],
        ))));
        assert!(out.contains("#[serde(rename = \"requestId\")]\n        pub request_id: String,"), "{out}");
        assert!(out.contains("#[serde(rename = \"hasPostData\")]\n        pub has_post_data: bool,"));
        assert!(out.contains("pub r#type: String,"));
        assert!(!out.contains("rename = \"type\""));
    }

    #[test]
    fn enum_variants_always_carry_wire_value() {
        let mut root = normalize(Module::new("net").with_item(Item::Enum(Enum::new(
            "Level",
            vec![
                Variant::new("low", Some(Literal::Number(1.0))),
                Variant::new("high", None),
            ],
        ))));
        let mut diags = Diagnostics::new();
        deduplicate(&mut root, &mut diags);
        let options = RustOptions {
            prelude: Vec::new(),
            ..Default::default()
        };
        let out = generate_rust_types(&root, &options, &mut diags);
        insta::assert_snapshot!(out, @r#"
        pub mod net {
            #[derive(Debug, Clone, Serialize, Deserialize)]
            pub enum Level {
                #[serde(rename = "1")]
                Low,
                #[serde(rename = "high")]
                High,
            }
        }
        "#);
    }

    #[test]
    fn unmatched_alias_union_becomes_enum() {
        let (out, _) = emit(Module::new("net").with_item(Item::TypeAlias(TypeAlias::new(
            "axis",
            TypeExpr::new(Type::Union(vec![lit("x"), lit("y")])),
        ))));
        assert!(out.contains("pub enum axis {"), "{out}");
        assert!(out.contains("#[serde(rename = \"x\")]\n        X,"));
        assert!(out.contains("#[serde(rename = \"y\")]\n        Y,"));
    }

    #[test]
    fn matched_alias_union_becomes_type_alias() {
        let (out, _) = emit(
            Module::new("net")
                .with_item(Item::TypeAlias(TypeAlias::new(
                    "KindName",
                    TypeExpr::new(Type::Union(vec![lit("A"), lit("B")])),
                )))
                .with_item(Item::Enum(Enum::new(
                    "Kind",
                    vec![Variant::new("A", None), Variant::new("B", None)],
                ))),
        );
        assert!(out.contains("pub type KindName = Kind;"), "{out}");
        assert_eq!(out.matches("pub enum").count(), 1);
    }

    #[test]
    fn unmatched_field_union_is_hoisted() {
        let (out, _) = emit(Module::new("net").with_item(Item::Struct(Struct::new(
            "Ping",
            vec![Field::new(
                "mode",
                TypeExpr::new(Type::Union(vec![lit("fast"), lit("slow")])).optional(),
            )],
        ))));
        assert!(out.contains("pub mode: Option<PingMode>,"), "{out}");
        assert!(out.contains("pub enum PingMode {"));
        assert!(out.contains("#[serde(rename = \"fast\")]\n        Fast,"));
    }

    #[test]
    fn hoisted_union_avoids_declared_names() {
        let (out, _) = emit(
            Module::new("net")
                .with_item(Item::Struct(Struct::new(
                    "Ping",
                    vec![Field::new(
                        "kind",
                        TypeExpr::new(Type::Union(vec![lit("a"), lit("b")])),
                    )],
                )))
                .with_item(Item::Struct(Struct::new(
                    "PingKind",
                    vec![Field::new("id", TypeExpr::primitive(Primitive::Number))],
                ))),
        );
        assert!(out.contains("pub kind: PingKind2,"), "{out}");
        assert!(out.contains("pub enum PingKind2 {"), "{out}");
        assert_eq!(out.matches("pub struct PingKind {").count(), 1);
    }

    #[test]
    fn mixed_union_is_untagged() {
        let (out, _) = emit(Module::new("net").with_item(Item::TypeAlias(TypeAlias::new(
            "Id",
            TypeExpr::new(Type::Union(vec![
                TypeExpr::primitive(Primitive::String),
                TypeExpr::primitive(Primitive::Number),
                lit("auto"),
            ])),
        ))));
        assert!(out.contains("#[serde(untagged)]\n    pub enum Id {"), "{out}");
        assert!(out.contains("String(String),"));
        assert!(out.contains("Number(f64),"));
        assert_eq!(out.matches("(String),").count(), 1);
    }

    #[test]
    fn references_resolve_to_emitted_names() {
        let (out, diags) = emit(
            Module::new("Protocol")
                .with_item(Item::Module(Module::new("Common").with_item(Item::Struct(
                    Struct::new("frameInfo", vec![]),
                ))))
                .with_item(Item::Module(Module::new("Page").with_item(Item::Struct(
                    Struct::new(
                        "Frame",
                        vec![
                            Field::new(
                                "info",
                                TypeExpr::new(Type::Reference(Box::new(Type::QualifiedPath(
                                    vec!["Common".into(), "frameInfo".into()],
                                )))),
                            ),
                            Field::new(
                                "at",
                                TypeExpr::new(Type::Reference(Box::new(Type::Identifier(
                                    "Date".into(),
                                )))),
                            ),
                        ],
                    ),
                )))),
        );
        assert!(out.contains("pub info: super::common::FrameInfo,"), "{out}");
        assert!(out.contains("pub at: Date,"));
        assert_eq!(diags.count(DiagnosticKind::UnresolvedReference), 1);
    }

    #[test]
    fn docs_are_indented_with_their_item() {
        let (out, _) = emit(
            Module::new("net").with_item(Item::Struct(Struct::new(
                "Ping",
                vec![Field::new("id", TypeExpr::primitive(Primitive::Number)).with_doc("Ping id.")],
            ))),
        );
        assert!(out.contains("        /**\n         * Ping id.\n         */\n        pub id: f64,"), "{out}");
    }

    #[test]
    fn variant_names_are_valid_identifiers() {
        assert_eq!(variant_name("x"), "X");
        assert_eq!(variant_name("no-cors"), "NoCors");
        assert_eq!(variant_name("1"), "V1");
        assert_eq!(variant_name(""), "V");
        let mut names = VariantNames::default();
        assert_eq!(names.claim("A".into()), "A");
        assert_eq!(names.claim("A".into()), "A2");
    }

    #[test]
    fn escapes_keywords() {
        assert_eq!(escape_ident("type"), "r#type");
        assert_eq!(escape_ident("self"), "self_");
        assert_eq!(escape_ident("kind"), "kind");
    }
}
