//! Naming normalization.
//!
//! Rewrites every identifier in the declaration tree to the Rust convention
//! for its kind, keeping the original spelling for rename annotations, and
//! reformats doc strings into `/** ... */` blocks.

use crate::convention::{
    Case, DeclKind, case_of, dominant_case, is_identifier, rust_convention, to_case,
    to_case_from, to_identifier,
};
use crate::ir::{Enum, Field, Ident, Item, Module, Struct, TypeAlias, Variant};

/// Normalize a whole tree. Returns a new tree whose identifiers are all
/// [`Ident::Resolved`].
pub fn normalize(root: Module) -> Module {
    let mut normalizer = Normalizer::default();
    let root = normalizer.module(root);
    tracing::debug!(renamed = normalizer.renamed, "identifiers normalized");
    root
}

/// Wrap a doc string in a `/** ... */` block, one ` * ` prefix per line.
/// Empty docs stay empty; docs already in block form are returned unchanged.
pub fn rust_doc(doc: &str) -> String {
    if doc.is_empty() || doc.starts_with("/**") {
        return doc.to_string();
    }
    let mut out = String::from("/**\n");
    for line in doc.lines() {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(" * ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(" */");
    out
}

#[derive(Default)]
struct Normalizer {
    renamed: usize,
}

impl Normalizer {
    fn ident(&mut self, ident: Ident, case: Case) -> Ident {
        let from = ident.original().to_string();
        let to = to_case(&from, case);
        self.finish(from, to, case)
    }

    /// Names that still are not identifiers (`x-request-id` among snake_case
    /// siblings, `1st`) are converted on their own.
    fn finish(&mut self, from: String, to: String, case: Case) -> Ident {
        let to = if is_identifier(&to) {
            to
        } else {
            to_identifier(&from, case, case_of(&from))
        };
        if from != to {
            tracing::trace!(%from, %to, "renamed");
            self.renamed += 1;
        }
        Ident::Resolved { from, to }
    }

    /// Rename a sibling set. Members are only rewritten when their dominant
    /// style differs from `target`, and every member is split the way the
    /// dominant style splits.
    fn members(&mut self, idents: Vec<Ident>, target: Case) -> Vec<Ident> {
        let dominant = dominant_case(idents.iter().map(Ident::original));
        idents
            .into_iter()
            .map(|ident| {
                let from = ident.original().to_string();
                let to = match dominant {
                    Some(style) if style != target => to_case_from(&from, target, style),
                    _ => from.clone(),
                };
                self.finish(from, to, target)
            })
            .collect()
    }

    fn module(&mut self, module: Module) -> Module {
        let convention = rust_convention(DeclKind::Module);
        Module {
            ident: self.ident(module.ident, convention.ident),
            doc: rust_doc(&module.doc),
            contents: module
                .contents
                .into_iter()
                .map(|item| self.item(item))
                .collect(),
        }
    }

    fn item(&mut self, item: Item) -> Item {
        match item {
            Item::Module(m) => Item::Module(self.module(m)),
            Item::Struct(s) => Item::Struct(self.structure(s)),
            Item::Enum(e) => Item::Enum(self.enumeration(e)),
            Item::TypeAlias(a) => Item::TypeAlias(self.alias(a)),
        }
    }

    fn structure(&mut self, s: Struct) -> Struct {
        let convention = rust_convention(DeclKind::Struct);
        let members_case = convention.members.unwrap_or(Case::Snake);
        let (idents, rest): (Vec<Ident>, Vec<Field>) = s
            .members
            .into_iter()
            .map(|f| (f.ident.clone(), f))
            .unzip();
        let members = self
            .members(idents, members_case)
            .into_iter()
            .zip(rest)
            .map(|(ident, field)| Field {
                ident,
                doc: rust_doc(&field.doc),
                ty: field.ty,
            })
            .collect();
        Struct {
            ident: self.ident(s.ident, convention.ident),
            doc: rust_doc(&s.doc),
            members,
        }
    }

    fn enumeration(&mut self, e: Enum) -> Enum {
        let convention = rust_convention(DeclKind::Enum);
        let members_case = convention.members.unwrap_or(Case::Pascal);
        let (idents, rest): (Vec<Ident>, Vec<Variant>) = e
            .members
            .into_iter()
            .map(|v| (v.ident.clone(), v))
            .unzip();
        let members = self
            .members(idents, members_case)
            .into_iter()
            .zip(rest)
            .map(|(ident, variant)| Variant {
                ident,
                doc: rust_doc(&variant.doc),
                init: variant.init,
            })
            .collect();
        Enum {
            ident: self.ident(e.ident, convention.ident),
            doc: rust_doc(&e.doc),
            members,
        }
    }

    /// The definition is left alone: inline unions keep their literal
    /// spellings until the writer turns them into variants.
    fn alias(&mut self, a: TypeAlias) -> TypeAlias {
        let convention = rust_convention(DeclKind::TypeAlias);
        TypeAlias {
            ident: self.ident(a.ident, convention.ident),
            doc: rust_doc(&a.doc),
            def: a.def,
        }
    }
}
