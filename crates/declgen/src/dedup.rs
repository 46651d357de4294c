//! Union deduplication.
//!
//! Closed literal unions whose member set equals the wire values of a
//! declared enum are replaced by a reference to that enum. Unions with no
//! matching enum stay inline and the writer turns them into fresh enums.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::index::DeclIndex;
use crate::ir::{Item, Module, RelativePath, Type, TypeExpr, WireKey};
use std::collections::BTreeSet;

/// Where inside its owning item a union sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Field(usize),
    AliasDef,
}

/// A closed literal union found in the tree.
#[derive(Debug, Clone)]
pub struct UnionSite {
    /// Emitted path of the owning item, root first.
    pub item: Vec<String>,
    /// How many leading entries of `item` are modules.
    pub module_depth: usize,
    pub slot: Slot,
    /// Emitted name of the field, for fields.
    pub member: Option<String>,
    pub values: BTreeSet<WireKey>,
}

impl UnionSite {
    /// Full dotted path, e.g. `net.Ping.kind`.
    pub fn key(&self) -> String {
        let mut parts = self.item.clone();
        parts.extend(self.member.iter().cloned());
        parts.join(".")
    }

    fn module_path(&self) -> &[String] {
        &self.item[..self.module_depth]
    }
}

/// Every closed literal union in the tree, in traversal order.
#[derive(Debug, Default)]
pub struct UnionIndex {
    pub sites: Vec<UnionSite>,
}

/// A declared enum and its wire-value set.
#[derive(Debug, Clone)]
pub struct EnumSite {
    /// Emitted path, root first, enum name last.
    pub path: Vec<String>,
    pub values: BTreeSet<WireKey>,
}

impl EnumSite {
    fn module_path(&self) -> &[String] {
        &self.path[..self.path.len() - 1]
    }
}

/// Outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub unions: usize,
    pub enums: usize,
    pub rewritten: usize,
}

fn value_set(ty: &TypeExpr) -> Option<BTreeSet<WireKey>> {
    ty.literal_union()
        .map(|lits| lits.into_iter().map(|l| l.key()).collect())
}

/// Walk the tree and record every closed literal union at a field or alias
/// position.
pub fn discover_unions(root: &Module) -> UnionIndex {
    let mut index = UnionIndex::default();
    let mut path = vec![root.ident.rust().to_string()];
    collect_unions(root, &mut path, &mut index);
    index
}

fn collect_unions(module: &Module, path: &mut Vec<String>, index: &mut UnionIndex) {
    let module_depth = path.len();
    for item in &module.contents {
        path.push(item.emitted_name().to_string());
        match item {
            Item::Module(m) => collect_unions(m, path, index),
            Item::Struct(s) => {
                for (i, field) in s.members.iter().enumerate() {
                    if let Some(values) = value_set(&field.ty) {
                        index.sites.push(UnionSite {
                            item: path.clone(),
                            module_depth,
                            slot: Slot::Field(i),
                            member: Some(field.ident.rust().to_string()),
                            values,
                        });
                    }
                }
            }
            Item::TypeAlias(a) => {
                if let Some(values) = value_set(&a.def) {
                    index.sites.push(UnionSite {
                        item: path.clone(),
                        module_depth,
                        slot: Slot::AliasDef,
                        member: None,
                        values,
                    });
                }
            }
            // variants carry no type
            Item::Enum(_) => {}
        }
        path.pop();
    }
}

/// Every enum in the tree with its wire-value set, in traversal order.
pub fn scan_enums(root: &Module) -> Vec<EnumSite> {
    let mut out = Vec::new();
    let mut path = vec![root.ident.rust().to_string()];
    collect_enums(root, &mut path, &mut out);
    out
}

fn collect_enums(module: &Module, path: &mut Vec<String>, out: &mut Vec<EnumSite>) {
    for item in &module.contents {
        path.push(item.emitted_name().to_string());
        match item {
            Item::Module(m) => collect_enums(m, path, out),
            Item::Enum(e) if !e.members.is_empty() => out.push(EnumSite {
                path: path.clone(),
                values: e.wire_values().iter().map(|l| l.key()).collect(),
            }),
            _ => {}
        }
        path.pop();
    }
}

/// Path from the module holding `site` to `target`, with the shared module
/// prefix elided.
fn relative_path(site: &UnionSite, target: &EnumSite) -> RelativePath {
    let from = site.module_path();
    let to = target.module_path();
    let common = from
        .iter()
        .zip(to)
        .take_while(|(a, b)| a == b)
        .count();
    RelativePath {
        up: from.len() - common,
        segments: target.path[common..].to_vec(),
    }
}

/// Replace every union that matches an enum with a reference to it.
pub fn deduplicate(root: &mut Module, diags: &mut Diagnostics) -> DedupStats {
    let unions = discover_unions(root);
    let enums = scan_enums(root);
    let index = DeclIndex::build(root);
    let mut stats = DedupStats {
        unions: unions.sites.len(),
        enums: enums.len(),
        rewritten: 0,
    };

    for site in &unions.sites {
        let mut matches = enums.iter().filter(|e| e.values == site.values);
        let Some(target) = matches.next() else {
            continue;
        };
        let others: Vec<String> = matches.map(|e| e.path.join(".")).collect();
        if !others.is_empty() {
            diags.push(
                DiagnosticKind::AmbiguousMatch,
                site.key(),
                format!(
                    "union matches {} and {}; using the first",
                    target.path.join("."),
                    others.join(", ")
                ),
            );
        }

        let Some(slot) = index
            .handle(&site.item)
            .and_then(|handle| root.item_mut(handle))
            .and_then(|item| slot_mut(item, site.slot))
        else {
            continue;
        };
        let rel = relative_path(site, target);
        tracing::trace!(union = %site.key(), target = %rel.to_rust(), "union replaced");
        *slot = TypeExpr {
            ty: Type::Reference(Box::new(Type::Resolved(rel))),
            array: slot.array,
            optional: slot.optional,
        };
        stats.rewritten += 1;
    }

    tracing::debug!(
        unions = stats.unions,
        enums = stats.enums,
        rewritten = stats.rewritten,
        "unions deduplicated"
    );
    stats
}

fn slot_mut(item: &mut Item, slot: Slot) -> Option<&mut TypeExpr> {
    match (item, slot) {
        (Item::Struct(s), Slot::Field(i)) => s.members.get_mut(i).map(|f| &mut f.ty),
        (Item::TypeAlias(a), Slot::AliasDef) => Some(&mut a.def),
        _ => None,
    }
}
