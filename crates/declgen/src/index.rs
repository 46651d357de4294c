//! Declaration index.
//!
//! Built once over a normalized tree. Maps emitted item paths to node
//! handles (child indices from the root) and answers scope-aware lookups of
//! source names, so references never hold pointers into the tree.

use crate::ir::{Item, Module, RelativePath};
use std::collections::HashMap;

/// Position of an item: child indices walked from the root module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle(Vec<usize>);

impl NodeHandle {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Module,
    Struct,
    Enum,
    TypeAlias,
}

#[derive(Debug, Clone)]
struct Entry {
    emitted: String,
    kind: EntryKind,
}

/// Index over a declaration tree.
#[derive(Debug, Default)]
pub struct DeclIndex {
    /// Emitted dotted path → handle. The root module has an empty handle.
    handles: HashMap<Vec<String>, NodeHandle>,
    /// Source module path → source name → entry. The empty path is the
    /// document scope and holds only the root module.
    scopes: HashMap<Vec<String>, HashMap<String, Entry>>,
}

impl DeclIndex {
    pub fn build(root: &Module) -> Self {
        let mut index = DeclIndex::default();
        let root_source = root.ident.original().to_string();
        index.scopes.entry(Vec::new()).or_default().insert(
            root_source.clone(),
            Entry {
                emitted: root.ident.rust().to_string(),
                kind: EntryKind::Module,
            },
        );
        index
            .handles
            .insert(vec![root.ident.rust().to_string()], NodeHandle(Vec::new()));
        index.walk(
            root,
            &mut vec![root_source],
            &mut vec![root.ident.rust().to_string()],
            &mut Vec::new(),
        );
        tracing::debug!(items = index.handles.len(), "declaration index built");
        index
    }

    fn walk(
        &mut self,
        module: &Module,
        source: &mut Vec<String>,
        emitted: &mut Vec<String>,
        handle: &mut Vec<usize>,
    ) {
        for (i, item) in module.contents.iter().enumerate() {
            let kind = match item {
                Item::Module(_) => EntryKind::Module,
                Item::Struct(_) => EntryKind::Struct,
                Item::Enum(_) => EntryKind::Enum,
                Item::TypeAlias(_) => EntryKind::TypeAlias,
            };
            let name = item.ident().original().to_string();
            let emitted_name = item.emitted_name().to_string();
            self.scopes.entry(source.clone()).or_default().insert(
                name.clone(),
                Entry {
                    emitted: emitted_name.clone(),
                    kind,
                },
            );

            handle.push(i);
            emitted.push(emitted_name);
            self.handles
                .insert(emitted.clone(), NodeHandle(handle.clone()));
            if let Item::Module(child) = item {
                source.push(name);
                self.walk(child, source, emitted, handle);
                source.pop();
            }
            emitted.pop();
            handle.pop();
        }
    }

    /// Handle of the item at an emitted path (root name first).
    pub fn handle(&self, path: &[String]) -> Option<&NodeHandle> {
        self.handles.get(path)
    }

    /// Resolve a source reference used inside the module at `scope` (source
    /// names, root first). Enclosing scopes are searched innermost first; the
    /// result is relative to `scope`.
    pub fn resolve(&self, scope: &[String], segments: &[String]) -> Option<RelativePath> {
        let (last, prefix) = segments.split_last()?;
        for depth in (0..=scope.len()).rev() {
            if let Some(path) = self.lookup(&scope[..depth], prefix, last) {
                return Some(RelativePath {
                    up: scope.len() - depth,
                    segments: path,
                });
            }
        }
        None
    }

    fn lookup(&self, base: &[String], modules: &[String], last: &str) -> Option<Vec<String>> {
        let mut current = base.to_vec();
        let mut path = Vec::new();
        for name in modules {
            let entry = self.scopes.get(&current)?.get(name)?;
            if entry.kind != EntryKind::Module {
                return None;
            }
            path.push(entry.emitted.clone());
            current.push(name.clone());
        }
        let entry = self.scopes.get(&current)?.get(last)?;
        if entry.kind == EntryKind::Module {
            return None;
        }
        path.push(entry.emitted.clone());
        Some(path)
    }
}

impl Module {
    /// Item at `handle`. An empty handle has no item (it is the root).
    #[cfg(test)]
    pub fn item(&self, handle: &NodeHandle) -> Option<&Item> {
        let (last, parents) = handle.indices().split_last()?;
        let mut module = self;
        for &i in parents {
            match module.contents.get(i)? {
                Item::Module(m) => module = m,
                _ => return None,
            }
        }
        module.contents.get(*last)
    }

    pub fn item_mut(&mut self, handle: &NodeHandle) -> Option<&mut Item> {
        let (last, parents) = handle.indices().split_last()?;
        let mut module = self;
        for &i in parents {
            match module.contents.get_mut(i)? {
                Item::Module(m) => module = m,
                _ => return None,
            }
        }
        module.contents.get_mut(*last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Enum, Field, Primitive, Struct, TypeExpr, Variant};
    use crate::normalize::normalize;

    fn tree() -> Module {
        normalize(
            Module::new("Protocol")
                .with_item(Item::Module(
                    Module::new("Common").with_item(Item::Enum(Enum::new(
                        "Kind",
                        vec![Variant::new("A", None)],
                    ))),
                ))
                .with_item(Item::Module(Module::new("Net").with_item(Item::Struct(
                    Struct::new(
                        "ping",
                        vec![Field::new("id", TypeExpr::primitive(Primitive::Number))],
                    ),
                )))),
        )
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn handles_reach_items() {
        let root = tree();
        let index = DeclIndex::build(&root);
        let handle = index.handle(&path(&["protocol", "net", "Ping"])).unwrap();
        assert_eq!(handle.indices(), &[1, 0]);
        assert_eq!(root.item(handle).unwrap().ident().original(), "ping");
        assert!(index.handle(&path(&["protocol", "net", "ping"])).is_none());
    }

    #[test]
    fn resolves_through_enclosing_scopes() {
        let index = DeclIndex::build(&tree());
        let scope = path(&["Protocol", "Net"]);

        let local = index.resolve(&scope, &path(&["ping"])).unwrap();
        assert_eq!(local.to_rust(), "Ping");

        let sibling = index.resolve(&scope, &path(&["Common", "Kind"])).unwrap();
        assert_eq!(sibling.to_rust(), "super::common::Kind");

        let absolute = index
            .resolve(&scope, &path(&["Protocol", "Common", "Kind"]))
            .unwrap();
        assert_eq!(absolute.to_rust(), "super::super::protocol::common::Kind");
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        let index = DeclIndex::build(&tree());
        let scope = path(&["Protocol", "Net"]);
        assert!(index.resolve(&scope, &path(&["Date"])).is_none());
        assert!(index.resolve(&scope, &path(&["Common"])).is_none());
        assert!(index.resolve(&scope, &path(&["Kind"])).is_none());
    }
}
