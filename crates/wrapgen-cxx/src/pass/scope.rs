// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Scope assignment and qualified-id resolution.
//!
//! # Scope assignment
//!
//! [`assign_scopes`] walks the tree once, assigning every node its parent
//! and rebuilding the per-scope name maps from scratch. It must be re-run
//! after any pass that adds, removes, or moves members (the injection pass
//! does); resolution reads only the maps this pass produces.
//!
//! Registration rules:
//! - Only single-component names register; out-of-line `A::B` definitions
//!   wait for the injection pass.
//! - A forward-declared struct registers in the *weak* map only, so it can
//!   satisfy type references without shadowing a real definition.
//! - An unscoped enum additionally registers its constants in the enclosing
//!   scope, as C++ does.
//!
//! # Resolution
//!
//! [`Resolver::resolve`] is a pure query implementing C++ lookup over the
//! assigned structure:
//! - an id rooted at global scope restarts at the module root;
//! - a leading component that denotes a typedef is chased to its underlying
//!   type (looping, since typedefs chain) before descending further;
//! - a miss in the local map searches base classes recursively before
//!   falling back to the enclosing scope;
//! - a `stop` boundary caps the fallback so that searching the bases of a
//!   base never climbs back out into *its* enclosing scopes.
//!
//! Resolution never fails loudly: an unresolvable id is `None` and the
//! caller decides whether that is fatal.

use crate::nodes::{Base, DeclTree, Id, NodeId, NodeKind, QualifiedId};

/// Assign parents and rebuild all per-scope name maps.
pub fn assign_scopes(tree: &mut DeclTree) {
    let root = tree.root();
    tree.node_mut(root).parent = None;
    assign_level(tree, root);
}

fn assign_level(tree: &mut DeclTree, container: NodeId) {
    if let Some(scope) = tree.kind_mut(container).scope_mut() {
        scope.clear();
    }
    let members: Vec<NodeId> = tree
        .kind(container)
        .members()
        .map(|m| m.to_vec())
        .unwrap_or_default();
    for member in members {
        tree.node_mut(member).parent = Some(container);
        register(tree, container, member);
        assign_level(tree, member);
    }
}

/// Register one member in its container's name maps.
fn register(tree: &mut DeclTree, container: NodeId, member: NodeId) {
    enum Entry {
        Strong(String),
        Weak(String),
        None,
    }

    let entry = match tree.kind(member) {
        NodeKind::Namespace(n) => Entry::Strong(n.name.clone()),
        NodeKind::Struct(s) => match s.name.last_name() {
            Some(name) if s.name.is_simple() => {
                if s.forward {
                    Entry::Weak(name.to_string())
                } else {
                    Entry::Strong(name.to_string())
                }
            }
            _ => Entry::None,
        },
        NodeKind::Enum(e) => e
            .name
            .clone()
            .map(Entry::Strong)
            .unwrap_or(Entry::None),
        NodeKind::EnumConstant(c) => Entry::Strong(c.name.clone()),
        NodeKind::Typedef(t) => match t.name() {
            Some(q) if q.is_simple() => Entry::Strong(q.parts[0].name.clone()),
            _ => Entry::None,
        },
        NodeKind::Declaration(d) => match d.name() {
            Some(q) if q.is_simple() => Entry::Strong(q.parts[0].name.clone()),
            _ => Entry::None,
        },
        NodeKind::Module(_)
        | NodeKind::Using(_)
        | NodeKind::Friend(_)
        | NodeKind::Access(_) => Entry::None,
    };

    // Unscoped enum constants leak into the enclosing scope.
    let leaked: Vec<(String, NodeId)> = match tree.kind(member) {
        NodeKind::Enum(e) if !e.scoped => e
            .constants
            .iter()
            .filter_map(|&c| match tree.kind(c) {
                NodeKind::EnumConstant(k) => Some((k.name.clone(), c)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let Some(scope) = tree.kind_mut(container).scope_mut() else {
        return;
    };
    match entry {
        Entry::Strong(name) => scope.insert(name, member),
        Entry::Weak(name) => scope.insert_weak(name, member),
        Entry::None => {}
    }
    for (name, id) in leaked {
        scope.insert(name, id);
    }
}

/// Pure qualified-id resolution over an assigned tree.
pub struct Resolver<'t> {
    tree: &'t DeclTree,
}

/// Cap on typedef chains; anything deeper is a cycle.
const TYPEDEF_CHASE_LIMIT: usize = 64;

impl<'t> Resolver<'t> {
    pub fn new(tree: &'t DeclTree) -> Self {
        Resolver { tree }
    }

    /// Resolve `id` as seen from `scope`. Returns the entity it denotes, or
    /// `None`.
    pub fn resolve(&self, scope: NodeId, id: &QualifiedId) -> Option<NodeId> {
        if id.parts.is_empty() {
            return None;
        }
        if id.global {
            let root = self.tree.root();
            self.lookup(root, &id.parts, Some(root), false, &mut Vec::new())
        } else {
            self.lookup(scope, &id.parts, None, true, &mut Vec::new())
        }
    }

    /// Resolve one base-class edge of `struct_id`, chasing typedefs so a
    /// `typedef`'d base still yields the struct entity.
    pub fn resolve_base(&self, struct_id: NodeId, base: &Base) -> Option<NodeId> {
        // Base names are written in the scope enclosing the class.
        let from = self.tree.parent(struct_id)?;
        let hit = self.resolve(from, &base.target)?;
        let hit = self.chase_typedefs(hit)?;
        matches!(self.tree.kind(hit), NodeKind::Struct(_)).then_some(hit)
    }

    /// `seen` tracks structs whose bases are already being searched, so a
    /// base-class cycle in the input cannot recurse forever.
    fn lookup(
        &self,
        scope: NodeId,
        parts: &[Id],
        stop: Option<NodeId>,
        bases: bool,
        seen: &mut Vec<NodeId>,
    ) -> Option<NodeId> {
        let (first, rest) = parts.split_first()?;

        if let Some(hit) = self.local(scope, &first.name) {
            if rest.is_empty() {
                return Some(hit);
            }
            // Descend: `hit` must expose a scope; typedefs are transparent.
            let target = self.chase_typedefs(hit)?;
            return self.lookup(target, rest, Some(target), true, &mut vec![target]);
        }

        if bases {
            if let NodeKind::Struct(s) = self.tree.kind(scope) {
                if !seen.contains(&scope) {
                    seen.push(scope);
                }
                for base in &s.bases {
                    let Some(b) = self.resolve_base(scope, base) else {
                        continue;
                    };
                    if seen.contains(&b) {
                        continue;
                    }
                    seen.push(b);
                    if let Some(hit) = self.lookup(b, parts, Some(b), true, seen) {
                        return Some(hit);
                    }
                }
            }
        }

        if Some(scope) == stop {
            return None;
        }
        let parent = self.tree.parent(scope)?;
        self.lookup(parent, parts, stop, bases, seen)
    }

    fn local(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.tree.kind(scope).scope().and_then(|s| s.lookup(name))
    }

    /// Follow a typedef (chain) to the entity its underlying type names.
    fn chase_typedefs(&self, mut id: NodeId) -> Option<NodeId> {
        let mut depth = 0;
        while let NodeKind::Typedef(td) = self.tree.kind(id) {
            depth += 1;
            if depth > TYPEDEF_CHASE_LIMIT {
                return None;
            }
            let under = td.ty.named_concrete()?;
            let from = self.tree.parent(id)?;
            id = self.resolve(from, under)?;
        }
        Some(id)
    }
}
