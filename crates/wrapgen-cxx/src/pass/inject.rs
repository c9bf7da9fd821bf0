// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Scope injection for out-of-line nested definitions.
//!
//! C++ allows defining a nested entity outside its class or namespace:
//!
//! ```text
//! struct A { struct B; void f(); };
//! struct A::B { ... };      // declared at the outer scope
//! void A::f() { ... }
//! ```
//!
//! The front-end leaves such definitions where they appear textually, with
//! their multi-component name intact. This pass resolves each name's scoping
//! prefix from the definition's current container, moves the node into the
//! scope the prefix denotes, and trims the name down to its last component.
//!
//! An unresolvable prefix is reported with a warning and the definition is
//! left in place; `assign_scopes` must be re-run afterwards so the moved
//! members appear in their new scope's name maps.

use tracing::warn;

use crate::nodes::{DeclTree, NodeId, NodeKind, QualifiedId};
use crate::pass::scope::Resolver;

/// Relocate every out-of-line `A::B` definition into the scope its
/// qualifier names. Callers must re-run `assign_scopes` afterwards.
pub fn inject_nested_scopes(tree: &mut DeclTree) {
    let moves = plan_moves(tree);
    for (container, member, target) in moves {
        tree.remove_member(container, member);
        tree.push_member(target, member);
        trim_name(tree, member);
    }
}

/// Collect (container, member, target) moves without mutating the tree.
fn plan_moves(tree: &DeclTree) -> Vec<(NodeId, NodeId, NodeId)> {
    let resolver = Resolver::new(tree);
    let mut moves = Vec::new();

    for i in 0..tree.nodes.len() {
        let container = NodeId(i as u32);
        let Some(members) = tree.kind(container).members() else {
            continue;
        };
        for &member in members {
            let Some(qid) = tree.kind(member).declared_qid() else {
                continue;
            };
            if qid.parts.len() < 2 {
                continue;
            }
            let prefix = QualifiedId {
                global: qid.global,
                parts: qid.parts[..qid.parts.len() - 1].to_vec(),
            };
            match resolver.resolve(container, &prefix) {
                Some(target) if tree.kind(target).scope().is_some() => {
                    moves.push((container, member, target));
                }
                Some(target) => {
                    warn!(
                        name = %qid,
                        target = %tree.qualified_name(target),
                        "out-of-line definition targets a non-scope entity; leaving in place"
                    );
                }
                None => {
                    warn!(
                        name = %qid,
                        scope = %tree.qualified_name(container),
                        "cannot resolve scoping prefix of out-of-line definition; leaving in place"
                    );
                }
            }
        }
    }
    moves
}

/// Reduce the moved entity's declared name to its last component.
fn trim_name(tree: &mut DeclTree, member: NodeId) {
    match tree.kind_mut(member) {
        NodeKind::Struct(s) => {
            if let Some(last) = s.name.parts.pop() {
                s.name = QualifiedId {
                    global: false,
                    parts: vec![last],
                };
            }
        }
        NodeKind::Typedef(t) => {
            if let Some(q) = t.ty.inner.declared_name_mut() {
                if let Some(last) = q.parts.pop() {
                    *q = QualifiedId {
                        global: false,
                        parts: vec![last],
                    };
                }
            }
        }
        NodeKind::Declaration(d) => {
            if let Some(q) = d.ty.inner.declared_name_mut() {
                if let Some(last) = q.parts.pop() {
                    *q = QualifiedId {
                        global: false,
                        parts: vec![last],
                    };
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::*;
    use crate::pass::scope::assign_scopes;

    fn class(tree: &mut DeclTree, parent: NodeId, name: QualifiedId) -> NodeId {
        let id = tree.alloc(NodeKind::Struct(StructNode {
            struct_kind: StructKind::Class,
            name,
            bases: Vec::new(),
            body: Vec::new(),
            forward: false,
            visibility: Visibility::Public,
            scope: Scope::default(),
        }));
        tree.push_member(parent, id);
        id
    }

    fn method(tree: &mut DeclTree, parent: NodeId, name: QualifiedId) -> NodeId {
        let id = tree.alloc(NodeKind::Declaration(DeclarationNode {
            ty: Type::pod(
                "void",
                Declarator::Function {
                    inner: Box::new(Declarator::Named { id: name }),
                    params: vec![],
                    const_method: false,
                    ref_qualifier: RefQualifier::None,
                },
            ),
            template_params: None,
            visibility: Visibility::Public,
            storage: StorageClass::None,
            virtual_: false,
            pure: false,
            inline: false,
        }));
        tree.push_member(parent, id);
        id
    }

    #[test]
    fn out_of_line_nested_struct_moves_into_owner() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let a = class(&mut tree, root, QualifiedId::from_name("A"));
        let b = class(&mut tree, root, QualifiedId::from_parts(["A", "B"]));
        assign_scopes(&mut tree);

        inject_nested_scopes(&mut tree);
        assign_scopes(&mut tree);

        let NodeKind::Struct(owner) = tree.kind(a) else {
            unreachable!()
        };
        assert_eq!(owner.body, vec![b]);
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.qualified_name(b), "A::B");

        // The relocated definition now resolves as A::B.
        let r = Resolver::new(&tree);
        assert_eq!(
            r.resolve(root, &QualifiedId::from_parts(["A", "B"])),
            Some(b)
        );
        // ...and no longer pollutes the module scope under a bare name.
        assert_eq!(r.resolve(root, &QualifiedId::from_name("B")), None);
    }

    #[test]
    fn out_of_line_method_moves_and_trims_name() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let a = class(&mut tree, root, QualifiedId::from_name("A"));
        let f = method(&mut tree, root, QualifiedId::from_parts(["A", "f"]));
        assign_scopes(&mut tree);

        inject_nested_scopes(&mut tree);
        assign_scopes(&mut tree);

        assert_eq!(tree.parent(f), Some(a));
        let NodeKind::Declaration(d) = tree.kind(f) else {
            unreachable!()
        };
        assert_eq!(d.last_name(), Some("f"));
        assert!(d.name().map(|q| q.is_simple()).unwrap_or(false));
    }

    #[test]
    fn definition_with_unresolvable_prefix_stays_put() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let orphan = class(&mut tree, root, QualifiedId::from_parts(["Ghost", "B"]));
        assign_scopes(&mut tree);

        inject_nested_scopes(&mut tree);
        assign_scopes(&mut tree);

        assert_eq!(tree.parent(orphan), Some(root));
        let NodeKind::Struct(s) = tree.kind(orphan) else {
            unreachable!()
        };
        assert_eq!(s.name.parts.len(), 2);
    }

    #[test]
    fn injection_into_namespace_scope() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let ns = tree.alloc(NodeKind::Namespace(NamespaceNode {
            name: "ns".to_string(),
            members: Vec::new(),
            scope: Scope::default(),
        }));
        tree.push_member(root, ns);
        let w = class(&mut tree, root, QualifiedId::from_parts(["ns", "Widget"]));
        assign_scopes(&mut tree);

        inject_nested_scopes(&mut tree);
        assign_scopes(&mut tree);

        assert_eq!(tree.parent(w), Some(ns));
        assert_eq!(tree.qualified_name(w), "ns::Widget");
    }
}
