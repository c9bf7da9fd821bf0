// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Typedef collapsing and qualified-id rescoping.
//!
//! # Typedef resolution
//!
//! [`resolve_typedefs`] rewrites a type in place until its concrete part no
//! longer names a resolvable typedef: the use site's declarator chain is
//! spliced onto the typedef's own chain (the declared identifier survives,
//! every wrapper from both sides survives), the concrete part becomes the
//! typedef's concrete part, and the result is rescoped from the typedef's
//! defining scope into the use scope. A fixed allow-list of typedefs is kept
//! unexpanded for API readability: fixed-width integer aliases, the
//! `size_t` family, and platform handle types.
//!
//! # Rescoping
//!
//! [`rescope_type`] rewrites every non-global qualified id in type position
//! (concrete part, template arguments, member-pointer class, parameter
//! types) so that a type written relative to `from` stays correct when
//! viewed from `to` — e.g. a method inherited into a derived class, or a
//! nested type promoted out of its original scope. Declarator identifiers
//! (the declared names themselves) are literal and never rescoped.
//!
//! Rescoping requires resolution to succeed and the scopes to share an
//! ancestor; either failure is a structural inconsistency surfaced as an
//! error, fatal to the whole run when raised during typedef resolution.

use wrapgen_core::WrapError;

use crate::nodes::{
    replace_innermost, Concrete, Declarator, DeclTree, NodeId, NodeKind, QualifiedId, Type,
};
use crate::pass::scope::Resolver;

/// Typedefs kept unexpanded for readability of the generated bindings.
pub const KEEP_TYPEDEFS: &[&str] = &[
    "size_t",
    "ssize_t",
    "ptrdiff_t",
    "time_t",
    "intptr_t",
    "uintptr_t",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
    "FILE",
    "HANDLE",
];

/// Cap on typedef substitution rounds; anything deeper is a cycle.
const SUBSTITUTION_LIMIT: usize = 64;

/// Collapse typedefs in `ty` as seen from `scope`, in place.
///
/// Applying this twice yields the same type as applying it once.
pub fn resolve_typedefs(tree: &DeclTree, ty: &mut Type, scope: NodeId) -> Result<(), WrapError> {
    let resolver = Resolver::new(tree);
    let mut rounds = 0;
    loop {
        rounds += 1;
        if rounds > SUBSTITUTION_LIMIT {
            return Err(WrapError::malformed(format!(
                "typedef chain exceeds {} substitutions in scope `{}`",
                SUBSTITUTION_LIMIT,
                tree.qualified_name(scope)
            )));
        }

        let Some(qid) = ty.named_concrete() else {
            break;
        };
        if qid
            .last_name()
            .is_some_and(|n| KEEP_TYPEDEFS.contains(&n))
        {
            break;
        }
        let Some(entity) = resolver.resolve(scope, qid) else {
            break;
        };
        let NodeKind::Typedef(td) = tree.kind(entity) else {
            break;
        };

        // Full structural copy: rescoping mutates id lists in place and the
        // typedef's own type must never be touched.
        let mut under = td.ty.clone();
        let from = tree.parent(entity).unwrap_or_else(|| tree.root());
        rescope_type(tree, &mut under, from, scope)?;
        splice(ty, under);
    }

    // The concrete part is settled; collapse typedefs inside template
    // arguments and parameter types too.
    if let Concrete::Named { id } = &mut ty.concrete {
        for part in &mut id.parts {
            for arg in &mut part.template_args {
                resolve_typedefs(tree, arg, scope)?;
            }
        }
    }
    resolve_in_declarator(tree, &mut ty.inner, scope)?;
    Ok(())
}

fn resolve_in_declarator(
    tree: &DeclTree,
    d: &mut Declarator,
    scope: NodeId,
) -> Result<(), WrapError> {
    match d {
        Declarator::Named { .. } | Declarator::Anonymous => Ok(()),
        Declarator::Pointer { inner }
        | Declarator::Reference { inner }
        | Declarator::Array { inner, .. }
        | Declarator::MemberPointer { inner, .. }
        | Declarator::Cv { inner, .. } => resolve_in_declarator(tree, inner, scope),
        Declarator::Function { inner, params, .. } => {
            for p in params.iter_mut() {
                resolve_typedefs(tree, p, scope)?;
            }
            resolve_in_declarator(tree, inner, scope)
        }
    }
}

/// Replace the use site's base type with the typedef's underlying type,
/// keeping the use site's declared identifier and outer wrappers.
fn splice(ty: &mut Type, under: Type) {
    let keep = ty.inner.innermost().clone();
    let use_chain = std::mem::replace(&mut ty.inner, Declarator::Anonymous);
    let td_chain = replace_innermost(under.inner, keep);
    ty.inner = replace_innermost(use_chain, td_chain);
    ty.concrete = under.concrete;
}

/// Rewrite `ty` so that ids written relative to `from` are correct relative
/// to `to`.
pub fn rescope_type(
    tree: &DeclTree,
    ty: &mut Type,
    from: NodeId,
    to: NodeId,
) -> Result<(), WrapError> {
    if from == to {
        return Ok(());
    }
    if let Concrete::Named { id } = &mut ty.concrete {
        rescope_qid(tree, id, from, to)?;
    }
    rescope_declarator(tree, &mut ty.inner, from, to)
}

fn rescope_declarator(
    tree: &DeclTree,
    d: &mut Declarator,
    from: NodeId,
    to: NodeId,
) -> Result<(), WrapError> {
    match d {
        // Declared identifiers are literal names, not type references.
        Declarator::Named { .. } | Declarator::Anonymous => Ok(()),
        Declarator::Pointer { inner }
        | Declarator::Reference { inner }
        | Declarator::Array { inner, .. }
        | Declarator::Cv { inner, .. } => rescope_declarator(tree, inner, from, to),
        Declarator::MemberPointer { inner, class } => {
            rescope_qid(tree, class, from, to)?;
            rescope_declarator(tree, inner, from, to)
        }
        Declarator::Function { inner, params, .. } => {
            for p in params.iter_mut() {
                rescope_type(tree, p, from, to)?;
            }
            rescope_declarator(tree, inner, from, to)
        }
    }
}

/// Rewrite one qualified id from `from`-relative to `to`-relative form.
///
/// The id is resolved in `from`; the new prefix is built by walking up from
/// the resolved entity until a scope that is an ancestor-or-self of `to` is
/// reached. Global ids need no prefix rewriting (only their template
/// arguments are visited).
pub fn rescope_qid(
    tree: &DeclTree,
    qid: &mut QualifiedId,
    from: NodeId,
    to: NodeId,
) -> Result<(), WrapError> {
    for part in &mut qid.parts {
        for arg in &mut part.template_args {
            rescope_type(tree, arg, from, to)?;
        }
    }
    if qid.global {
        return Ok(());
    }

    let resolver = Resolver::new(tree);
    let Some(entity) = resolver.resolve(from, qid) else {
        return Err(WrapError::Unresolved {
            id: qid.to_string(),
            scope: tree.qualified_name(from),
        });
    };

    let mut names: Vec<String> = Vec::new();
    if let Some(name) = tree.name_of(entity) {
        names.push(name);
    } else {
        return Err(WrapError::malformed(format!(
            "rescoping `{}` resolved to an unnamed entity",
            qid
        )));
    }

    let mut cursor = tree.parent(entity);
    loop {
        let Some(scope) = cursor else {
            return Err(WrapError::NoCommonAncestor {
                id: qid.to_string(),
                from: tree.qualified_name(from),
                to: tree.qualified_name(to),
            });
        };
        if tree.is_ancestor(scope, to) {
            break;
        }
        if let Some(name) = tree.name_of(scope) {
            names.push(name);
        }
        cursor = tree.parent(scope);
    }

    names.reverse();
    let mut parts: Vec<crate::nodes::Id> =
        names.into_iter().map(crate::nodes::Id::new).collect();
    // The rebuilt prefix names scopes; template arguments belong to the
    // original spelling's components, so reattach them to the part with the
    // matching name (the innermost component always matches itself).
    for part in &mut parts {
        if let Some(orig) = qid.parts.iter().find(|o| o.name == part.name) {
            part.template_args = orig.template_args.clone();
        }
    }
    qid.parts = parts;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::*;
    use crate::pass::scope::assign_scopes;

    fn namespace(tree: &mut DeclTree, parent: NodeId, name: &str) -> NodeId {
        let id = tree.alloc(NodeKind::Namespace(NamespaceNode {
            name: name.to_string(),
            members: Vec::new(),
            scope: Scope::default(),
        }));
        tree.push_member(parent, id);
        id
    }

    fn class(tree: &mut DeclTree, parent: NodeId, name: &str) -> NodeId {
        let id = tree.alloc(NodeKind::Struct(StructNode {
            struct_kind: StructKind::Class,
            name: QualifiedId::from_name(name),
            bases: Vec::new(),
            body: Vec::new(),
            forward: false,
            visibility: Visibility::Public,
            scope: Scope::default(),
        }));
        tree.push_member(parent, id);
        id
    }

    fn typedef(tree: &mut DeclTree, parent: NodeId, name: &str, ty: Type) -> NodeId {
        let mut ty = ty;
        let inner = std::mem::replace(&mut ty.inner, Declarator::Anonymous);
        ty.inner = replace_innermost(inner, Declarator::named(name));
        let id = tree.alloc(NodeKind::Typedef(TypedefNode {
            ty,
            visibility: Visibility::Public,
        }));
        tree.push_member(parent, id);
        id
    }

    fn ptr(inner: Declarator) -> Declarator {
        Declarator::Pointer {
            inner: Box::new(inner),
        }
    }

    #[test]
    fn plain_typedef_collapses_to_underlying_pod() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        // typedef int myint;
        typedef(&mut tree, root, "myint", Type::pod("int", Declarator::Anonymous));
        assign_scopes(&mut tree);

        // myint x;
        let mut ty = Type::named(QualifiedId::from_name("myint"), Declarator::named("x"));
        resolve_typedefs(&tree, &mut ty, root).unwrap();
        assert_eq!(render_type(&ty, false), "int x");
    }

    #[test]
    fn pointer_typedef_splices_wrappers() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        // typedef int* intp;
        typedef(
            &mut tree,
            root,
            "intp",
            Type::pod("int", ptr(Declarator::Anonymous)),
        );
        assign_scopes(&mut tree);

        // intp* x;  ->  int** x
        let mut ty = Type::named(QualifiedId::from_name("intp"), ptr(Declarator::named("x")));
        resolve_typedefs(&tree, &mut ty, root).unwrap();
        assert_eq!(render_type(&ty, false), "int** x");
    }

    #[test]
    fn chained_typedefs_collapse_fully() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        typedef(&mut tree, root, "a", Type::pod("int", Declarator::Anonymous));
        typedef(
            &mut tree,
            root,
            "b",
            Type::named(QualifiedId::from_name("a"), Declarator::Anonymous),
        );
        assign_scopes(&mut tree);

        let mut ty = Type::named(QualifiedId::from_name("b"), Declarator::named("x"));
        resolve_typedefs(&tree, &mut ty, root).unwrap();
        assert_eq!(render_type(&ty, true), "int");
    }

    #[test]
    fn resolution_is_a_fixed_point() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        typedef(
            &mut tree,
            root,
            "intp",
            Type::pod("int", ptr(Declarator::Anonymous)),
        );
        assign_scopes(&mut tree);

        let mut once = Type::named(QualifiedId::from_name("intp"), Declarator::named("x"));
        resolve_typedefs(&tree, &mut once, root).unwrap();
        let mut twice = once.clone();
        resolve_typedefs(&tree, &mut twice, root).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn allow_listed_typedefs_are_kept() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        // Even with a definition in scope, size_t survives.
        typedef(
            &mut tree,
            root,
            "size_t",
            Type::pod("unsigned long", Declarator::Anonymous),
        );
        assign_scopes(&mut tree);

        let mut ty = Type::named(QualifiedId::from_name("size_t"), Declarator::named("n"));
        resolve_typedefs(&tree, &mut ty, root).unwrap();
        assert_eq!(render_type(&ty, true), "size_t");
    }

    #[test]
    fn typedef_from_other_scope_is_rescoped() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let ns = namespace(&mut tree, root, "ns");
        let widget = class(&mut tree, ns, "Widget");
        // Inside ns: typedef Widget handle;  (Widget written bare)
        typedef(
            &mut tree,
            ns,
            "handle",
            Type::named(QualifiedId::from_name("Widget"), Declarator::Anonymous),
        );
        assign_scopes(&mut tree);
        let _ = widget;

        // At module scope: ns::handle h;  ->  ns::Widget h
        let mut ty = Type::named(
            QualifiedId::from_parts(["ns", "handle"]),
            Declarator::named("h"),
        );
        resolve_typedefs(&tree, &mut ty, root).unwrap();
        assert_eq!(render_type(&ty, true), "ns::Widget");
    }

    #[test]
    fn template_arguments_are_collapsed_too() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        class(&mut tree, root, "vector");
        typedef(&mut tree, root, "myint", Type::pod("int", Declarator::Anonymous));
        assign_scopes(&mut tree);

        // vector<myint> v;
        let mut arg = Type::named(QualifiedId::from_name("myint"), Declarator::Anonymous);
        arg.init = None;
        let mut vec_id = QualifiedId::from_name("vector");
        vec_id.parts[0].template_args = vec![arg];
        let mut ty = Type::named(vec_id, Declarator::named("v"));
        resolve_typedefs(&tree, &mut ty, root).unwrap();
        assert_eq!(render_type(&ty, true), "vector<int>");
    }

    #[test]
    fn rescope_into_derived_scope_prefixes_base_types() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let ns = namespace(&mut tree, root, "ns");
        let base = class(&mut tree, ns, "Base");
        let style = class(&mut tree, base, "Style");
        let other = namespace(&mut tree, root, "other");
        let derived = class(&mut tree, other, "Derived");
        assign_scopes(&mut tree);
        let _ = (style, derived);

        // A method on ns::Base returns `Style` (bare). Seen from
        // other::Derived the type must be spelled ns::Base::Style.
        let mut ty = Type::named(QualifiedId::from_name("Style"), Declarator::Anonymous);
        rescope_type(&tree, &mut ty, base, derived).unwrap();
        assert_eq!(render_type(&ty, true), "ns::Base::Style");
    }

    #[test]
    fn rescope_round_trip_restores_prefix() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let ns = namespace(&mut tree, root, "ns");
        let widget = class(&mut tree, ns, "Widget");
        let inner = namespace(&mut tree, ns, "detail");
        assign_scopes(&mut tree);
        let _ = widget;

        // ns is an ancestor of ns::detail. Rescope ns -> detail -> ns.
        let original = Type::named(QualifiedId::from_name("Widget"), Declarator::Anonymous);
        let mut ty = original.clone();
        rescope_type(&tree, &mut ty, ns, inner).unwrap();
        // Widget resolves from detail through the enclosing scope; its
        // spelling relative to detail is still just "Widget".
        rescope_type(&tree, &mut ty, inner, ns).unwrap();
        assert_eq!(ty, original);
    }

    #[test]
    fn rescope_round_trip_with_prefix_change() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let a = class(&mut tree, root, "A");
        let nested = class(&mut tree, a, "N");
        assign_scopes(&mut tree);
        let _ = nested;

        // From inside A, `N` is bare; from the module root it is `A::N`.
        let mut ty = Type::named(QualifiedId::from_name("N"), Declarator::Anonymous);
        rescope_type(&tree, &mut ty, a, root).unwrap();
        assert_eq!(render_type(&ty, true), "A::N");
        rescope_type(&tree, &mut ty, root, a).unwrap();
        // A is an ancestor-or-self boundary, so the prefix collapses again.
        assert_eq!(render_type(&ty, true), "N");
    }

    #[test]
    fn rescope_keeps_template_args_on_prefix_components() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let outer = class(&mut tree, root, "Outer");
        class(&mut tree, outer, "Inner");
        let elsewhere = class(&mut tree, root, "Elsewhere");
        assign_scopes(&mut tree);

        // Outer<int>::Inner, spelled at module scope, seen from Elsewhere.
        let mut qid = QualifiedId::from_parts(["Outer", "Inner"]);
        qid.parts[0].template_args = vec![Type::pod("int", Declarator::Anonymous)];
        let mut ty = Type::named(qid, Declarator::Anonymous);
        rescope_type(&tree, &mut ty, root, elsewhere).unwrap();
        assert_eq!(render_type(&ty, true), "Outer<int>::Inner");
    }

    #[test]
    fn rescope_unresolved_id_is_an_error() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let a = class(&mut tree, root, "A");
        assign_scopes(&mut tree);

        let mut ty = Type::named(QualifiedId::from_name("Ghost"), Declarator::Anonymous);
        let err = rescope_type(&tree, &mut ty, a, root).unwrap_err();
        assert!(matches!(err, WrapError::Unresolved { .. }));
    }

    #[test]
    fn rescope_detached_scope_has_no_common_ancestor() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let a = class(&mut tree, root, "A");
        class(&mut tree, a, "N");
        // A scope that was never attached to the tree.
        let detached = tree.alloc(NodeKind::Namespace(NamespaceNode {
            name: "limbo".to_string(),
            members: Vec::new(),
            scope: Scope::default(),
        }));
        assign_scopes(&mut tree);

        let mut ty = Type::named(QualifiedId::from_name("N"), Declarator::Anonymous);
        let err = rescope_type(&tree, &mut ty, a, detached).unwrap_err();
        assert!(matches!(err, WrapError::NoCommonAncestor { .. }));
    }

    #[test]
    fn global_ids_are_not_rescoped() {
        let mut tree = DeclTree::new("m");
        let root = tree.root();
        let a = class(&mut tree, root, "A");
        class(&mut tree, root, "G");
        assign_scopes(&mut tree);

        let mut qid = QualifiedId::from_name("G");
        qid.global = true;
        let mut ty = Type::named(qid.clone(), Declarator::Anonymous);
        rescope_type(&tree, &mut ty, root, a).unwrap();
        assert_eq!(ty.named_concrete(), Some(&qid));
    }
}
