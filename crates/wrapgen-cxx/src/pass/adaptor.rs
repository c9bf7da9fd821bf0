// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Method collection and the adaptor decision.
//!
//! # Method collection
//!
//! A binding for a class exposes its own methods plus everything imported
//! from its (transitive) base classes. [`Collector::collect_all_methods`]
//! flattens that set: every method is deep-copied, its typedefs collapsed in
//! the scope that declared it, and its types rescoped into the target class,
//! so the resulting entries read correctly from the derived class no matter
//! where they were declared. A `using Base::f;` declaration pulls one base
//! method in individually, even when the policy suppresses the wholesale
//! import of that base. Overloads are kept apart by call signature; a
//! redeclaration with the same signature further up the hierarchy does not
//! replace the derived one, but a virtual base declaration marks the derived
//! entry as a virtual override.
//!
//! # The adaptor decision
//!
//! An *adaptor* is a generated subclass that forwards virtual calls back
//! into the target language. [`Collector::needs_adaptor`] decides whether
//! one can and should exist:
//!
//! - a class the policy marks final never gets one;
//! - a private destructor makes the class non-subclassable;
//! - a virtual destructor alone already warrants one;
//! - a pure virtual method the policy drops makes the adaptor impossible
//!   (it would stay abstract), regardless of other virtuals;
//! - otherwise any non-dropped virtual method, or descent from the root
//!   object class, makes one worthwhile.

use std::collections::BTreeMap;

use tracing::warn;
use wrapgen_core::{Policy, WrapError};

use crate::nodes::{DeclTree, DeclarationNode, NodeId, NodeKind, Visibility};
use crate::pass::scope::Resolver;
use crate::pass::signature::call_signature;
use crate::pass::typedefs::{resolve_typedefs, rescope_type};

/// Base class name treated as the binding framework's root object.
pub const DEFAULT_ROOT_OBJECT: &str = "Object";

/// One collected method, re-homed into the target class.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub name: String,
    /// Call signature, e.g. `"(int, int) const"`.
    pub signature: String,
    /// Deep copy of the declaration with typedefs collapsed and types
    /// rescoped into the target class.
    pub decl: DeclarationNode,
    /// The same declaration as spelled in its home scope (typedefs
    /// collapsed, not rescoped). Hash keys are derived from this spelling,
    /// so every class importing the method computes the same key.
    pub home_decl: DeclarationNode,
    /// Qualified name of the class that declared it.
    pub declared_in: String,
    pub virtual_: bool,
    pub pure: bool,
    /// Overrides a virtual declaration further up the hierarchy.
    pub overridden: bool,
    pub visibility: Visibility,
}

/// Collected methods grouped by name; each group is one overload set.
pub type MethodMap = BTreeMap<String, Vec<MethodEntry>>;

/// Method collection and adaptor queries for one tree/policy pair.
pub struct Collector<'t> {
    tree: &'t DeclTree,
    policy: &'t dyn Policy,
    root_object: String,
}

impl<'t> Collector<'t> {
    pub fn new(tree: &'t DeclTree, policy: &'t dyn Policy) -> Self {
        Collector {
            tree,
            policy,
            root_object: DEFAULT_ROOT_OBJECT.to_string(),
        }
    }

    /// Override the root object class name.
    pub fn with_root_object(mut self, name: impl Into<String>) -> Self {
        self.root_object = name.into();
        self
    }

    /// Collect the full flattened method set of `class`, own methods first,
    /// then imported base methods in declaration order.
    pub fn collect_all_methods(&self, class: NodeId) -> Result<MethodMap, WrapError> {
        let mut map = MethodMap::new();
        let mut seen = vec![class];
        self.collect_into(&mut map, class, class, &mut seen)?;
        Ok(map)
    }

    fn collect_into(
        &self,
        map: &mut MethodMap,
        class: NodeId,
        target: NodeId,
        seen: &mut Vec<NodeId>,
    ) -> Result<(), WrapError> {
        self.collect_methods(map, class, target)?;

        let NodeKind::Struct(s) = self.tree.kind(class) else {
            return Ok(());
        };
        let class_q = self.tree.qualified_name(class);
        let resolver = Resolver::new(self.tree);
        for base in &s.bases {
            if !self.policy.import_base(&class_q, &base.target.to_string()) {
                continue;
            }
            let Some(b) = resolver.resolve_base(class, base) else {
                warn!(
                    class = %class_q,
                    base = %base.target,
                    "cannot resolve base class; dropping its members"
                );
                continue;
            };
            if seen.contains(&b) {
                continue;
            }
            seen.push(b);
            self.collect_into(map, b, target, seen)?;
        }
        Ok(())
    }

    /// Collect the methods `class` itself declares, re-homed into `target`.
    ///
    /// An entry whose signature is already present is never replaced; if the
    /// incoming declaration is virtual and declared outside `target`, the
    /// existing entry becomes a virtual override.
    fn collect_methods(
        &self,
        map: &mut MethodMap,
        class: NodeId,
        target: NodeId,
    ) -> Result<(), WrapError> {
        let NodeKind::Struct(s) = self.tree.kind(class) else {
            return Ok(());
        };
        let class_q = self.tree.qualified_name(class);
        let resolver = Resolver::new(self.tree);

        for &member in &s.body {
            // `using Base::f;` pulls a base declaration into this scope,
            // with the using-declaration's own access level.
            let (d, home, visibility) = match self.tree.kind(member) {
                NodeKind::Declaration(d) => (d, class, d.visibility),
                NodeKind::Using(u) => {
                    let Some(hit) = resolver.resolve(class, &u.target) else {
                        warn!(
                            class = %class_q,
                            target = %u.target,
                            "cannot resolve using-declaration; ignoring"
                        );
                        continue;
                    };
                    let NodeKind::Declaration(d) = self.tree.kind(hit) else {
                        continue;
                    };
                    (d, self.tree.parent(hit).unwrap_or(class), u.visibility)
                }
                _ => continue,
            };
            let home_class = self.tree.name_of(home).unwrap_or_default();
            if !d.is_function()
                || d.is_template()
                || d.is_destructor()
                || d.is_constructor_of(&home_class)
            {
                continue;
            }
            let Some(name) = d.last_name().map(str::to_string) else {
                continue;
            };

            let mut decl = d.clone();
            decl.visibility = visibility;
            resolve_typedefs(self.tree, &mut decl.ty, home)?;
            let home_decl = decl.clone();
            rescope_type(self.tree, &mut decl.ty, home, target)?;
            let Some(signature) = call_signature(&decl) else {
                continue;
            };

            let entries = map.entry(name.clone()).or_default();
            if let Some(existing) = entries.iter_mut().find(|e| e.signature == signature) {
                // A virtual declaration arriving from another class marks
                // the kept entry as an override, whether it came through the
                // base walk or a using-declaration.
                if decl.virtual_ && home != target {
                    existing.virtual_ = true;
                    existing.overridden = true;
                }
                continue;
            }
            entries.push(MethodEntry {
                name,
                signature,
                declared_in: self.tree.qualified_name(home),
                virtual_: decl.virtual_,
                pure: decl.pure,
                overridden: false,
                visibility: decl.visibility,
                home_decl,
                decl,
            });
        }
        Ok(())
    }

    /// Whether a forwarding subclass should be generated for `class`.
    pub fn needs_adaptor(&self, class: NodeId) -> Result<bool, WrapError> {
        let class_q = self.tree.qualified_name(class);
        if self.policy.is_final(&class_q) {
            return Ok(false);
        }

        if let Some((virtual_, visibility)) = self.find_destructor(class, &mut vec![class]) {
            if visibility == Visibility::Private {
                return Ok(false);
            }
            if virtual_ {
                return Ok(true);
            }
        }

        let map = self.collect_all_methods(class)?;
        let mut any_virtual = false;
        for entry in map.values().flatten() {
            let rules = self
                .policy
                .query(&class_q, &format!("{}{}", entry.name, entry.signature));
            if entry.pure && rules.drop {
                // The adaptor would stay abstract.
                return Ok(false);
            }
            if (entry.virtual_ || entry.pure) && !rules.drop {
                any_virtual = true;
            }
        }

        if self.derives_from_root(class, &mut vec![class]) {
            return Ok(true);
        }
        Ok(any_virtual)
    }

    /// The effective destructor of `class`: its own if declared, otherwise
    /// the first one found in imported bases.
    fn find_destructor(
        &self,
        class: NodeId,
        seen: &mut Vec<NodeId>,
    ) -> Option<(bool, Visibility)> {
        let NodeKind::Struct(s) = self.tree.kind(class) else {
            return None;
        };
        for &member in &s.body {
            if let NodeKind::Declaration(d) = self.tree.kind(member) {
                if d.is_destructor() {
                    return Some((d.virtual_, d.visibility));
                }
            }
        }
        let class_q = self.tree.qualified_name(class);
        let resolver = Resolver::new(self.tree);
        for base in &s.bases {
            if !self.policy.import_base(&class_q, &base.target.to_string()) {
                continue;
            }
            let Some(b) = resolver.resolve_base(class, base) else {
                continue;
            };
            if seen.contains(&b) {
                continue;
            }
            seen.push(b);
            if let Some(found) = self.find_destructor(b, seen) {
                return Some(found);
            }
        }
        None
    }

    /// Whether `class` transitively derives from the root object class.
    fn derives_from_root(&self, class: NodeId, seen: &mut Vec<NodeId>) -> bool {
        let NodeKind::Struct(s) = self.tree.kind(class) else {
            return false;
        };
        let resolver = Resolver::new(self.tree);
        for base in &s.bases {
            if base.target.last_name() == Some(self.root_object.as_str()) {
                return true;
            }
            let Some(b) = resolver.resolve_base(class, base) else {
                continue;
            };
            if self.tree.name_of(b).as_deref() == Some(self.root_object.as_str()) {
                return true;
            }
            if seen.contains(&b) {
                continue;
            }
            seen.push(b);
            if self.derives_from_root(b, seen) {
                return true;
            }
        }
        false
    }
}
