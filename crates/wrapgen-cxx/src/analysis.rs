// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Whole-module analysis: the driver that turns a raw declaration tree into
//! a binding plan.
//!
//! [`Analyzer::run`] prepares the tree (visibility, scopes, injection),
//! then visits every class definition and emits one [`ClassAnalysis`] with
//! the adaptor decision and the flattened, policy-filtered method set. Hash
//! keys are assigned per class as methods are emitted, so regenerating the
//! same module yields byte-identical output.
//!
//! A class whose analysis fails to resolve a type (in a method it must
//! import, typically) is reported and skipped; the rest of the module is
//! still produced. Structural inconsistencies — a tree that fails
//! validation, a typedef cycle, rescoping with no common ancestor — abort
//! the whole run instead: the tree itself is broken and every class after
//! the first failure would be suspect.

use serde::Serialize;
use tracing::{debug, warn};
use wrapgen_core::{Policy, PolicyAnswer, PropertyRole, WrapError};

use crate::nodes::{DeclTree, NodeId, NodeKind, Visibility};
use crate::pass;
use crate::pass::adaptor::{Collector, DEFAULT_ROOT_OBJECT};
use crate::pass::signature::HashRegistry;

/// One method in the binding plan.
#[derive(Debug, Clone, Serialize)]
pub struct MethodBinding {
    pub name: String,
    /// Call signature, e.g. `"(int, int) const"`.
    pub signature: String,
    /// Stable per-class overload key.
    pub hash_key: String,
    /// Qualified name of the declaring class.
    pub declared_in: String,
    #[serde(rename = "virtual")]
    pub virtual_: bool,
    pub pure: bool,
    pub overridden: bool,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub signal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyRole>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub owning_receiver: bool,
}

/// The binding plan for one class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassAnalysis {
    /// Fully qualified class name.
    pub name: String,
    pub needs_adaptor: bool,
    pub methods: Vec<MethodBinding>,
}

/// A class the analysis had to give up on.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedClass {
    pub name: String,
    pub reason: String,
}

/// The binding plan for one module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleAnalysis {
    pub module: String,
    pub classes: Vec<ClassAnalysis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedClass>,
}

/// Drives the passes and the decision engine over one tree.
pub struct Analyzer<'p> {
    tree: DeclTree,
    policy: &'p dyn Policy,
    root_object: String,
}

impl<'p> Analyzer<'p> {
    pub fn new(tree: DeclTree, policy: &'p dyn Policy) -> Self {
        Analyzer {
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

    /// Produce the module's binding plan.
    ///
    /// Fails only on structural inconsistencies in the tree; a class that
    /// merely fails to resolve is skipped and listed in the output.
    pub fn run(mut self) -> Result<ModuleAnalysis, WrapError> {
        self.tree.validate()?;
        pass::prepare(&mut self.tree);

        let module = match self.tree.kind(self.tree.root()) {
            NodeKind::Module(m) => m.name.clone(),
            _ => String::new(),
        };
        let collector =
            Collector::new(&self.tree, self.policy).with_root_object(self.root_object.clone());
        let mut hashes = HashRegistry::new();

        let mut classes = Vec::new();
        let mut skipped = Vec::new();
        for id in self.tree.structs() {
            let NodeKind::Struct(s) = self.tree.kind(id) else {
                continue;
            };
            if s.forward {
                continue;
            }
            let name = self.tree.qualified_name(id);
            match self.analyze_class(&collector, &mut hashes, id, &name) {
                Ok(class) => {
                    debug!(
                        class = %class.name,
                        methods = class.methods.len(),
                        needs_adaptor = class.needs_adaptor,
                        "analyzed class"
                    );
                    classes.push(class);
                }
                Err(
                    err @ (WrapError::NoCommonAncestor { .. }
                    | WrapError::MalformedTree { .. }),
                ) => {
                    // The tree itself is inconsistent; no per-class recovery.
                    return Err(err);
                }
                Err(err) => {
                    warn!(class = %name, error = %err, "skipping class");
                    skipped.push(SkippedClass {
                        name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(ModuleAnalysis {
            module,
            classes,
            skipped,
        })
    }

    fn analyze_class(
        &self,
        collector: &Collector<'_>,
        hashes: &mut HashRegistry,
        id: NodeId,
        name: &str,
    ) -> Result<ClassAnalysis, WrapError> {
        let needs_adaptor = collector.needs_adaptor(id)?;
        let map = collector.collect_all_methods(id)?;

        let mut methods = Vec::new();
        for entry in map.values().flatten() {
            // Private members are invisible to the binding; they only
            // matter to the adaptor decision above.
            if entry.visibility == Visibility::Private {
                continue;
            }
            let rules: PolicyAnswer = self
                .policy
                .query(name, &format!("{}{}", entry.name, entry.signature));
            if rules.drop {
                continue;
            }
            // Keys are scoped to the declaring type and derived from the
            // method's home-scope spelling, so an inherited method keeps
            // its key in every class that imports it even when rescoping
            // respells its parameter types.
            let Some(hash_key) = hashes.hash_key(&entry.declared_in, &entry.home_decl) else {
                continue;
            };
            methods.push(MethodBinding {
                name: entry.name.clone(),
                signature: entry.signature.clone(),
                hash_key,
                declared_in: entry.declared_in.clone(),
                virtual_: entry.virtual_,
                pure: entry.pure,
                overridden: entry.overridden,
                visibility: entry.visibility,
                aliases: rules.aliases,
                signal: rules.signal,
                property: rules.property,
                owning_receiver: rules.owning_receiver,
            });
        }

        Ok(ClassAnalysis {
            name: name.to_string(),
            needs_adaptor,
            methods,
        })
    }
}
