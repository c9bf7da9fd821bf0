// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Type layer of the declaration model: qualified ids and declarator chains.
//!
//! A C++ type is modeled in two halves:
//! - the **concrete** part ([`Concrete`]) is the base type: a plain-old-data
//!   name, a reference to a struct/enum/typedef by [`QualifiedId`], or a
//!   `__typeof` expression;
//! - the **inner** part ([`Declarator`]) is the chain of outer-type wrappers
//!   (pointer, reference, array, function, member pointer, cv qualifier)
//!   ending in the declarator's identifier.
//!
//! Invariant: following `inner` links from any [`Type`] terminates in exactly
//! one [`Declarator::Named`] or [`Declarator::Anonymous`] node.
//!
//! These are plain owned values. `Clone` performs the full structural copy
//! that the decision engine relies on before re-homing a declaration into a
//! different scope: rescoping mutates qualified-id component lists in place,
//! so a shallow copy would corrupt the original.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One component of a qualified id: a name plus optional template arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Id {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_args: Vec<Type>,
}

impl Id {
    /// A plain component without template arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Id {
            name: name.into(),
            template_args: Vec::new(),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.template_args.is_empty() {
            let args: Vec<String> = self
                .template_args
                .iter()
                .map(|t| render_type(t, true))
                .collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// A possibly namespace/class-prefixed name, e.g. `::gui::Widget<int>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedId {
    /// Rooted at global scope (`::name`).
    #[serde(default)]
    pub global: bool,
    /// Ordered components, outermost scope first. Never empty.
    pub parts: Vec<Id>,
}

impl QualifiedId {
    /// An unrooted single-component id.
    pub fn from_name(name: impl Into<String>) -> Self {
        QualifiedId {
            global: false,
            parts: vec![Id::new(name)],
        }
    }

    /// An unrooted multi-component id.
    pub fn from_parts<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QualifiedId {
            global: false,
            parts: names.into_iter().map(Id::new).collect(),
        }
    }

    /// The last (innermost) component.
    pub fn last(&self) -> Option<&Id> {
        self.parts.last()
    }

    /// The last component's name.
    pub fn last_name(&self) -> Option<&str> {
        self.parts.last().map(|p| p.name.as_str())
    }

    /// Whether the id is a bare single-component name.
    pub fn is_simple(&self) -> bool {
        !self.global && self.parts.len() == 1
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            f.write_str("::")?;
        }
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// Reference qualification of a member function (`&` / `&&` suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefQualifier {
    #[default]
    None,
    Lvalue,
    Rvalue,
}

/// Outer-type wrapper chain ending in the declarator's identifier.
///
/// The chain is read from the outermost wrapper down to the innermost
/// identifier; `Named`/`Anonymous` terminate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declarator {
    /// The declared identifier.
    Named { id: QualifiedId },
    /// No identifier (abstract declarator, unnamed parameter).
    Anonymous,
    Pointer {
        inner: Box<Declarator>,
    },
    Reference {
        inner: Box<Declarator>,
    },
    Array {
        inner: Box<Declarator>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len: Option<String>,
    },
    Function {
        inner: Box<Declarator>,
        #[serde(default)]
        params: Vec<Type>,
        #[serde(default)]
        const_method: bool,
        #[serde(default)]
        ref_qualifier: RefQualifier,
    },
    MemberPointer {
        inner: Box<Declarator>,
        class: QualifiedId,
    },
    Cv {
        inner: Box<Declarator>,
        #[serde(default, rename = "const")]
        const_: bool,
        #[serde(default)]
        volatile: bool,
    },
}

/// Borrowed view of the function wrapper in a declarator chain.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSig<'a> {
    pub params: &'a [Type],
    pub const_method: bool,
    pub ref_qualifier: RefQualifier,
}

impl Declarator {
    /// A bare named declarator.
    pub fn named(name: impl Into<String>) -> Self {
        Declarator::Named {
            id: QualifiedId::from_name(name),
        }
    }

    /// The wrapped declarator, if this is a wrapper node.
    pub fn inner(&self) -> Option<&Declarator> {
        match self {
            Declarator::Named { .. } | Declarator::Anonymous => None,
            Declarator::Pointer { inner }
            | Declarator::Reference { inner }
            | Declarator::Array { inner, .. }
            | Declarator::Function { inner, .. }
            | Declarator::MemberPointer { inner, .. }
            | Declarator::Cv { inner, .. } => Some(inner),
        }
    }

    /// The terminal `Named`/`Anonymous` node of the chain.
    pub fn innermost(&self) -> &Declarator {
        let mut cur = self;
        while let Some(next) = cur.inner() {
            cur = next;
        }
        cur
    }

    /// The declared identifier, if the chain ends in a name.
    pub fn declared_name(&self) -> Option<&QualifiedId> {
        match self.innermost() {
            Declarator::Named { id } => Some(id),
            _ => None,
        }
    }

    /// Mutable access to the declared identifier.
    pub fn declared_name_mut(&mut self) -> Option<&mut QualifiedId> {
        let mut cur = self;
        loop {
            match cur {
                Declarator::Named { id } => return Some(id),
                Declarator::Anonymous => return None,
                Declarator::Pointer { inner }
                | Declarator::Reference { inner }
                | Declarator::Array { inner, .. }
                | Declarator::Function { inner, .. }
                | Declarator::MemberPointer { inner, .. }
                | Declarator::Cv { inner, .. } => cur = inner,
            }
        }
    }

    /// The outermost function wrapper in the chain, if any.
    pub fn function(&self) -> Option<FunctionSig<'_>> {
        let mut cur = self;
        loop {
            if let Declarator::Function {
                params,
                const_method,
                ref_qualifier,
                ..
            } = cur
            {
                return Some(FunctionSig {
                    params,
                    const_method: *const_method,
                    ref_qualifier: *ref_qualifier,
                });
            }
            cur = cur.inner()?;
        }
    }
}

/// Replace the terminal `Named`/`Anonymous` node of `chain` with `repl`,
/// preserving every wrapper. Used to splice a typedef's declarator chain
/// into a use site.
pub fn replace_innermost(chain: Declarator, repl: Declarator) -> Declarator {
    match chain {
        Declarator::Named { .. } | Declarator::Anonymous => repl,
        Declarator::Pointer { inner } => Declarator::Pointer {
            inner: Box::new(replace_innermost(*inner, repl)),
        },
        Declarator::Reference { inner } => Declarator::Reference {
            inner: Box::new(replace_innermost(*inner, repl)),
        },
        Declarator::Array { inner, len } => Declarator::Array {
            inner: Box::new(replace_innermost(*inner, repl)),
            len,
        },
        Declarator::Function {
            inner,
            params,
            const_method,
            ref_qualifier,
        } => Declarator::Function {
            inner: Box::new(replace_innermost(*inner, repl)),
            params,
            const_method,
            ref_qualifier,
        },
        Declarator::MemberPointer { inner, class } => Declarator::MemberPointer {
            inner: Box::new(replace_innermost(*inner, repl)),
            class,
        },
        Declarator::Cv {
            inner,
            const_,
            volatile,
        } => Declarator::Cv {
            inner: Box::new(replace_innermost(*inner, repl)),
            const_,
            volatile,
        },
    }
}

/// The base type a declarator chain wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Concrete {
    /// Plain-old-data type (`int`, `unsigned long`, `void`, ...).
    Pod { name: String },
    /// Reference to a struct, enum, or typedef by qualified id.
    Named { id: QualifiedId },
    /// `__typeof(expr)`.
    Typeof { expr: String },
}

/// The declared type of a value, field, parameter, or return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub concrete: Concrete,
    pub inner: Declarator,
    /// Initializer expression text, verbatim from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
}

impl Type {
    /// A POD-typed value with the given declarator.
    pub fn pod(name: impl Into<String>, inner: Declarator) -> Self {
        Type {
            concrete: Concrete::Pod { name: name.into() },
            inner,
            init: None,
        }
    }

    /// A named-type value with the given declarator.
    pub fn named(id: QualifiedId, inner: Declarator) -> Self {
        Type {
            concrete: Concrete::Named { id },
            inner,
            init: None,
        }
    }

    /// The concrete part's qualified id, if it references a named type.
    pub fn named_concrete(&self) -> Option<&QualifiedId> {
        match &self.concrete {
            Concrete::Named { id } => Some(id),
            _ => None,
        }
    }

    /// Whether the declarator chain contains a function wrapper.
    pub fn is_function(&self) -> bool {
        self.inner.function().is_some()
    }
}

/// Render a type to its canonical textual form.
///
/// With `anonymize` set, the innermost declared identifier is stripped —
/// this is the form call signatures are built from, so two declarations that
/// differ only in parameter names render identically. The output is a
/// deterministic canonical spelling, not necessarily valid C++ declarator
/// syntax.
pub fn render_type(ty: &Type, anonymize: bool) -> String {
    let mut out = match &ty.concrete {
        Concrete::Pod { name } => name.clone(),
        Concrete::Named { id } => id.to_string(),
        Concrete::Typeof { expr } => format!("__typeof({})", expr),
    };
    render_declarator(&ty.inner, anonymize, &mut out);
    out
}

fn render_declarator(d: &Declarator, anonymize: bool, out: &mut String) {
    match d {
        Declarator::Named { id } => {
            if !anonymize {
                out.push(' ');
                out.push_str(&id.to_string());
            }
        }
        Declarator::Anonymous => {}
        Declarator::Pointer { inner } => {
            out.push('*');
            render_declarator(inner, anonymize, out);
        }
        Declarator::Reference { inner } => {
            out.push('&');
            render_declarator(inner, anonymize, out);
        }
        Declarator::Cv {
            inner,
            const_,
            volatile,
        } => {
            if *const_ {
                out.push_str(" const");
            }
            if *volatile {
                out.push_str(" volatile");
            }
            render_declarator(inner, anonymize, out);
        }
        Declarator::MemberPointer { inner, class } => {
            out.push(' ');
            out.push_str(&class.to_string());
            out.push_str("::*");
            render_declarator(inner, anonymize, out);
        }
        Declarator::Array { inner, len } => {
            render_declarator(inner, anonymize, out);
            out.push('[');
            if let Some(len) = len {
                out.push_str(len);
            }
            out.push(']');
        }
        Declarator::Function {
            inner,
            params,
            const_method,
            ref_qualifier,
        } => {
            render_declarator(inner, anonymize, out);
            out.push('(');
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render_type(p, anonymize));
            }
            out.push(')');
            if *const_method {
                out.push_str(" const");
            }
            match ref_qualifier {
                RefQualifier::None => {}
                RefQualifier::Lvalue => out.push_str(" &"),
                RefQualifier::Rvalue => out.push_str(" &&"),
            }
        }
    }
}
