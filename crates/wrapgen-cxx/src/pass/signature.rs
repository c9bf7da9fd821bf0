// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Call signatures and stable per-class hash keys.
//!
//! A call signature is the canonical overload discriminator for a method:
//! the anonymized parameter list plus const/ref qualification, e.g.
//! `"(int, char*) const"`. Parameter names never appear, so renaming a
//! parameter changes nothing downstream.
//!
//! A hash key is a short identifier for an overload that stays stable as
//! long as the overload's signature does: binding tables index generated
//! thunks by `(class, hash key)`, and regenerating bindings after an
//! unrelated edit must not renumber existing entries. The key encodes the
//! qualification as a prefix and a digest of the parameter types, with a
//! numeric suffix only on genuine digest collisions within one class.

use std::collections::HashMap;

use crate::nodes::{render_type, DeclarationNode, RefQualifier};

/// The canonical overload discriminator: `"(params) const &"`.
///
/// Returns `None` for non-function declarations.
pub fn call_signature(decl: &DeclarationNode) -> Option<String> {
    let sig = decl.ty.inner.function()?;
    let mut out = String::from("(");
    for (i, p) in sig.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&render_type(p, true));
    }
    out.push(')');
    if sig.const_method {
        out.push_str(" const");
    }
    match sig.ref_qualifier {
        RefQualifier::None => {}
        RefQualifier::Lvalue => out.push_str(" &"),
        RefQualifier::Rvalue => out.push_str(" &&"),
    }
    Some(out)
}

/// Per-class hash key assignment with collision tracking.
///
/// Keys are only unique within one owner class; the registry remembers which
/// signature each key was handed out for, so asking again for the same
/// signature returns the same key.
#[derive(Debug, Default)]
pub struct HashRegistry {
    /// owner class -> key -> signature the key was assigned for.
    assigned: HashMap<String, HashMap<String, String>>,
}

impl HashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hash key for `decl` within `owner`. `None` for non-functions.
    pub fn hash_key(&mut self, owner: &str, decl: &DeclarationNode) -> Option<String> {
        let sig = decl.ty.inner.function()?;
        let signature = call_signature(decl)?;

        let prefix = match (sig.const_method, sig.ref_qualifier) {
            (false, RefQualifier::None) => "",
            (true, RefQualifier::None) => "c",
            (false, RefQualifier::Lvalue) => "r",
            (true, RefQualifier::Lvalue) => "cr",
            (false, RefQualifier::Rvalue) => "x",
            (true, RefQualifier::Rvalue) => "cx",
        };
        let mut sum: u32 = 0;
        for p in sig.params {
            for b in render_type(p, true).bytes() {
                sum = sum.wrapping_add(u32::from(b));
            }
        }
        let base = format!("{}{:x}", prefix, sum);

        let keys = self.assigned.entry(owner.to_string()).or_default();
        let mut key = base.clone();
        let mut bump = 0usize;
        loop {
            match keys.get(&key) {
                None => {
                    keys.insert(key.clone(), signature);
                    return Some(key);
                }
                Some(existing) if *existing == signature => return Some(key),
                Some(_) => {
                    bump += 1;
                    key = format!("{}_{}", base, bump);
                }
            }
        }
    }
}
