// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visibility propagation.
//!
//! The front-end delivers struct bodies with raw access-label markers
//! (`public:` etc.) interleaved between members, and no visibility stamped
//! on the members themselves. This pass walks every struct body, tracks the
//! current access level (struct/union default public, class default
//! private), stamps it on each member, and removes the markers.
//!
//! Must run before scope assignment: the markers carry no name and would
//! otherwise survive into member lists the other passes iterate.

use crate::nodes::{DeclTree, NodeId, NodeKind};

/// Stamp effective visibility on all struct members and strip access-label
/// markers. Runs once per tree, before any other pass.
pub fn normalize_visibility(tree: &mut DeclTree) {
    for i in 0..tree.nodes.len() {
        let id = NodeId(i as u32);
        if matches!(tree.kind(id), NodeKind::Struct(_)) {
            normalize_struct(tree, id);
        }
    }
}

fn normalize_struct(tree: &mut DeclTree, id: NodeId) {
    let (default, body) = match tree.kind(id) {
        NodeKind::Struct(s) => (s.struct_kind.default_visibility(), s.body.clone()),
        _ => return,
    };

    let mut current = default;
    let mut kept = Vec::with_capacity(body.len());
    for member in body {
        match tree.kind_mut(member) {
            NodeKind::Access(a) => {
                current = a.visibility;
            }
            NodeKind::Declaration(d) => {
                d.visibility = current;
                kept.push(member);
            }
            NodeKind::Typedef(t) => {
                t.visibility = current;
                kept.push(member);
            }
            NodeKind::Enum(e) => {
                e.visibility = current;
                kept.push(member);
            }
            NodeKind::Struct(s) => {
                s.visibility = current;
                kept.push(member);
            }
            NodeKind::Using(u) => {
                u.visibility = current;
                kept.push(member);
            }
            _ => kept.push(member),
        }
    }

    if let NodeKind::Struct(s) = tree.kind_mut(id) {
        s.body = kept;
    }
}
