// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The declaration model: a tree of typed nodes representing a parsed C++
//! program.
//!
//! # Shape
//!
//! [`DeclTree`] is an arena: it owns a flat `Vec` of [`Node`]s addressed by
//! [`NodeId`], with node 0 being the [`Module`](NodeKind::Module) root.
//! Container nodes (module, namespace, struct, enum) list their members by
//! id; every non-root node gets exactly one parent back-reference, assigned
//! by the scope pass (`pass::scope::assign_scopes`), never by construction.
//!
//! # Serialization
//!
//! The tree is the interchange format with the external front-end parser:
//! nodes carry a `"kind"` discriminator, members are arrays of integer ids.
//! Parent links and per-scope name maps are *not* serialized; they are
//! derived state rebuilt by the passes after every structural mutation.
//!
//! # Mutation discipline
//!
//! The tree is built once per input unit and then mutated only in controlled
//! whole-tree passes (visibility normalization, scope assignment, scope
//! injection). After the passes it is treated as read-mostly; the resolution
//! and decision engines take `&DeclTree`.

pub mod types;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use wrapgen_core::WrapError;

pub use types::{
    render_type, replace_innermost, Concrete, Declarator, FunctionSig, Id, QualifiedId,
    RefQualifier, Type,
};

/// Index of a node in the [`DeclTree`] arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Storage class of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    #[default]
    None,
    Static,
    Extern,
}

/// Class-key of a struct node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructKind {
    Class,
    Struct,
    Union,
}

impl StructKind {
    /// Default member visibility for this container kind.
    pub fn default_visibility(self) -> Visibility {
        match self {
            StructKind::Class => Visibility::Private,
            StructKind::Struct | StructKind::Union => Visibility::Public,
        }
    }
}

/// One base-class edge of a struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Base {
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "virtual")]
    pub virtual_: bool,
    pub target: QualifiedId,
}

impl Base {
    /// A public, non-virtual base.
    pub fn public(target: QualifiedId) -> Self {
        Base {
            visibility: Visibility::Public,
            virtual_: false,
            target,
        }
    }
}

/// Per-scope name maps, rebuilt by `assign_scopes`.
///
/// The strong map holds every defining member; the weak map holds names that
/// must not shadow real definitions, currently only forward-declared structs.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub names: HashMap<String, NodeId>,
    pub weak: HashMap<String, NodeId>,
}

impl Scope {
    /// Strong entries first, then weak ones.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.names
            .get(name)
            .or_else(|| self.weak.get(name))
            .copied()
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.weak.clear();
    }

    /// Insert a strong entry; the first definition of a name wins (overload
    /// sets are recovered from the body, not the map).
    pub fn insert(&mut self, name: impl Into<String>, id: NodeId) {
        self.names.entry(name.into()).or_insert(id);
    }

    pub fn insert_weak(&mut self, name: impl Into<String>, id: NodeId) {
        self.weak.entry(name.into()).or_insert(id);
    }
}

/// Capability boundary for nodes that carry a name map.
///
/// Implemented by the container payloads only; resolution *through*
/// typedefs and enum constants is handled by the resolver itself.
pub trait Scoped {
    fn scope(&self) -> &Scope;
    fn scope_mut(&mut self) -> &mut Scope;
    fn member_ids(&self) -> &[NodeId];
}

/// The tree root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleNode {
    pub name: String,
    #[serde(default)]
    pub members: Vec<NodeId>,
    #[serde(skip)]
    pub scope: Scope,
}

/// `namespace name { ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceNode {
    pub name: String,
    #[serde(default)]
    pub members: Vec<NodeId>,
    #[serde(skip)]
    pub scope: Scope,
}

/// A class, struct, or union.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructNode {
    pub struct_kind: StructKind,
    /// Declared name; multi-component for out-of-line nested definitions
    /// until the injection pass relocates them.
    pub name: QualifiedId,
    #[serde(default)]
    pub bases: Vec<Base>,
    #[serde(default)]
    pub body: Vec<NodeId>,
    /// Forward declaration: no body, no bases; registers only in the weak
    /// name map of its scope.
    #[serde(default)]
    pub forward: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(skip)]
    pub scope: Scope,
}

/// An enum and its ordered constants (constants are child nodes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumNode {
    #[serde(default)]
    pub name: Option<String>,
    /// `enum class`: constants stay inside the enum's own scope.
    #[serde(default)]
    pub scoped: bool,
    #[serde(default)]
    pub constants: Vec<NodeId>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(skip)]
    pub scope: Scope,
}

/// One enum constant: name plus literal initializer text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumConstantNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
}

/// `typedef <ty> name;` — the name is the declarator identifier of `ty`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedefNode {
    pub ty: Type,
    #[serde(default)]
    pub visibility: Visibility,
}

impl TypedefNode {
    pub fn name(&self) -> Option<&QualifiedId> {
        self.ty.inner.declared_name()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.name().and_then(|q| q.last_name())
    }
}

/// One function, method, or variable declaration.
///
/// The declared name is the innermost identifier of the type's declarator
/// chain; there is deliberately no separate name field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationNode {
    pub ty: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_params: Option<Vec<String>>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub storage: StorageClass,
    #[serde(default, rename = "virtual")]
    pub virtual_: bool,
    /// Pure virtual (`= 0`).
    #[serde(default)]
    pub pure: bool,
    #[serde(default)]
    pub inline: bool,
}

impl DeclarationNode {
    pub fn name(&self) -> Option<&QualifiedId> {
        self.ty.inner.declared_name()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.name().and_then(|q| q.last_name())
    }

    pub fn is_function(&self) -> bool {
        self.ty.is_function()
    }

    pub fn is_template(&self) -> bool {
        self.template_params.is_some()
    }

    pub fn is_destructor(&self) -> bool {
        self.last_name().is_some_and(|n| n.starts_with('~'))
    }

    /// Whether this declares a constructor of a class with the given name.
    pub fn is_constructor_of(&self, class: &str) -> bool {
        self.is_function() && self.last_name() == Some(class)
    }
}

/// `using Base::method;` inside a struct body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsingNode {
    pub target: QualifiedId,
    #[serde(default)]
    pub visibility: Visibility,
}

/// A friend declaration, carried verbatim and never resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendNode {
    pub text: String,
}

/// Raw access-label marker (`public:` etc.); consumed by the visibility pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessNode {
    pub visibility: Visibility,
}

/// The closed set of node kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Module(ModuleNode),
    Namespace(NamespaceNode),
    Struct(StructNode),
    Enum(EnumNode),
    EnumConstant(EnumConstantNode),
    Typedef(TypedefNode),
    Declaration(DeclarationNode),
    Using(UsingNode),
    Friend(FriendNode),
    Access(AccessNode),
}

macro_rules! impl_scoped {
    ($ty:ty, $members:ident) => {
        impl Scoped for $ty {
            fn scope(&self) -> &Scope {
                &self.scope
            }
            fn scope_mut(&mut self) -> &mut Scope {
                &mut self.scope
            }
            fn member_ids(&self) -> &[NodeId] {
                &self.$members
            }
        }
    };
}

impl_scoped!(ModuleNode, members);
impl_scoped!(NamespaceNode, members);
impl_scoped!(StructNode, body);
impl_scoped!(EnumNode, constants);

impl NodeKind {
    /// The scope map, if this kind carries one.
    pub fn scope(&self) -> Option<&Scope> {
        match self {
            NodeKind::Module(n) => Some(n.scope()),
            NodeKind::Namespace(n) => Some(n.scope()),
            NodeKind::Struct(n) => Some(n.scope()),
            NodeKind::Enum(n) => Some(n.scope()),
            _ => None,
        }
    }

    pub fn scope_mut(&mut self) -> Option<&mut Scope> {
        match self {
            NodeKind::Module(n) => Some(n.scope_mut()),
            NodeKind::Namespace(n) => Some(n.scope_mut()),
            NodeKind::Struct(n) => Some(n.scope_mut()),
            NodeKind::Enum(n) => Some(n.scope_mut()),
            _ => None,
        }
    }

    /// Ordered member ids, if this kind is a container.
    pub fn members(&self) -> Option<&[NodeId]> {
        match self {
            NodeKind::Module(n) => Some(n.member_ids()),
            NodeKind::Namespace(n) => Some(n.member_ids()),
            NodeKind::Struct(n) => Some(n.member_ids()),
            NodeKind::Enum(n) => Some(n.member_ids()),
            _ => None,
        }
    }

    pub fn members_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeKind::Module(n) => Some(&mut n.members),
            NodeKind::Namespace(n) => Some(&mut n.members),
            NodeKind::Struct(n) => Some(&mut n.body),
            NodeKind::Enum(n) => Some(&mut n.constants),
            _ => None,
        }
    }

    /// The entity's own (unqualified) name, if it has one.
    pub fn own_name(&self) -> Option<String> {
        match self {
            NodeKind::Module(n) => Some(n.name.clone()),
            NodeKind::Namespace(n) => Some(n.name.clone()),
            NodeKind::Struct(n) => n.name.last_name().map(str::to_string),
            NodeKind::Enum(n) => n.name.clone(),
            NodeKind::EnumConstant(n) => Some(n.name.clone()),
            NodeKind::Typedef(n) => n.last_name().map(str::to_string),
            NodeKind::Declaration(n) => n.last_name().map(str::to_string),
            NodeKind::Using(_) | NodeKind::Friend(_) | NodeKind::Access(_) => None,
        }
    }

    /// The declared qualified id, for kinds whose name can be multi-part
    /// (candidates for scope injection).
    pub fn declared_qid(&self) -> Option<&QualifiedId> {
        match self {
            NodeKind::Struct(n) => Some(&n.name),
            NodeKind::Typedef(n) => n.name(),
            NodeKind::Declaration(n) => n.name(),
            _ => None,
        }
    }
}

/// One arena slot: parent back-reference plus the typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(skip)]
    pub parent: Option<NodeId>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// The declaration tree for one input unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclTree {
    pub nodes: Vec<Node>,
}

impl DeclTree {
    /// A tree holding only the module root.
    pub fn new(module_name: impl Into<String>) -> Self {
        DeclTree {
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Module(ModuleNode {
                    name: module_name.into(),
                    members: Vec::new(),
                    scope: Scope::default(),
                }),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a node to the arena (detached; add it to a container with
    /// [`DeclTree::push_member`]).
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { parent: None, kind });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Add `member` to `container`'s ordered member list.
    pub fn push_member(&mut self, container: NodeId, member: NodeId) {
        if let Some(members) = self.kind_mut(container).members_mut() {
            members.push(member);
        }
    }

    /// Remove `member` from `container`'s member list, if present.
    pub fn remove_member(&mut self, container: NodeId, member: NodeId) {
        if let Some(members) = self.kind_mut(container).members_mut() {
            members.retain(|&m| m != member);
        }
    }

    /// The entity's own unqualified name.
    pub fn name_of(&self, id: NodeId) -> Option<String> {
        self.kind(id).own_name()
    }

    /// `A::B::C` path from the module root (the root's own name excluded).
    pub fn qualified_name(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == self.root() {
                break;
            }
            if let Some(name) = self.name_of(n) {
                names.push(name);
            }
            cur = self.parent(n);
        }
        names.reverse();
        names.join("::")
    }

    /// Whether `ancestor` is `id` or one of its transitive parents.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    /// Check the structural invariants deserialized input cannot be trusted
    /// to hold: node 0 is the module root, every member id points into the
    /// arena, and the membership graph is a tree (no node claimed twice, by
    /// itself, or claiming the root).
    ///
    /// Must run before the passes; they index and recurse on member ids
    /// without further checks.
    pub fn validate(&self) -> Result<(), WrapError> {
        match self.nodes.first().map(|n| &n.kind) {
            Some(NodeKind::Module(_)) => {}
            _ => return Err(WrapError::malformed("node 0 must be the module root")),
        }

        let mut owner: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let container = NodeId(i as u32);
            let Some(members) = node.kind.members() else {
                continue;
            };
            for &member in members {
                if member.index() >= self.nodes.len() {
                    return Err(WrapError::malformed(format!(
                        "{container} lists member {member} outside the arena"
                    )));
                }
                if member == self.root() {
                    return Err(WrapError::malformed(format!(
                        "{container} lists the module root as a member"
                    )));
                }
                if member == container {
                    return Err(WrapError::malformed(format!(
                        "{container} lists itself as a member"
                    )));
                }
                if let Some(prev) = owner[member.index()] {
                    return Err(WrapError::malformed(format!(
                        "{member} is a member of both {prev} and {container}"
                    )));
                }
                owner[member.index()] = Some(container);
            }
        }
        Ok(())
    }

    /// Ids of all struct nodes, in arena order.
    pub fn structs(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Struct(_)))
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }
}
