//! The tree model: a typed, arena-backed tree whose nodes are Sequence, Fallback,
//! Parallel(k) composites or Action/Condition leaves.
//!
//! Nodes are addressed by a string `id` that is unique within a tree. Internally the
//! arena is indexed by [`NodeId`] (a plain integer handle); the id-to-index map gives
//! `find_by_id` its O(1) lookup while still presenting a string-keyed API. The tree is
//! generic over the world port `W` solely because a leaf's bound behavior is a `dyn
//! LeafBehavior<W>`: the structural part of the tree (kinds, children, parents) never
//! touches `W`.

use std::collections::HashMap;

use crate::behavior::LeafBehaviorHandle;
use crate::error::TreeError;
use crate::world::WorldPort;

/// An outcome a composite or leaf can settle into within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failure => "FAILURE",
        }
    }
}

/// Whether a leaf is an Action (may mutate the world) or a Condition (must not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Action,
    Condition,
}

/// The four node shapes a tree is built from. `Leaf` carries no children; the three
/// composites dictate the traversal order for their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sequence,
    Fallback,
    Parallel { k: u32 },
    Leaf { kind: LeafKind },
}

impl NodeKind {
    pub fn is_composite(self) -> bool {
        !matches!(self, NodeKind::Leaf { .. })
    }

    /// The lowercase tag used in ENTRY/EXIT event lines (`sequence|fallback|parallel`).
    /// Leaves never emit composite events, so this is only meaningful for composites.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Sequence => "sequence",
            NodeKind::Fallback => "fallback",
            NodeKind::Parallel { .. } => "parallel",
            NodeKind::Leaf { .. } => "leaf",
        }
    }
}

/// An opaque, dense arena index. Stable for the lifetime of the [`Tree`] it came from;
/// never reused across different trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

pub(crate) struct NodeData<W: WorldPort> {
    pub id: String,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub behavior: Option<LeafBehaviorHandle<W>>,
}

/// A read-only snapshot of one node, returned by [`Tree::node`]/[`Tree::find_by_id`].
pub struct NodeRef<'a, W: WorldPort> {
    tree: &'a Tree<W>,
    node_id: NodeId,
}

impl<'a, W: WorldPort> Clone for NodeRef<'a, W> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, W: WorldPort> Copy for NodeRef<'a, W> {}

impl<'a, W: WorldPort> NodeRef<'a, W> {
    pub fn id(&self) -> &'a str {
        &self.tree.nodes[self.node_id.0].id
    }

    pub fn kind(&self) -> NodeKind {
        self.tree.nodes[self.node_id.0].kind
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn children(&self) -> &'a [NodeId] {
        &self.tree.nodes[self.node_id.0].children
    }

    pub fn children_count(&self) -> usize {
        self.children().len()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.tree.nodes[self.node_id.0].parent
    }

    pub fn behavior(&self) -> Option<&'a LeafBehaviorHandle<W>> {
        self.tree.nodes[self.node_id.0].behavior.as_ref()
    }
}

/// An arena-backed tree of [`NodeKind`] nodes, addressed by unique string ids.
///
/// Composites own their children via [`Tree::append_child`]/[`Tree::insert_child_at`];
/// leaves reject both. The tree is append/insert-only: nodes are never removed except
/// as part of inserting a fresh subtree (see [`crate::editor`]).
pub struct Tree<W: WorldPort> {
    pub(crate) nodes: Vec<NodeData<W>>,
    ids: HashMap<String, NodeId>,
    root: NodeId,
}

impl<W: WorldPort> Tree<W> {
    pub fn new(root_id: impl Into<String>, root_kind: NodeKind) -> Result<Self, TreeError> {
        let root_id = root_id.into();
        let mut tree = Tree {
            nodes: Vec::new(),
            ids: HashMap::new(),
            root: NodeId(0),
        };
        let root = tree.push_node(root_id, root_kind, None, None)?;
        tree.root = root;
        Ok(tree)
    }

    pub fn new_leaf(
        &mut self,
        id: impl Into<String>,
        kind: LeafKind,
        behavior: LeafBehaviorHandle<W>,
    ) -> Result<NodeId, TreeError> {
        self.push_node(id.into(), NodeKind::Leaf { kind }, None, Some(behavior))
    }

    /// Allocates an unparented Sequence node, to be wired in via [`Tree::append_child`]
    /// or [`Tree::insert_child_at`].
    pub fn new_sequence(&mut self, id: impl Into<String>) -> Result<NodeId, TreeError> {
        self.push_node(id.into(), NodeKind::Sequence, None, None)
    }

    /// Allocates an unparented Fallback node, to be wired in via [`Tree::append_child`]
    /// or [`Tree::insert_child_at`].
    pub fn new_fallback(&mut self, id: impl Into<String>) -> Result<NodeId, TreeError> {
        self.push_node(id.into(), NodeKind::Fallback, None, None)
    }

    /// Allocates an unparented Parallel(k) node, to be wired in via
    /// [`Tree::append_child`] or [`Tree::insert_child_at`].
    pub fn new_parallel(&mut self, id: impl Into<String>, k: u32) -> Result<NodeId, TreeError> {
        self.push_node(id.into(), NodeKind::Parallel { k }, None, None)
    }

    fn push_node(
        &mut self,
        id: String,
        kind: NodeKind,
        parent: Option<NodeId>,
        behavior: Option<LeafBehaviorHandle<W>>,
    ) -> Result<NodeId, TreeError> {
        if self.ids.contains_key(&id) {
            return Err(TreeError::DuplicateId { id });
        }
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            id: id.clone(),
            kind,
            children: Vec::new(),
            parent,
            behavior,
        });
        self.ids.insert(id, node_id);
        Ok(node_id)
    }

    /// Allocates a new, unparented node that can be wired in via [`Tree::append_child`] or
    /// [`Tree::insert_child_at`]. Used by the editor to splice in a whole subtree.
    pub(crate) fn allocate(
        &mut self,
        id: String,
        kind: NodeKind,
        behavior: Option<LeafBehaviorHandle<W>>,
    ) -> Result<NodeId, TreeError> {
        self.push_node(id, kind, None, behavior)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let index = self.nodes[parent.0].children.len();
        self.insert_child_at(parent, index, child)
    }

    pub fn insert_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        if !self.nodes[parent.0].kind.is_composite() {
            return Err(TreeError::NotComposite {
                id: self.nodes[parent.0].id.clone(),
            });
        }
        let len = self.nodes[parent.0].children.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange {
                id: self.nodes[parent.0].id.clone(),
                index,
                len,
            });
        }
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        log::trace!(
            "tree: inserted `{}` as child #{index} of `{}`",
            self.nodes[child.0].id,
            self.nodes[parent.0].id
        );
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, node_id: NodeId) -> NodeRef<'_, W> {
        NodeRef {
            tree: self,
            node_id,
        }
    }

    /// Depth-first lookup by id. Ids are unique tree-wide, so at most one match exists;
    /// backed by a hash index rather than an actual walk, which is observationally
    /// equivalent since ids cannot collide.
    pub fn find_by_id(&self, id: &str) -> Option<NodeRef<'_, W>> {
        self.ids.get(id).map(|&node_id| self.node(node_id))
    }

    pub(crate) fn has_id(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }
}
