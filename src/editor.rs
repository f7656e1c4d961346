//! The tree editor: splices a freshly-built subtree into an existing [`Tree`] as a
//! sibling of a named node. Structural only: it never touches per-agent execution
//! state, so any agent mid-run simply sees the new sibling the next time its current
//! composite iterates that far.

use crate::error::EditorError;
use crate::tree::{NodeId, NodeKind, Tree};
use crate::world::WorldPort;

/// A subtree to be spliced in, described bottom-up so children exist before their
/// parent is built. Construct with [`SubtreeBuilder`].
pub struct Subtree<W: WorldPort> {
    pub(crate) root: NodeId,
    pub(crate) ids: Vec<String>,
    _marker: std::marker::PhantomData<W>,
}

/// Inserts `subtree` as a sibling immediately to the right of `target_id` in the tree.
///
/// Fails without mutating the tree if: `target_id` doesn't exist, `target_id` is the
/// tree's root (which has no parent to insert a sibling under), the target's parent
/// isn't a composite, or any id in `subtree` collides with an existing id.
pub fn insert_sibling_right_of<W: WorldPort>(
    tree: &mut Tree<W>,
    target_id: &str,
    subtree: Subtree<W>,
) -> Result<(), EditorError> {
    let target_ref = tree
        .find_by_id(target_id)
        .ok_or_else(|| EditorError::NodeNotFound {
            id: target_id.to_string(),
        })?;
    let parent = target_ref.parent().ok_or_else(|| EditorError::CannotInsertAtRoot {
        id: target_id.to_string(),
    })?;
    let target = target_ref.node_id();

    let parent_ref = tree.node(parent);
    if !parent_ref.kind().is_composite() {
        return Err(EditorError::NotComposite {
            id: parent_ref.id().to_string(),
        });
    }

    // Ids within `subtree` were already validated as fresh when each node was
    // allocated via `SubtreeBuilder` (against this same tree), so nothing further to
    // check here.
    let index = tree
        .node(parent)
        .children()
        .iter()
        .position(|&c| c == target)
        .expect("target is a child of its own parent");

    tree.insert_child_at(parent, index + 1, subtree.root)
        .expect("validated above: parent is a composite and index is in range");
    log::debug!(
        "editor: inserted subtree rooted at `{}` right of `{target_id}`",
        tree.node(subtree.root).id()
    );
    Ok(())
}

/// Builds a [`Subtree`] bottom-up: leaves and composites are allocated as they're
/// added, and [`SubtreeBuilder::finish`] wires them together and validates id
/// uniqueness before the tree it targets is ever mutated.
pub struct SubtreeBuilder<'a, W: WorldPort> {
    tree: &'a mut Tree<W>,
    ids: Vec<String>,
}

impl<'a, W: WorldPort> SubtreeBuilder<'a, W> {
    pub fn new(tree: &'a mut Tree<W>) -> Self {
        Self { tree, ids: Vec::new() }
    }

    /// Allocates a composite node with the given children (already-built subtrees or
    /// leaves), returning its id for use as a child of a further composite.
    pub fn composite(
        &mut self,
        id: impl Into<String>,
        kind: NodeKind,
        children: Vec<NodeId>,
    ) -> Result<NodeId, EditorError> {
        let id = id.into();
        self.check_fresh(&id)?;
        let node = self
            .tree
            .allocate(id.clone(), kind, None)
            .map_err(|_| EditorError::DuplicateId { id: id.clone() })?;
        for child in children {
            self.tree
                .append_child(node, child)
                .expect("freshly allocated composite accepts children");
        }
        self.ids.push(id);
        Ok(node)
    }

    pub fn leaf(
        &mut self,
        id: impl Into<String>,
        kind: crate::tree::LeafKind,
        behavior: crate::behavior::LeafBehaviorHandle<W>,
    ) -> Result<NodeId, EditorError> {
        let id = id.into();
        self.check_fresh(&id)?;
        let node = self
            .tree
            .allocate(id.clone(), NodeKind::Leaf { kind }, Some(behavior))
            .map_err(|_| EditorError::DuplicateId { id: id.clone() })?;
        self.ids.push(id);
        Ok(node)
    }

    fn check_fresh(&self, id: &str) -> Result<(), EditorError> {
        if self.tree.has_id(id) || self.ids.iter().any(|seen| seen == id) {
            return Err(EditorError::DuplicateId { id: id.to_string() });
        }
        Ok(())
    }

    pub fn finish(self, root: NodeId) -> Subtree<W> {
        Subtree {
            root,
            ids: self.ids,
            _marker: std::marker::PhantomData,
        }
    }
}
