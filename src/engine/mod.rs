//! The traversal engine: the one component allowed to invoke an Action leaf, and the
//! sole owner of the per-agent [`ExecutionState`] it advances one action at a time.
//!
//! Everything that decides *what* to do next lives in [`traversal`]; this module is
//! the public surface (`tick`, `find_next_action`, `jump_to`, `reset`) plus the
//! per-agent state map and the injected event-log sink.

mod traversal;

use std::collections::HashMap;

use crate::error::LeafError;
use crate::state::{AgentIdentity, ExecutionState, Progress};
use crate::tree::{LeafKind, NodeId, NodeKind, Tree};
use crate::world::WorldPort;

/// A leaf node identified by id and kind, returned by [`Engine::find_next_action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRef {
    pub id: String,
    pub kind: LeafKind,
}

/// Drives one behavior tree for any number of agents. Built once per tree; per-agent
/// [`ExecutionState`] is created lazily on first use.
pub struct Engine<W: WorldPort> {
    tree: Tree<W>,
    log_sink: Box<dyn FnMut(String) + Send>,
    states: HashMap<W::AgentId, ExecutionState>,
}

impl<W: WorldPort> Engine<W> {
    /// `log_sink` receives every ENTRY/leaf-result/EXIT line verbatim, in emission
    /// order, across every agent this engine drives.
    pub fn new(tree: Tree<W>, log_sink: impl FnMut(String) + Send + 'static) -> Self {
        Self {
            tree,
            log_sink: Box::new(log_sink),
            states: HashMap::new(),
        }
    }

    pub fn tree(&self) -> &Tree<W> {
        &self.tree
    }

    fn ensure_state(&mut self, key: &W::AgentId) {
        if !self.states.contains_key(key) {
            self.states
                .insert(key.clone(), ExecutionState::new(self.tree.root()));
        }
    }

    /// The current [`ExecutionState`] for `agent`, creating it (parked at the root,
    /// with empty caches) on first access.
    pub fn state_of<A: AgentIdentity<Id = W::AgentId>>(&mut self, agent: &A) -> &ExecutionState {
        let key = agent.agent_id();
        self.ensure_state(&key);
        self.states.get(&key).expect("just inserted")
    }

    /// Advances `agent` by at most one Action leaf invocation.
    ///
    /// A tick traverses starting at the agent's `current` node (the root, unless a
    /// prior [`Engine::jump_to`] moved it), invoking Condition leaves and deciding
    /// composites along the way, until it finds an uncached Action leaf or determines
    /// nothing can fire. If an action was found, it is invoked exactly once, the agent
    /// is rewound to the root, and a second pass from the root flushes whatever
    /// ancestor composites that invocation just finished deciding. If the tree's root
    /// is already decided when `tick` is called, a new run begins first.
    pub fn tick<A: AgentIdentity<Id = W::AgentId>>(
        &mut self,
        world: &mut W,
        agent: &A,
    ) -> Result<Progress, LeafError> {
        let key = agent.agent_id();
        self.ensure_state(&key);
        let root = self.tree.root();
        let log = &mut *self.log_sink;
        {
            let exec = self.states.get_mut(&key).expect("just inserted");
            if traversal::fire_if_possible(&mut self.tree, exec, log, world, &key)? {
                return Ok(Progress::Executed);
            }
        }
        let exec = self.states.get_mut(&key).expect("just inserted");
        if exec.cached_status(root).is_none() {
            return Ok(Progress::Idle);
        }
        log::trace!("engine: run complete for agent {key}, starting a new run");
        exec.reset_to_root();
        if traversal::fire_if_possible(&mut self.tree, exec, log, world, &key)? {
            Ok(Progress::Executed)
        } else {
            Ok(Progress::Idle)
        }
    }

    /// A non-mutating look-ahead at the leaf the *next* [`Engine::tick`] would invoke,
    /// without invoking it, caching anything, or emitting events.
    ///
    /// Exception: if the most recently executed leaf was an Action that is the last
    /// child of its parent composite, that leaf is returned as-is rather than the
    /// successor a fresh run would produce.
    pub fn find_next_action<A: AgentIdentity<Id = W::AgentId>>(
        &mut self,
        world: &mut W,
        agent: &A,
    ) -> Result<Option<LeafRef>, LeafError> {
        let key = agent.agent_id();
        self.ensure_state(&key);
        let root = self.tree.root();

        if let Some(last) = self.states.get(&key).expect("just inserted").last_executed_leaf() {
            let node_ref = self.tree.node(last);
            if matches!(
                node_ref.kind(),
                NodeKind::Leaf {
                    kind: LeafKind::Action
                }
            ) {
                if let Some(parent) = node_ref.parent() {
                    let parent_ref = self.tree.node(parent);
                    if parent_ref.children().last() == Some(&last) {
                        return Ok(Some(self.leaf_ref(last)));
                    }
                }
            }
        }

        let exec = self.states.get_mut(&key).expect("just inserted");
        let simulate_fresh = exec.cached_status(root).is_some();
        let start = if simulate_fresh { root } else { exec.current() };
        let mut no_op = |_: String| {};
        let result = traversal::search(
            &mut self.tree,
            exec,
            &mut no_op,
            world,
            &key,
            start,
            true,
            simulate_fresh,
        )?;
        Ok(result.action.map(|n| self.leaf_ref(n)))
    }

    /// Forces `agent`'s current node to `node_id`, clearing its run state. Siblings of
    /// the target that precede it under its parent are marked decided so the next tick
    /// doesn't re-examine them: `Success` if the parent is a Sequence, `Failure`
    /// otherwise. Returns `false` if `node_id` is unknown.
    pub fn jump_to<A: AgentIdentity<Id = W::AgentId>>(&mut self, agent: &A, node_id: &str) -> bool {
        let Some(target_ref) = self.tree.find_by_id(node_id) else {
            return false;
        };
        let target = target_ref.node_id();
        let parent = target_ref.parent();
        let key = agent.agent_id();
        self.ensure_state(&key);
        let exec = self.states.get_mut(&key).expect("just inserted");
        exec.status_cache.clear();
        exec.open_composites.clear();
        if let Some(parent) = parent {
            let parent_ref = self.tree.node(parent);
            let fill_status = match parent_ref.kind() {
                NodeKind::Sequence => crate::tree::Status::Success,
                _ => crate::tree::Status::Failure,
            };
            let siblings = parent_ref.children();
            if let Some(index) = siblings.iter().position(|&id| id == target) {
                for &sibling in &siblings[..index] {
                    exec.status_cache.insert(sibling, fill_status);
                }
            }
        }
        exec.current = target;
        log::debug!("engine: agent {key} jumped to `{node_id}`");
        true
    }

    /// Ends the agent's current run and rewinds it to the root with empty caches.
    /// Idempotent: calling it twice in a row is the same as calling it once.
    pub fn reset<A: AgentIdentity<Id = W::AgentId>>(&mut self, agent: &A) {
        let key = agent.agent_id();
        let root = self.tree.root();
        self.states.insert(key, ExecutionState::new(root));
    }

    fn leaf_ref(&self, node: NodeId) -> LeafRef {
        let node_ref = self.tree.node(node);
        let kind = match node_ref.kind() {
            NodeKind::Leaf { kind } => kind,
            _ => unreachable!("leaf_ref called on a non-leaf node"),
        };
        LeafRef {
            id: node_ref.id().to_string(),
            kind,
        }
    }
}
