//! Per-agent execution state: the traversal "program counter" and the caches that
//! make a tick cheap to re-enter. One [`ExecutionState`] exists per `(tree, agent)`
//! pair and is created lazily on first tick.

use std::collections::{HashMap, HashSet};

use crate::tree::{NodeId, Status};

/// Result of one [`crate::engine::Engine::tick`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// An action leaf was invoked this tick.
    Executed,
    /// No action leaf could be found; nothing fired.
    Idle,
}

/// Identifies an agent stably across ticks. The engine keys its per-agent state map by
/// `Id`, never by pointer equality of the agent value itself.
pub trait AgentIdentity {
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Debug;

    fn agent_id(&self) -> Self::Id;
}

impl AgentIdentity for String {
    type Id = String;

    fn agent_id(&self) -> Self::Id {
        self.clone()
    }
}

impl AgentIdentity for &str {
    type Id = String;

    fn agent_id(&self) -> Self::Id {
        (*self).to_string()
    }
}

/// The traversal bookkeeping for one agent on one tree.
pub struct ExecutionState {
    pub(crate) current: NodeId,
    pub(crate) status_cache: HashMap<NodeId, Status>,
    pub(crate) open_composites: HashSet<NodeId>,
    pub(crate) last_executed_leaf: Option<NodeId>,
    pub(crate) root: NodeId,
}

impl ExecutionState {
    pub(crate) fn new(root: NodeId) -> Self {
        Self {
            current: root,
            status_cache: HashMap::new(),
            open_composites: HashSet::new(),
            last_executed_leaf: None,
            root,
        }
    }

    /// Clears all per-agent bookkeeping and rewinds to the root. Used by both
    /// `Engine::reset` and the start of a fresh run.
    pub(crate) fn reset_to_root(&mut self) {
        self.current = self.root;
        self.status_cache.clear();
        self.open_composites.clear();
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn cached_status(&self, node: NodeId) -> Option<Status> {
        self.status_cache.get(&node).copied()
    }

    pub fn last_executed_leaf(&self) -> Option<NodeId> {
        self.last_executed_leaf
    }

    pub fn is_open(&self, node: NodeId) -> bool {
        self.open_composites.contains(&node)
    }
}
