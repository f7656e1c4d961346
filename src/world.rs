//! The world port: the narrow interface leaf behaviors use to observe and mutate the
//! world. The engine never calls these methods itself, only leaf behaviors do, through
//! [`WorldPort`]. The engine treats the world as wholly opaque.

use crate::error::WorldError;
use crate::tree::Status;

/// Capability contract a concrete world (grid, cells, pathfinding, all out of scope for
/// this crate) must implement so that leaf behaviors can observe/mutate it.
///
/// Every method returns `Status` for an ordinary outcome or `WorldError` for a
/// leaf-level fault; `Failure` is not an error.
pub trait WorldPort {
    /// Identity of the agent a leaf is being ticked for. Must be stable across ticks
    /// and hashable/comparable so the engine can key per-agent state by it, and
    /// displayable so the event log can print it as `<agentId>`.
    type AgentId: Clone + Eq + std::hash::Hash + std::fmt::Debug + std::fmt::Display;

    fn move_forward(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn turn_left(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn turn_right(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn place_leaf(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn take_leaf(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn fly_to(&mut self, agent: &Self::AgentId, x: i32, y: i32) -> Result<Status, WorldError>;

    fn tree_front(&self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn leaf_front(&self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn mushroom_front(&self, agent: &Self::AgentId) -> Result<Status, WorldError>;
    fn at_edge(&self, agent: &Self::AgentId) -> Result<Status, WorldError>;

    /// `existsPath x,y`: whether a path exists from the agent's current position to
    /// `(x, y)`.
    fn exists_path_to(&self, agent: &Self::AgentId, to: (i32, i32)) -> Result<Status, WorldError>;

    /// `existsPath x1,y1 x2,y2`: whether a path exists between two arbitrary points,
    /// independent of the agent's current position.
    fn exists_path_between(
        &self,
        agent: &Self::AgentId,
        from: (i32, i32),
        to: (i32, i32),
    ) -> Result<Status, WorldError>;
}
