//! A tick-driven behavior tree execution engine for grid-walking agents.
//!
//! An agent's behavior is authored once as a [`tree::Tree`] of Sequence, Fallback and
//! Parallel(k) composites rooted at Action/Condition leaves. The engine advances each
//! agent's own [`state::ExecutionState`] by at most one Action invocation per
//! [`engine::Engine::tick`], leaning on a per-run cache so repeated ticks are cheap.
//! Leaves are bound to a caller-supplied [`world::WorldPort`] through the opaque
//! [`behavior::LeafBehavior`] registry; the engine never sees the world directly.
//! [`editor`] lets a tree be extended in place between runs.

pub mod behavior;
pub mod editor;
pub mod engine;
pub mod error;
pub mod state;
pub mod tree;
pub mod world;

pub mod prelude {
    pub use crate::behavior::{
        AtEdge, ExistsPath, FlyTo, LeafBehavior, LeafBehaviorHandle, LeafFront, MoveForward,
        MushroomFront, PlaceLeaf, TakeLeaf, TreeFront, TurnLeft, TurnRight,
    };
    pub use crate::editor::{insert_sibling_right_of, Subtree, SubtreeBuilder};
    pub use crate::engine::{Engine, LeafRef};
    pub use crate::error::{EditorError, LeafError, TreeError, WorldError};
    pub use crate::state::{AgentIdentity, ExecutionState, Progress};
    pub use crate::tree::{LeafKind, NodeId, NodeKind, Status, Tree};
    pub use crate::world::WorldPort;
}
