//! The leaf behavior registry: the opaque, per-leaf runtime object bound to an Action
//! or Condition node. The engine only ever calls `tick`/`log_name`/`log_args` on it,
//! and must never downcast it to a concrete behavior type.

use crate::error::WorldError;
use crate::tree::Status;
use crate::world::WorldPort;

/// Capability set a leaf behavior exposes to the engine. `tick` is the only method
/// that may touch the world; `log_name`/`log_args` feed the event log and must not
/// have side effects.
pub trait LeafBehavior<W: WorldPort>: Send {
    fn tick(&mut self, world: &mut W, agent: &W::AgentId) -> Result<Status, WorldError>;

    /// Defaults to the behavior's type name with its first character lowercased.
    /// Override to give a leaf a domain-specific name (e.g. `"move"`).
    fn log_name(&self) -> String {
        default_log_name::<Self>()
    }

    /// Appended verbatim with a single leading space when non-empty.
    fn log_args(&self) -> Option<String> {
        None
    }
}

/// Derives the default `log_name` from a concrete type's `std::any::type_name`,
/// stripping module qualification and lowercasing the first character.
pub fn default_log_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let short = full.rsplit("::").next().unwrap_or(full);
    let mut chars = short.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// A boxed, type-erased leaf behavior bound to one node.
pub struct LeafBehaviorHandle<W: WorldPort>(Box<dyn LeafBehavior<W>>);

impl<W: WorldPort> LeafBehaviorHandle<W> {
    pub fn new(behavior: impl LeafBehavior<W> + 'static) -> Self {
        Self(Box::new(behavior))
    }

    pub fn tick(&mut self, world: &mut W, agent: &W::AgentId) -> Result<Status, WorldError> {
        self.0.tick(world, agent)
    }

    pub fn log_name(&self) -> String {
        self.0.log_name()
    }

    pub fn log_args(&self) -> Option<String> {
        self.0.log_args()
    }
}

macro_rules! motion_action {
    ($name:ident, $call:ident, $log:literal) => {
        #[doc = concat!("Action leaf delegating to `WorldPort::", stringify!($call), "`.")]
        pub struct $name;

        impl<W: WorldPort> LeafBehavior<W> for $name {
            fn tick(&mut self, world: &mut W, agent: &W::AgentId) -> Result<Status, WorldError> {
                world.$call(agent)
            }

            fn log_name(&self) -> String {
                $log.to_string()
            }
        }
    };
}

macro_rules! world_condition {
    ($name:ident, $call:ident, $log:literal) => {
        #[doc = concat!("Condition leaf delegating to `WorldPort::", stringify!($call), "`.")]
        pub struct $name;

        impl<W: WorldPort> LeafBehavior<W> for $name {
            fn tick(&mut self, world: &mut W, agent: &W::AgentId) -> Result<Status, WorldError> {
                world.$call(agent)
            }

            fn log_name(&self) -> String {
                $log.to_string()
            }
        }
    };
}

motion_action!(MoveForward, move_forward, "move");
motion_action!(TurnLeft, turn_left, "turnLeft");
motion_action!(TurnRight, turn_right, "turnRight");
motion_action!(PlaceLeaf, place_leaf, "placeLeaf");
motion_action!(TakeLeaf, take_leaf, "takeLeaf");

/// Action leaf delegating to `WorldPort::fly_to`, logging its destination as args.
pub struct FlyTo {
    pub x: i32,
    pub y: i32,
}

impl FlyTo {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl<W: WorldPort> LeafBehavior<W> for FlyTo {
    fn tick(&mut self, world: &mut W, agent: &W::AgentId) -> Result<Status, WorldError> {
        world.fly_to(agent, self.x, self.y)
    }

    fn log_name(&self) -> String {
        "fly".to_string()
    }

    fn log_args(&self) -> Option<String> {
        Some(format!("{},{}", self.x, self.y))
    }
}

world_condition!(TreeFront, tree_front, "treeFront");
world_condition!(LeafFront, leaf_front, "leafFront");
world_condition!(MushroomFront, mushroom_front, "mushroomFront");
world_condition!(AtEdge, at_edge, "atEdge");

/// Condition leaf delegating to `WorldPort::exists_path`, with either a one- or
/// two-point form (`existsPath x,y` / `existsPath x1,y1 x2,y2`).
pub enum ExistsPath {
    FromAgent { to: (i32, i32) },
    BetweenPoints { from: (i32, i32), to: (i32, i32) },
}

impl ExistsPath {
    pub fn to(x: i32, y: i32) -> Self {
        ExistsPath::FromAgent { to: (x, y) }
    }

    pub fn between(from: (i32, i32), to: (i32, i32)) -> Self {
        ExistsPath::BetweenPoints { from, to }
    }
}

impl<W: WorldPort> LeafBehavior<W> for ExistsPath {
    fn tick(&mut self, world: &mut W, agent: &W::AgentId) -> Result<Status, WorldError> {
        match *self {
            ExistsPath::FromAgent { to } => world.exists_path_to(agent, to),
            ExistsPath::BetweenPoints { from, to } => {
                world.exists_path_between(agent, from, to)
            }
        }
    }

    fn log_name(&self) -> String {
        "existsPath".to_string()
    }

    fn log_args(&self) -> Option<String> {
        match *self {
            ExistsPath::FromAgent { to: (x, y) } => Some(format!("{x},{y}")),
            ExistsPath::BetweenPoints {
                from: (x1, y1),
                to: (x2, y2),
            } => Some(format!("{x1},{y1} {x2},{y2}")),
        }
    }
}

/// Scripted doubles used by the engine's own test suite (not part of the public API).
pub mod test_support {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ScriptedStatus {
        Success,
        Failure,
    }

    impl From<ScriptedStatus> for Status {
        fn from(value: ScriptedStatus) -> Self {
            match value {
                ScriptedStatus::Success => Status::Success,
                ScriptedStatus::Failure => Status::Failure,
            }
        }
    }

    /// A leaf whose result and name are fixed at construction time; used for both
    /// Action and Condition roles in tests (the tree node's `LeafKind` decides which).
    pub struct ScriptedCondition {
        name: String,
        result: ScriptedStatus,
    }

    impl ScriptedCondition {
        pub fn new(name: impl Into<String>, result: ScriptedStatus) -> Self {
            Self {
                name: name.into(),
                result,
            }
        }
    }

    impl<W: WorldPort> LeafBehavior<W> for ScriptedCondition {
        fn tick(&mut self, _world: &mut W, _agent: &W::AgentId) -> Result<Status, WorldError> {
            Ok(self.result.into())
        }

        fn log_name(&self) -> String {
            self.name.clone()
        }
    }

    /// A leaf that calls back into a `RecordingWorld`-shaped mutator and fails if told
    /// to, used to exercise the `LeafError` propagation path.
    pub struct FailingAction {
        pub name: String,
    }

    impl FailingAction {
        pub fn new(name: impl Into<String>) -> Self {
            Self { name: name.into() }
        }
    }

    impl<W: WorldPort> LeafBehavior<W> for FailingAction {
        fn tick(&mut self, _world: &mut W, _agent: &W::AgentId) -> Result<Status, WorldError> {
            Err(WorldError::new(format!("{} exploded", self.name)))
        }

        fn log_name(&self) -> String {
            self.name.clone()
        }
    }

    /// A `WorldPort` double for tests: every query/mutation returns a value scripted in
    /// advance per agent, and every call is recorded for assertions.
    #[derive(Default)]
    pub struct RecordingWorld {
        pub calls: Vec<String>,
        scripted: HashMap<String, Status>,
    }

    impl RecordingWorld {
        pub fn new() -> Self {
            Self::default()
        }

        /// Scripts the result of a future query, keyed the same way the query methods
        /// below format their lookups (e.g. `"agent:treeFront"`, `"agent:atEdge"`).
        pub fn script(&mut self, key: impl Into<String>, status: Status) {
            self.scripted.insert(key.into(), status);
        }
    }

    impl WorldPort for RecordingWorld {
        type AgentId = String;

        fn move_forward(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            self.calls.push(format!("{agent}:move"));
            Ok(Status::Success)
        }
        fn turn_left(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            self.calls.push(format!("{agent}:turnLeft"));
            Ok(Status::Success)
        }
        fn turn_right(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            self.calls.push(format!("{agent}:turnRight"));
            Ok(Status::Success)
        }
        fn place_leaf(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            self.calls.push(format!("{agent}:placeLeaf"));
            Ok(Status::Success)
        }
        fn take_leaf(&mut self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            self.calls.push(format!("{agent}:takeLeaf"));
            Ok(Status::Success)
        }
        fn fly_to(&mut self, agent: &Self::AgentId, x: i32, y: i32) -> Result<Status, WorldError> {
            self.calls.push(format!("{agent}:fly({x},{y})"));
            Ok(Status::Success)
        }
        fn tree_front(&self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            Ok(*self
                .scripted
                .get(&format!("{agent}:treeFront"))
                .unwrap_or(&Status::Failure))
        }
        fn leaf_front(&self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            Ok(*self
                .scripted
                .get(&format!("{agent}:leafFront"))
                .unwrap_or(&Status::Failure))
        }
        fn mushroom_front(&self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            Ok(*self
                .scripted
                .get(&format!("{agent}:mushroomFront"))
                .unwrap_or(&Status::Failure))
        }
        fn at_edge(&self, agent: &Self::AgentId) -> Result<Status, WorldError> {
            Ok(*self
                .scripted
                .get(&format!("{agent}:atEdge"))
                .unwrap_or(&Status::Failure))
        }
        fn exists_path_to(&self, agent: &Self::AgentId, to: (i32, i32)) -> Result<Status, WorldError> {
            Ok(*self
                .scripted
                .get(&format!("{agent}:existsPath({},{})", to.0, to.1))
                .unwrap_or(&Status::Failure))
        }
        fn exists_path_between(
            &self,
            agent: &Self::AgentId,
            from: (i32, i32),
            to: (i32, i32),
        ) -> Result<Status, WorldError> {
            Ok(*self
                .scripted
                .get(&format!(
                    "{agent}:existsPath({},{} {},{})",
                    from.0, from.1, to.0, to.1
                ))
                .unwrap_or(&Status::Failure))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_name_lowercases_first_char() {
        struct MoveForward;
        assert_eq!(default_log_name::<MoveForward>(), "moveForward");
    }
}
