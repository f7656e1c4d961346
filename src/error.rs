//! Error types for every fallible boundary in the crate.

use thiserror::Error;

/// Errors raised by the tree model while constructing or mutating a [`crate::tree::Tree`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node `{id}` is not a composite and cannot own children")]
    NotComposite { id: String },

    #[error("index {index} out of range for `{id}` ({len} children)")]
    IndexOutOfRange { id: String, index: usize, len: usize },

    #[error("duplicate node id `{id}`")]
    DuplicateId { id: String },
}

/// Opaque failure surfaced by a leaf behavior's [`crate::world::WorldPort`] call.
///
/// The engine never inspects the contents of a [`WorldError`]; it only propagates it
/// out of `tick`/`find_next_action`.
#[derive(Debug, Error)]
#[error("leaf behavior failed: {0}")]
pub struct WorldError(pub String);

impl WorldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error surfaced from the engine when a leaf behavior invocation fails.
#[derive(Debug, Error)]
#[error("leaf `{node_id}` failed: {source}")]
pub struct LeafError {
    pub node_id: String,
    #[source]
    pub source: WorldError,
}

/// Errors raised by the tree editor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("node `{id}` not found")]
    NodeNotFound { id: String },

    #[error("cannot insert a sibling of the root (`{id}` has no parent)")]
    CannotInsertAtRoot { id: String },

    #[error("parent of `{id}` is not a composite")]
    NotComposite { id: String },

    #[error("duplicate node id `{id}` in inserted subtree")]
    DuplicateId { id: String },
}

