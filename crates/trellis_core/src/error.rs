//! Error types for trellis_core

use thiserror::Error;

use crate::component::ComponentId;

/// Failures reported by a [`Patcher`](crate::patch::Patcher) backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The element to mount into does not exist
    #[error("patch target not found: {0}")]
    TargetMissing(String),

    /// The backend failed to reconcile the tree
    #[error("patch backend failed: {0}")]
    Backend(String),
}

/// Errors that can occur while mutating or rendering the component tree
#[derive(Error, Debug)]
pub enum TreeError {
    /// The id does not refer to a live component
    #[error("component {0:?} does not exist")]
    UnknownComponent(ComponentId),

    /// Children were added to a component that cannot hold any
    #[error("component {0:?} cannot hold children")]
    NotAContainer(ComponentId),

    /// An index-based access fell outside the child list
    #[error("index {index} out of bounds for {len} children")]
    IndexOutOfBounds { index: isize, len: usize },

    /// The component is not a child of the container
    #[error("component {child:?} is not a child of {container:?}")]
    NotAChild {
        container: ComponentId,
        child: ComponentId,
    },

    /// Adding the child would make a container its own ancestor
    #[error("adding {child:?} to {container:?} would create a cycle")]
    Cycle {
        container: ComponentId,
        child: ComponentId,
    },

    /// The component's payload is checked out by an operation in progress
    #[error("component {0:?} is already being mutated")]
    Reentrant(ComponentId),

    /// The payload is not of the requested type
    #[error("component {id:?} is not a {expected}")]
    WrongType {
        id: ComponentId,
        expected: &'static str,
    },

    /// The component is not a registered root
    #[error("component {0:?} is not a root")]
    NotARoot(ComponentId),

    /// Patch primitive failure
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Router failure or missing router
    #[error("router error: {0}")]
    Router(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for trellis_core operations
pub type Result<T> = std::result::Result<T, TreeError>;
