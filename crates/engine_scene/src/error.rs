//! Scene error types.

use engine_component::{Entity, StoreError};

/// Errors from editing the parent/child graph.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// One side of the relationship is not live.
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// An entity cannot be its own parent.
    #[error("{0} cannot be parented to itself")]
    SelfParent(Entity),

    /// The new parent is a descendant of the child.
    #[error("parenting {child} under {parent} would create a cycle")]
    Cycle {
        /// The requested parent.
        parent: Entity,
        /// The requested child.
        child: Entity,
    },
}

/// Errors from scene-level operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Component storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Hierarchy edit failure.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}
