use engine_component::Entity;

use crate::backend::BodyHandle;

/// Failures reported by [`World2D`](crate::World2D).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("physics world is locked while a step is running")]
    WorldLocked,

    #[error("body {0:?} does not exist")]
    BodyNotFound(BodyHandle),
}

/// Failures of the scene ↔ physics bridge.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("physics simulation is not running")]
    NotRunning,

    #[error("physics simulation is already running")]
    AlreadyRunning,

    #[error("{entity} has no {component}")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("{0} has no backend body yet")]
    BodyNotCreated(Entity),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
