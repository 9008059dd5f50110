//! World-space transform resolution.
//!
//! Nothing is cached: every call walks the current parent chain, so physics
//! pose sync and anything else reading world matrices in the same frame see
//! the same component state.

use engine_component::Entity;
use engine_math::{Mat4, Transform};
use tracing::error;

use crate::scene::Scene;

impl Scene {
    /// Translate × rotate × scale of the entity's own [`Transform`].
    ///
    /// An entity without a transform resolves to the identity.
    #[must_use]
    pub fn local_matrix(&self, entity: Entity) -> Mat4 {
        match self.get::<Transform>(entity) {
            Some(transform) => transform.to_matrix(),
            None => {
                error!(%entity, "entity has no Transform");
                debug_assert!(false, "{entity} has no Transform");
                Mat4::IDENTITY
            }
        }
    }

    /// Compose local matrices from the root down to `entity`:
    /// `local(root) * … * local(parent) * local(entity)`.
    ///
    /// The walk stops after as many ancestors as there are live entities; a
    /// longer chain can only be a cycle and is reported as corruption.
    #[must_use]
    pub fn world_matrix(&self, entity: Entity) -> Mat4 {
        let mut matrix = self.local_matrix(entity);
        let mut current = self.parent(entity);
        let mut budget = self.entity_count();

        while current.is_valid() {
            if budget == 0 {
                error!(%entity, "parent chain does not terminate");
                debug_assert!(false, "parent chain of {entity} contains a cycle");
                break;
            }
            budget -= 1;
            matrix = self.local_matrix(current) * matrix;
            current = self.parent(current);
        }
        matrix
    }
}
