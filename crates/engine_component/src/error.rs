//! Entity store error types.

use crate::entity::Entity;

/// Errors returned by [`EntityStore`](crate::EntityStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The entity is not live in this store.
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// An explicit ID was requested but it is already live.
    #[error("{0} is already live")]
    EntityExists(Entity),

    /// The [`Entity::INVALID`] sentinel was used where a real entity is required.
    #[error("{0} is not a valid entity id")]
    InvalidEntity(Entity),

    /// A component could not be encoded to MessagePack.
    #[error("failed to encode component '{name}': {source}")]
    Encode {
        /// The component's type name.
        name: &'static str,
        /// The underlying encoder error.
        #[source]
        source: rmp_serde::encode::Error,
    },
}
