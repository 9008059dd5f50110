//! Entity identifiers.
//!
//! An [`Entity`] is a bare `u64`. The same number travels as physics body
//! user-data and comes back through contact callbacks, so it has to stay
//! stable for as long as the entity lives.

use serde::{Deserialize, Serialize};

/// Identifier of an entity in a scene. Carries no data itself.
///
/// `0` is reserved for [`Entity::INVALID`] and never names a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// Stands for "no entity": no parent, no sibling, no child.
    pub const INVALID: Entity = Entity(0);

    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// `false` only for [`Entity::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Hands out increasing entity IDs, starting at 1.
///
/// IDs are never recycled. [`EntityAllocator::reserve`] moves the counter past
/// an ID claimed from outside, so later allocations cannot collide with it.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id += 1;
        entity
    }

    /// Mark `entity` as taken.
    pub fn reserve(&mut self, entity: Entity) {
        self.next_id = self.next_id.max(entity.0.saturating_add(1));
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
