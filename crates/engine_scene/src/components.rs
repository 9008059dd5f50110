//! Components every scene understands.

use engine_component::{Component, Entity};
use serde::{Deserialize, Serialize};

/// Display name of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagComponent {
    /// The entity's name.
    pub tag: String,
}

impl TagComponent {
    /// Create a new tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Component for TagComponent {
    fn type_name() -> &'static str {
        "Tag"
    }
}

/// Position of an entity in the scene graph.
///
/// `parent`, `first_child`, `next_child` and `prev_child` are
/// [`Entity::INVALID`] when absent. The children of an entity form a doubly
/// linked list starting at `first_child` whose length is `children_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipComponent {
    /// Number of direct children.
    pub children_count: u64,
    /// Head of this entity's child list.
    pub first_child: Entity,
    /// Next sibling under the same parent.
    pub next_child: Entity,
    /// Previous sibling under the same parent.
    pub prev_child: Entity,
    /// Parent entity, or [`Entity::INVALID`] for a root.
    pub parent: Entity,
}

impl RelationshipComponent {
    /// Returns `true` if this entity has at least one child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.children_count > 0
    }

    /// Returns `true` if this entity has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        !self.parent.is_valid()
    }
}

impl Default for RelationshipComponent {
    fn default() -> Self {
        Self {
            children_count: 0,
            first_child: Entity::INVALID,
            next_child: Entity::INVALID,
            prev_child: Entity::INVALID,
            parent: Entity::INVALID,
        }
    }
}

impl Component for RelationshipComponent {
    fn type_name() -> &'static str {
        "Relationship"
    }
}

/// Marks an entity as having a script instance that receives callbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptComponent {
    /// Script class bound to this entity.
    pub class_name: String,
}

impl ScriptComponent {
    /// Bind a script class.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

impl Component for ScriptComponent {
    fn type_name() -> &'static str {
        "Script"
    }
}
