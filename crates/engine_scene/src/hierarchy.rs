//! Parent/child relationships.
//!
//! Children of an entity are threaded through their own
//! [`RelationshipComponent`]s as a doubly linked list: the parent stores the
//! head (`first_child`) and the count, each child stores its `prev_child` and
//! `next_child` siblings. Appending walks the list, detaching is O(1) once
//! the child is known to belong to the parent.

use engine_component::{Entity, EntityStore};
use tracing::{error, warn};

use crate::components::RelationshipComponent;
use crate::error::HierarchyError;
use crate::scene::Scene;

/// Ordered iterator over the direct children of an entity.
///
/// Follows `first_child → next_child` for exactly `children_count` steps, so
/// it always terminates. Obtain a fresh one from [`Scene::children`] to
/// restart.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    store: &'a EntityStore,
    next: Entity,
    remaining: u64,
}

impl Iterator for Children<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        if !current.is_valid() {
            debug_assert!(false, "sibling list is shorter than its children count");
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        self.next = self
            .store
            .get::<RelationshipComponent>(current)
            .map_or(Entity::INVALID, |rel| rel.next_child);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, usize::try_from(self.remaining).ok())
    }
}

impl Scene {
    /// Iterate over the direct children of `entity`, in insertion order.
    #[must_use]
    pub fn children(&self, entity: Entity) -> Children<'_> {
        let (next, remaining) = self
            .get::<RelationshipComponent>(entity)
            .map_or((Entity::INVALID, 0), |rel| (rel.first_child, rel.children_count));
        Children {
            store: self.store(),
            next,
            remaining,
        }
    }

    /// The parent of `entity`, or [`Entity::INVALID`] for roots and unknown
    /// entities.
    #[must_use]
    pub fn parent(&self, entity: Entity) -> Entity {
        self.get::<RelationshipComponent>(entity)
            .map_or(Entity::INVALID, |rel| rel.parent)
    }

    /// Returns `true` if `ancestor` appears on the parent chain of `entity`.
    ///
    /// The walk is bounded by the number of live entities.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = self.parent(entity);
        let mut budget = self.entity_count();
        while current.is_valid() && budget > 0 {
            if current == ancestor {
                return true;
            }
            current = self.parent(current);
            budget -= 1;
        }
        false
    }

    /// Make `child` the last child of `parent`, detaching it from any
    /// previous parent first.
    ///
    /// # Errors
    ///
    /// Fails without modifying the graph if either entity is not live, if
    /// `parent == child`, or if `child` is an ancestor of `parent`.
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), HierarchyError> {
        for entity in [parent, child] {
            if !self.exists(entity) {
                return Err(HierarchyError::EntityNotFound(entity));
            }
        }
        if parent == child {
            return Err(HierarchyError::SelfParent(child));
        }
        if self.is_ancestor(child, parent) {
            warn!(%parent, %child, "rejected parenting that would create a cycle");
            return Err(HierarchyError::Cycle { parent, child });
        }

        self.ensure_relationship(parent);
        self.ensure_relationship(child);

        let old_parent = self.parent(child);
        if old_parent.is_valid() {
            self.remove_child(old_parent, child);
        }

        let last = self.children(parent).last().unwrap_or(Entity::INVALID);
        let head = if last.is_valid() { last } else { parent };
        if let Some(rel) = self.relationship_mut(head) {
            if last.is_valid() {
                rel.next_child = child;
            } else {
                rel.first_child = child;
            }
        }

        if let Some(rel) = self.relationship_mut(child) {
            rel.parent = parent;
            rel.prev_child = last;
            rel.next_child = Entity::INVALID;
        }
        if let Some(rel) = self.relationship_mut(parent) {
            rel.children_count += 1;
        }
        Ok(())
    }

    /// Unlink `child` from `parent`'s child list and clear its parent and
    /// sibling links.
    ///
    /// Returns `false` if `child` is not one of `parent`'s children.
    pub fn remove_child(&mut self, parent: Entity, child: Entity) -> bool {
        if !self.children(parent).any(|c| c == child) {
            return false;
        }

        let Some(rel) = self.relationship_mut(child) else {
            return false;
        };
        let (prev, next) = (rel.prev_child, rel.next_child);
        rel.parent = Entity::INVALID;
        rel.prev_child = Entity::INVALID;
        rel.next_child = Entity::INVALID;

        if prev.is_valid() {
            if let Some(rel) = self.relationship_mut(prev) {
                rel.next_child = next;
            }
        } else if let Some(rel) = self.relationship_mut(parent) {
            rel.first_child = next;
        }
        if next.is_valid()
            && let Some(rel) = self.relationship_mut(next)
        {
            rel.prev_child = prev;
        }

        if let Some(rel) = self.relationship_mut(parent) {
            rel.children_count -= 1;
            if rel.children_count == 0 {
                rel.first_child = Entity::INVALID;
            }
        }
        true
    }

    fn ensure_relationship(&mut self, entity: Entity) {
        if !self.has::<RelationshipComponent>(entity) {
            let _ = self.store_mut().insert(entity, RelationshipComponent::default());
        }
    }

    /// Relationship of an entity that is known to be part of the graph.
    ///
    /// `None` means a link points at an entity without a relationship, i.e.
    /// the graph is corrupt.
    fn relationship_mut(&mut self, entity: Entity) -> Option<&mut RelationshipComponent> {
        if !self.has::<RelationshipComponent>(entity) {
            error!(%entity, "hierarchy link points at an entity without a relationship");
            debug_assert!(false, "{entity} is linked into the hierarchy but has no relationship");
            return None;
        }
        self.store_mut().get_mut::<RelationshipComponent>(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with(names: &[&str]) -> (Scene, Vec<Entity>) {
        let mut scene = Scene::new("hierarchy");
        let entities = names.iter().map(|name| scene.create_entity(name)).collect();
        (scene, entities)
    }

    fn rel(scene: &Scene, e: Entity) -> RelationshipComponent {
        *scene.get::<RelationshipComponent>(e).unwrap()
    }

    #[test]
    fn test_add_child_appends_in_order() {
        let (mut scene, e) = scene_with(&["p", "a", "b", "c"]);
        for &child in &e[1..] {
            scene.add_child(e[0], child).unwrap();
        }

        assert_eq!(scene.children(e[0]).collect::<Vec<_>>(), vec![e[1], e[2], e[3]]);
        assert_eq!(rel(&scene, e[0]).children_count, 3);
        assert_eq!(rel(&scene, e[0]).first_child, e[1]);
        assert_eq!(rel(&scene, e[2]).prev_child, e[1]);
        assert_eq!(rel(&scene, e[2]).next_child, e[3]);
        for &child in &e[1..] {
            assert_eq!(scene.parent(child), e[0]);
        }
    }

    #[test]
    fn test_children_is_restartable() {
        let (mut scene, e) = scene_with(&["p", "a", "b"]);
        scene.add_child(e[0], e[1]).unwrap();
        scene.add_child(e[0], e[2]).unwrap();

        let first: Vec<_> = scene.children(e[0]).collect();
        let second: Vec<_> = scene.children(e[0]).collect();
        assert_eq!(first, second);
        assert_eq!(scene.children(e[1]).count(), 0);
    }

    #[test]
    fn test_add_then_remove_restores_state() {
        let (mut scene, e) = scene_with(&["p", "a", "b"]);
        scene.add_child(e[0], e[1]).unwrap();
        let before = rel(&scene, e[0]).children_count;

        scene.add_child(e[0], e[2]).unwrap();
        assert!(scene.remove_child(e[0], e[2]));

        assert_eq!(rel(&scene, e[0]).children_count, before);
        assert_eq!(rel(&scene, e[1]).next_child, Entity::INVALID);
        assert_eq!(rel(&scene, e[1]).prev_child, Entity::INVALID);
        let removed = rel(&scene, e[2]);
        assert_eq!(removed.parent, Entity::INVALID);
        assert_eq!(removed.next_child, Entity::INVALID);
        assert_eq!(removed.prev_child, Entity::INVALID);
    }

    #[test]
    fn test_remove_first_middle_last() {
        let (mut scene, e) = scene_with(&["p", "a", "b", "c", "d"]);
        for &child in &e[1..] {
            scene.add_child(e[0], child).unwrap();
        }

        // Middle.
        assert!(scene.remove_child(e[0], e[2]));
        assert_eq!(scene.children(e[0]).collect::<Vec<_>>(), vec![e[1], e[3], e[4]]);
        assert_eq!(rel(&scene, e[3]).prev_child, e[1]);

        // First.
        assert!(scene.remove_child(e[0], e[1]));
        assert_eq!(rel(&scene, e[0]).first_child, e[3]);
        assert_eq!(rel(&scene, e[3]).prev_child, Entity::INVALID);

        // Last.
        assert!(scene.remove_child(e[0], e[4]));
        assert_eq!(rel(&scene, e[3]).next_child, Entity::INVALID);

        assert!(scene.remove_child(e[0], e[3]));
        assert_eq!(rel(&scene, e[0]).children_count, 0);
        assert_eq!(rel(&scene, e[0]).first_child, Entity::INVALID);
    }

    #[test]
    fn test_remove_non_child_returns_false() {
        let (mut scene, e) = scene_with(&["p", "q", "a"]);
        scene.add_child(e[0], e[2]).unwrap();
        assert!(!scene.remove_child(e[1], e[2]));
        assert_eq!(scene.parent(e[2]), e[0]);
    }

    #[test]
    fn test_reparent_detaches_from_old_parent() {
        let (mut scene, e) = scene_with(&["p", "q", "a", "b"]);
        scene.add_child(e[0], e[2]).unwrap();
        scene.add_child(e[0], e[3]).unwrap();

        scene.add_child(e[1], e[2]).unwrap();

        assert_eq!(scene.children(e[0]).collect::<Vec<_>>(), vec![e[3]]);
        assert_eq!(scene.children(e[1]).collect::<Vec<_>>(), vec![e[2]]);
        assert_eq!(rel(&scene, e[3]).prev_child, Entity::INVALID);
        assert_eq!(scene.parent(e[2]), e[1]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let (mut scene, e) = scene_with(&["a", "b", "c"]);
        scene.add_child(e[0], e[1]).unwrap();
        scene.add_child(e[1], e[2]).unwrap();

        assert!(matches!(
            scene.add_child(e[2], e[0]),
            Err(HierarchyError::Cycle { .. })
        ));
        assert!(matches!(
            scene.add_child(e[1], e[1]),
            Err(HierarchyError::SelfParent(_))
        ));
        // Graph unchanged.
        assert!(scene.get::<RelationshipComponent>(e[0]).unwrap().is_root());
        assert!(scene.is_ancestor(e[0], e[2]));
        assert!(!scene.is_ancestor(e[2], e[0]));
    }

    #[test]
    fn test_add_child_missing_entity() {
        let (mut scene, e) = scene_with(&["a"]);
        assert!(matches!(
            scene.add_child(e[0], Entity::from_raw(999)),
            Err(HierarchyError::EntityNotFound(_))
        ));
    }
}
