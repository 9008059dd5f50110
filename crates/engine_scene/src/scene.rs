//! Scene entity lifecycle.

use engine_component::{Component, Entity, EntityStore, StoreError};
use engine_math::Transform;
use tracing::debug;
use uuid::Uuid;

use crate::components::{RelationshipComponent, TagComponent};
use crate::error::SceneError;

/// A set of entities, their components, and the hierarchy between them.
#[derive(Debug)]
pub struct Scene {
    /// Identifies this scene in logs.
    id: Uuid,
    /// Display name.
    name: String,
    /// Entity and component storage.
    store: EntityStore,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            store: EntityStore::new(),
        }
    }

    /// Unique identifier of this scene instance.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Write access to the underlying store.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    // -- Entity lifecycle --

    /// Create a root entity with a [`Transform`], a [`RelationshipComponent`]
    /// and a [`TagComponent`].
    pub fn create_entity(&mut self, name: &str) -> Entity {
        let entity = self.store.spawn();
        self.attach_defaults(entity, name);
        entity
    }

    /// Like [`Scene::create_entity`] but with a caller-chosen ID, e.g. one
    /// read back by a scene loader.
    ///
    /// # Errors
    ///
    /// Fails if the ID is invalid or already live.
    pub fn create_entity_with_id(&mut self, entity: Entity, name: &str) -> Result<Entity, SceneError> {
        self.store.spawn_with_id(entity)?;
        self.attach_defaults(entity, name);
        Ok(entity)
    }

    fn attach_defaults(&mut self, entity: Entity, name: &str) {
        let tag = if name.is_empty() { "Entity" } else { name };
        for result in [
            self.store.insert(entity, Transform::IDENTITY).map(drop),
            self.store.insert(entity, RelationshipComponent::default()).map(drop),
            self.store.insert(entity, TagComponent::new(tag)).map(drop),
        ] {
            debug_assert!(result.is_ok(), "freshly spawned {entity} rejected a component");
        }
    }

    /// Destroy an entity together with its whole subtree.
    ///
    /// Returns `false` if the entity was not live.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.destroy_entity_with(entity, |_, _| {})
    }

    /// Destroy an entity together with its whole subtree, calling
    /// `before_free` for every destroyed entity while its components are
    /// still present.
    ///
    /// The entity is detached from its parent first; children are destroyed
    /// depth-first after their parent has been notified.
    pub fn destroy_entity_with(
        &mut self,
        entity: Entity,
        mut before_free: impl FnMut(&Scene, Entity),
    ) -> bool {
        self.destroy_recursive(entity, &mut before_free)
    }

    fn destroy_recursive(&mut self, entity: Entity, before_free: &mut dyn FnMut(&Scene, Entity)) -> bool {
        if !self.store.exists(entity) {
            return false;
        }

        before_free(self, entity);

        let parent = self.parent(entity);
        if parent.is_valid() {
            self.remove_child(parent, entity);
        }

        let children: Vec<Entity> = self.children(entity).collect();
        for child in children {
            self.remove_child(entity, child);
            self.destroy_recursive(child, before_free);
        }

        debug!(scene = %self.id, %entity, "destroyed entity");
        self.store.despawn(entity)
    }

    /// Deep-copy an entity and its subtree. The copy is attached to the
    /// original's parent.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not live.
    pub fn duplicate_entity(&mut self, entity: Entity) -> Result<Entity, SceneError> {
        let copy = self.duplicate_subtree(entity)?;
        let parent = self.parent(entity);
        if parent.is_valid() {
            self.add_child(parent, copy)?;
        }
        Ok(copy)
    }

    fn duplicate_subtree(&mut self, entity: Entity) -> Result<Entity, SceneError> {
        if !self.store.exists(entity) {
            return Err(StoreError::EntityNotFound(entity).into());
        }

        let copy = self.store.spawn();
        self.store.copy_components(entity, copy)?;
        self.store.insert(copy, RelationshipComponent::default())?;

        let children: Vec<Entity> = self.children(entity).collect();
        for child in children {
            let child_copy = self.duplicate_subtree(child)?;
            self.add_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// First entity (lowest ID) whose tag equals `name`.
    #[must_use]
    pub fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        self.store
            .iter::<TagComponent>()
            .find(|(_, tag)| tag.tag == name)
            .map(|(entity, _)| entity)
    }

    /// Returns `true` if the entity is live.
    #[must_use]
    pub fn exists(&self, entity: Entity) -> bool {
        self.store.exists(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    // -- Component shortcuts --

    /// Attach or replace a component.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not live.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), SceneError> {
        self.store.insert(entity, value)?;
        Ok(())
    }

    /// Borrow a component.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.store.get(entity)
    }

    /// Mutably borrow a component.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.store.get_mut(entity)
    }

    /// Returns `true` if the entity carries a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.store.has::<T>(entity)
    }

    /// All entities carrying a `T`, in ascending ID order.
    #[must_use]
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.store.entities_with::<T>()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use engine_math::Vec3;

    use super::*;

    #[test]
    fn test_create_entity_attaches_defaults() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("player");
        assert!(scene.exists(e));
        assert_eq!(scene.get::<Transform>(e), Some(&Transform::IDENTITY));
        assert!(scene.get::<RelationshipComponent>(e).unwrap().is_root());
        assert_eq!(scene.get::<TagComponent>(e).unwrap().tag, "player");

        let unnamed = scene.create_entity("");
        assert_eq!(scene.get::<TagComponent>(unnamed).unwrap().tag, "Entity");
    }

    #[test]
    fn test_create_entity_with_id() {
        let mut scene = Scene::new("test");
        let e = scene
            .create_entity_with_id(Entity::from_raw(1234), "loaded")
            .unwrap();
        assert_eq!(e.id(), 1234);
        assert!(scene.create_entity_with_id(e, "again").is_err());
    }

    #[test]
    fn test_find_entity_by_name() {
        let mut scene = Scene::new("test");
        let _a = scene.create_entity("a");
        let b = scene.create_entity("b");
        assert_eq!(scene.find_entity_by_name("b"), Some(b));
        assert_eq!(scene.find_entity_by_name("missing"), None);
    }

    #[test]
    fn test_destroy_cascades_to_children_and_detaches() {
        let mut scene = Scene::new("test");
        let root = scene.create_entity("root");
        let mid = scene.create_entity("mid");
        let leaf = scene.create_entity("leaf");
        let sibling = scene.create_entity("sibling");
        scene.add_child(root, mid).unwrap();
        scene.add_child(mid, leaf).unwrap();
        scene.add_child(root, sibling).unwrap();

        let mut notified = Vec::new();
        assert!(scene.destroy_entity_with(mid, |scene, e| {
            assert!(scene.has::<TagComponent>(e));
            notified.push(e);
        }));

        assert_eq!(notified, vec![mid, leaf]);
        assert!(!scene.exists(mid));
        assert!(!scene.exists(leaf));
        let children: Vec<_> = scene.children(root).collect();
        assert_eq!(children, vec![sibling]);
        let rel = scene.get::<RelationshipComponent>(sibling).unwrap();
        assert_eq!(rel.prev_child, Entity::INVALID);
        assert!(!scene.destroy_entity(mid));
    }

    #[test]
    fn test_duplicate_entity_copies_subtree() {
        let mut scene = Scene::new("test");
        let root = scene.create_entity("root");
        let parent = scene.create_entity("parent");
        let child = scene.create_entity("child");
        scene.add_child(root, parent).unwrap();
        scene.add_child(parent, child).unwrap();
        scene.get_mut::<Transform>(child).unwrap().position = Vec3::new(1.0, 2.0, 3.0);

        let copy = scene.duplicate_entity(parent).unwrap();
        assert_ne!(copy, parent);
        assert_eq!(scene.parent(copy), root);
        assert_eq!(scene.children(root).count(), 2);

        let copied_children: Vec<_> = scene.children(copy).collect();
        assert_eq!(copied_children.len(), 1);
        let child_copy = copied_children[0];
        assert_ne!(child_copy, child);
        assert_eq!(
            scene.get::<Transform>(child_copy).unwrap().position,
            Vec3::new(1.0, 2.0, 3.0)
        );
        // The original subtree is untouched.
        assert_eq!(scene.children(parent).collect::<Vec<_>>(), vec![child]);
    }
}
