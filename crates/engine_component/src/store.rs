//! Per-entity component storage.
//!
//! [`EntityStore`] keeps one [`Column`] per component type. Columns are
//! type-erased behind [`ErasedColumn`] so the store can remove, copy and
//! export every component of an entity without knowing the concrete types.
//! Within a column, entries are ordered by entity id, which makes every
//! iteration over the store deterministic.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::component::{Component, ComponentRecord, ComponentTypeId};
use crate::entity::{Entity, EntityAllocator};
use crate::error::StoreError;

/// Type-erased operations every column supports.
trait ErasedColumn: Send + Sync {
    fn name(&self) -> &'static str;
    fn contains(&self, entity: Entity) -> bool;
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn copy_entity(&mut self, from: Entity, to: Entity) -> bool;
    fn encode(&self, entity: Entity) -> Option<Result<Vec<u8>, rmp_serde::encode::Error>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// All instances of one component type, keyed by entity.
#[derive(Debug)]
struct Column<T: Component> {
    items: BTreeMap<Entity, T>,
}

impl<T: Component> Column<T> {
    fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Component> ErasedColumn for Column<T> {
    fn name(&self) -> &'static str {
        T::type_name()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.items.contains_key(&entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.items.remove(&entity).is_some()
    }

    fn copy_entity(&mut self, from: Entity, to: Entity) -> bool {
        match self.items.get(&from).cloned() {
            Some(value) => {
                self.items.insert(to, value);
                true
            }
            None => false,
        }
    }

    fn encode(&self, entity: Entity) -> Option<Result<Vec<u8>, rmp_serde::encode::Error>> {
        self.items.get(&entity).map(rmp_serde::to_vec_named)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns the live entity set and all component data of a scene.
pub struct EntityStore {
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Every live entity, with or without components.
    live: BTreeSet<Entity>,
    /// One column per component type.
    columns: HashMap<ComponentTypeId, Box<dyn ErasedColumn>>,
}

impl EntityStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            live: BTreeSet::new(),
            columns: HashMap::new(),
        }
    }

    // -- Entity lifecycle --

    /// Allocate a new live entity without any components.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.live.insert(entity);
        entity
    }

    /// Make an explicitly chosen ID live.
    ///
    /// # Errors
    ///
    /// Fails if `entity` is [`Entity::INVALID`] or already live.
    pub fn spawn_with_id(&mut self, entity: Entity) -> Result<Entity, StoreError> {
        if !entity.is_valid() {
            return Err(StoreError::InvalidEntity(entity));
        }
        if !self.live.insert(entity) {
            return Err(StoreError::EntityExists(entity));
        }
        self.allocator.reserve(entity);
        Ok(entity)
    }

    /// Destroy an entity and drop all of its components.
    ///
    /// Returns `true` if the entity was live.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.live.remove(&entity) {
            return false;
        }
        for column in self.columns.values_mut() {
            column.remove_entity(entity);
        }
        true
    }

    /// Returns `true` if the entity is live.
    #[must_use]
    pub fn exists(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if no entity is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// All live entities in ascending ID order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.live.iter().copied()
    }

    // -- Component operations --

    /// Attach `value` to `entity`, replacing and returning any previous
    /// component of the same type.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not live.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, StoreError> {
        if !self.exists(entity) {
            return Err(StoreError::EntityNotFound(entity));
        }
        Ok(self.column_or_create::<T>().items.insert(entity, value))
    }

    /// Borrow a component.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.column::<T>()?.items.get(&entity)
    }

    /// Mutably borrow a component.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.column_mut::<T>()?.items.get_mut(&entity)
    }

    /// Detach and return a component.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.column_mut::<T>()?.items.remove(&entity)
    }

    /// Returns `true` if the entity carries a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.column::<T>()
            .is_some_and(|column| column.items.contains_key(&entity))
    }

    /// All entities carrying a `T`, in ascending ID order.
    ///
    /// Returns an owned list so callers can mutate the store while walking it.
    #[must_use]
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.column::<T>()
            .map(|column| column.items.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Iterate over every `T` in ascending entity order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.column::<T>()
            .into_iter()
            .flat_map(|column| column.items.iter().map(|(entity, value)| (*entity, value)))
    }

    /// Mutably iterate over every `T` in ascending entity order.
    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.column_mut::<T>()
            .into_iter()
            .flat_map(|column| column.items.iter_mut().map(|(entity, value)| (*entity, value)))
    }

    /// Copy every component of `from` onto `to`, overwriting components of
    /// the same type. Returns the number of components copied.
    ///
    /// # Errors
    ///
    /// Fails if either entity is not live.
    pub fn copy_components(&mut self, from: Entity, to: Entity) -> Result<usize, StoreError> {
        for entity in [from, to] {
            if !self.exists(entity) {
                return Err(StoreError::EntityNotFound(entity));
            }
        }
        let mut copied = 0;
        for column in self.columns.values_mut() {
            if column.copy_entity(from, to) {
                copied += 1;
            }
        }
        Ok(copied)
    }

    /// Export every component of `entity` as MessagePack, ordered by
    /// component type ID.
    ///
    /// # Errors
    ///
    /// Fails if the entity is not live or a component fails to encode.
    pub fn component_records(&self, entity: Entity) -> Result<Vec<ComponentRecord>, StoreError> {
        if !self.exists(entity) {
            return Err(StoreError::EntityNotFound(entity));
        }

        let mut type_ids: Vec<_> = self
            .columns
            .iter()
            .filter(|(_, column)| column.contains(entity))
            .map(|(type_id, _)| *type_id)
            .collect();
        type_ids.sort();

        let mut records = Vec::with_capacity(type_ids.len());
        for type_id in type_ids {
            let column = &self.columns[&type_id];
            if let Some(encoded) = column.encode(entity) {
                let data = encoded.map_err(|source| StoreError::Encode {
                    name: column.name(),
                    source,
                })?;
                records.push(ComponentRecord {
                    entity,
                    type_id,
                    name: column.name().to_string(),
                    data,
                });
            }
        }
        Ok(records)
    }

    fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&T::component_type_id())?
            .as_any()
            .downcast_ref::<Column<T>>()
    }

    fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&T::component_type_id())?
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }

    fn column_or_create<T: Component>(&mut self) -> &mut Column<T> {
        let column = self
            .columns
            .entry(T::component_type_id())
            .or_insert_with(|| Box::new(Column::<T>::new()));
        let owner = column.name();
        column
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .unwrap_or_else(|| {
                panic!(
                    "component type id collision: '{}' hashes to an id owned by '{owner}'",
                    T::type_name()
                )
            })
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.columns.values().map(|column| column.name()).collect();
        names.sort_unstable();
        f.debug_struct("EntityStore")
            .field("entities", &self.live.len())
            .field("components", &names)
            .finish()
    }
}
