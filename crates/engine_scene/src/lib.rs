//! # engine_scene
//!
//! A [`Scene`] owns an [`EntityStore`](engine_component::EntityStore) and
//! layers the scene graph on top of it:
//!
//! - [`RelationshipComponent`]: parent pointer plus an intrusive, doubly
//!   linked sibling list per entity.
//! - [`Scene::add_child`] / [`Scene::remove_child`] / [`Scene::children`]:
//!   hierarchy editing and traversal.
//! - [`Scene::local_matrix`] / [`Scene::world_matrix`]: transform
//!   composition up the parent chain, recomputed on every call.

pub mod components;
pub mod error;
pub mod hierarchy;
pub mod scene;
pub mod transform;

pub use components::{RelationshipComponent, ScriptComponent, TagComponent};
pub use error::{HierarchyError, SceneError};
pub use hierarchy::Children;
pub use scene::Scene;
