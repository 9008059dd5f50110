//! # engine_component
//!
//! The "E" and "C" of the scene model: what an entity is, what a component
//! is, and where component data lives.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the contract all scene data must satisfy.
//! - [`Entity`]: lightweight `u64` entity identifiers.
//! - [`EntityAllocator`]: monotonically increasing ID allocator.
//! - [`EntityStore`]: per-entity component storage keyed by [`Entity`].
//! - [`ComponentRecord`]: MessagePack export of a single component instance.

pub mod component;
pub mod entity;
pub mod error;
pub mod store;

pub use component::{Component, ComponentRecord, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use error::StoreError;
pub use store::EntityStore;
