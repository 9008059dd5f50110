//! # engine_physics2d
//!
//! Fixed-timestep 2D rigid-body simulation for scene entities.
//!
//! - [`World2D`]: the rigid-body world. It locks itself while stepping.
//! - [`RigidBody2DComponent`], [`BoxCollider2DComponent`] and
//!   [`CircleCollider2DComponent`]: authoring data on entities.
//! - [`bridge`]: turns that data into backend bodies and fixtures.
//! - [`FixedStep`]: splits frame time into whole steps with a hard cap.
//! - [`MutationQueue`]: holds body changes requested mid-step.
//! - [`ContactDispatcher`]: classifies contacts into trigger or collision
//!   callbacks on a [`ScriptBridge`].
//! - [`PhysicsContext`]: one running simulation, tying all of the above to a
//!   [`Scene`](engine_scene::Scene).

pub mod backend;
pub mod bridge;
pub mod components;
pub mod config;
pub mod contact;
pub mod context;
pub mod error;
pub mod queue;
pub mod step;

pub use backend::{BodyHandle, ContactEvent, ContactListener, FixtureHandle, World2D};
pub use components::{
    BodyType, BoxCollider2DComponent, CircleCollider2DComponent, ColliderMaterial,
    RigidBody2DComponent, Smoothing,
};
pub use config::PhysicsConfig;
pub use contact::{ContactDispatcher, DeferredCommands, ScriptBridge};
pub use context::PhysicsContext;
pub use error::{BackendError, PhysicsError};
pub use queue::{MutationBatch, MutationQueue};
pub use step::{FixedStep, StepPlan};
