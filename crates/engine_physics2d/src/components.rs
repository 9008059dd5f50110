//! Physics components attached to scene entities.
//!
//! Only authoring data is persisted. Backend handles and smoothing snapshots
//! are runtime state: they are skipped by serde and only meaningful while a
//! [`PhysicsContext`](crate::PhysicsContext) is running.

use engine_component::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::backend::{BodyHandle, FixtureHandle};

/// How a rigid body participates in the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    #[default]
    Static,
    Dynamic,
    Kinematic,
}

/// How the rendered pose is derived from the stepped pose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoothing {
    /// Show the last stepped pose.
    None,
    /// Blend from the pose before the last step to the current one.
    #[default]
    Interpolation,
    /// Advance the current pose along its velocity.
    Extrapolation,
}

/// Makes an entity a simulated body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody2DComponent {
    pub body_type: BodyType,
    pub fixed_rotation: bool,
    pub gravity_scale: f32,
    pub smoothing: Smoothing,

    /// Backend body while the simulation runs.
    #[serde(skip)]
    pub runtime_body: Option<BodyHandle>,
    /// Pose before the latest step, for [`Smoothing::Interpolation`].
    #[serde(skip)]
    pub previous_position: Vec2,
    #[serde(skip)]
    pub previous_angle: f32,
}

impl Default for RigidBody2DComponent {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            fixed_rotation: false,
            gravity_scale: 1.0,
            smoothing: Smoothing::Interpolation,
            runtime_body: None,
            previous_position: Vec2::ZERO,
            previous_angle: 0.0,
        }
    }
}

impl RigidBody2DComponent {
    #[must_use]
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    #[must_use]
    pub fn with_fixed_rotation(mut self, fixed_rotation: bool) -> Self {
        self.fixed_rotation = fixed_rotation;
        self
    }
}

impl Component for RigidBody2DComponent {
    fn type_name() -> &'static str {
        "Rigidbody2D"
    }
}

/// Surface properties shared by all collider shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderMaterial {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Approach speed below which a collision does not bounce.
    pub restitution_threshold: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            restitution_threshold: 0.5,
        }
    }
}

/// Box-shaped fixture. `size` holds half-extents before scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider2DComponent {
    pub offset: Vec2,
    pub size: Vec2,
    pub material: ColliderMaterial,
    pub is_sensor: bool,

    #[serde(skip)]
    pub runtime_fixture: Option<FixtureHandle>,
}

impl Default for BoxCollider2DComponent {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            size: Vec2::splat(0.5),
            material: ColliderMaterial::default(),
            is_sensor: false,
            runtime_fixture: None,
        }
    }
}

impl BoxCollider2DComponent {
    #[must_use]
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: ColliderMaterial) -> Self {
        self.material = material;
        self
    }
}

impl Component for BoxCollider2DComponent {
    fn type_name() -> &'static str {
        "BoxCollider2D"
    }
}

/// Circle-shaped fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleCollider2DComponent {
    pub offset: Vec2,
    pub radius: f32,
    pub material: ColliderMaterial,
    pub is_sensor: bool,

    #[serde(skip)]
    pub runtime_fixture: Option<FixtureHandle>,
}

impl Default for CircleCollider2DComponent {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            radius: 0.5,
            material: ColliderMaterial::default(),
            is_sensor: false,
            runtime_fixture: None,
        }
    }
}

impl CircleCollider2DComponent {
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: ColliderMaterial) -> Self {
        self.material = material;
        self
    }
}

impl Component for CircleCollider2DComponent {
    fn type_name() -> &'static str {
        "CircleCollider2D"
    }
}
