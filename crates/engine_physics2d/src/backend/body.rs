use glam::Vec2;
use rapier2d::dynamics::{RigidBody, RigidBodyHandle, RigidBodyType};

use super::{FixtureHandle, to_glam};

/// Generational handle to a body owned by a [`World2D`](super::World2D).
pub type BodyHandle = RigidBodyHandle;

/// How the solver treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Infinite mass, never moves.
    Static,
    /// Infinite mass, moved only by its velocity.
    Kinematic,
    /// Finite mass, moved by gravity, forces, impulses and contacts.
    Dynamic,
}

impl From<RigidBodyType> for BodyKind {
    fn from(body_type: RigidBodyType) -> Self {
        match body_type {
            RigidBodyType::Fixed => Self::Static,
            RigidBodyType::Dynamic => Self::Dynamic,
            RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
                Self::Kinematic
            }
        }
    }
}

/// Construction parameters for a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    /// Opaque value handed back in contact events.
    pub user_data: u64,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            kind: BodyKind::Static,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity_scale: 1.0,
            fixed_rotation: false,
            user_data: 0,
        }
    }
}

/// Entity bits stored in the low half of a rapier `user_data`.
#[allow(clippy::cast_possible_truncation)]
pub(super) fn entity_bits(user_data: u128) -> u64 {
    user_data as u64
}

/// Read-only view of a rigid body in a [`World2D`](super::World2D).
#[derive(Debug, Clone, Copy)]
pub struct Body<'a>(pub(super) &'a RigidBody);

impl Body<'_> {
    #[must_use]
    pub fn kind(&self) -> BodyKind {
        self.0.body_type().into()
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        to_glam(*self.0.translation())
    }

    /// Rotation about Z in radians.
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.0.rotation().angle()
    }

    #[must_use]
    pub fn linear_velocity(&self) -> Vec2 {
        to_glam(*self.0.linvel())
    }

    #[must_use]
    pub fn angular_velocity(&self) -> f32 {
        self.0.angvel()
    }

    /// Force accumulated since the last [`World2D::clear_forces`](super::World2D::clear_forces).
    #[must_use]
    pub fn force(&self) -> Vec2 {
        to_glam(self.0.user_force())
    }

    #[must_use]
    pub fn gravity_scale(&self) -> f32 {
        self.0.gravity_scale()
    }

    #[must_use]
    pub fn mass(&self) -> f32 {
        self.0.mass()
    }

    #[must_use]
    pub fn user_data(&self) -> u64 {
        entity_bits(self.0.user_data)
    }

    #[must_use]
    pub fn fixtures(&self) -> &[FixtureHandle] {
        self.0.colliders()
    }
}
