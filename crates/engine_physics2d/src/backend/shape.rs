use glam::Vec2;
use rapier2d::geometry::{Collider, ColliderBuilder, ColliderHandle};
use rapier2d::pipeline::{ActiveEvents, ActiveHooks};

use super::body::BodyHandle;
use super::to_vector;

/// Generational handle to a [`Fixture`] owned by a [`World2D`](super::World2D).
pub type FixtureHandle = ColliderHandle;

/// Collision geometry in body-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned (in body space) box centred on `offset`.
    Box { half_extents: Vec2, offset: Vec2 },
    /// Circle centred on `offset`.
    Circle { radius: f32, offset: Vec2 },
}

impl Shape {
    fn builder(&self) -> ColliderBuilder {
        match *self {
            Self::Box { half_extents, offset } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y)
                    .translation(to_vector(offset))
            }
            Self::Circle { radius, offset } => {
                ColliderBuilder::ball(radius).translation(to_vector(offset))
            }
        }
    }
}

/// Construction parameters for a [`Fixture`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureDef {
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Approach speed below which collisions are treated as inelastic.
    pub restitution_threshold: f32,
    pub is_sensor: bool,
}

impl FixtureDef {
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            restitution_threshold: 1.0,
            is_sensor: false,
        }
    }
}

/// A shape attached to a body together with its material.
///
/// This is the authoring record; the collider the solver works on is built
/// from it by [`Fixture::collider`].
#[derive(Debug, Clone)]
pub struct Fixture {
    pub(super) body: BodyHandle,
    pub(super) shape: Shape,
    pub(super) density: f32,
    pub(super) friction: f32,
    pub(super) restitution: f32,
    pub(super) restitution_threshold: f32,
    pub(super) sensor: bool,
}

impl Fixture {
    pub(super) fn new(body: BodyHandle, def: &FixtureDef) -> Self {
        Self {
            body,
            shape: def.shape,
            density: def.density.max(0.0),
            friction: def.friction.max(0.0),
            restitution: def.restitution.max(0.0),
            restitution_threshold: def.restitution_threshold.max(0.0),
            sensor: def.is_sensor,
        }
    }

    /// Every collider reports touching events; solid ones also go through
    /// material mixing before the solver sees their contacts.
    pub(super) fn collider(&self, user_data: u64) -> Collider {
        let builder = self
            .shape
            .builder()
            .density(self.density)
            .friction(self.friction)
            .restitution(self.restitution)
            .sensor(self.sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(u128::from(user_data));
        if self.sensor {
            builder.build()
        } else {
            builder.active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS).build()
        }
    }

    #[must_use]
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn density(&self) -> f32 {
        self.density
    }

    #[must_use]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    #[must_use]
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    #[must_use]
    pub fn restitution_threshold(&self) -> f32 {
        self.restitution_threshold
    }

    /// Sensors report contacts but never push anything.
    #[must_use]
    pub fn is_sensor(&self) -> bool {
        self.sensor
    }
}
