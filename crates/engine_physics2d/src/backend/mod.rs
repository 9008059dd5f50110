//! The rigid-body world, built on rapier.
//!
//! The API keeps the usual body/fixture split: a body carries the pose and
//! velocities, one or more [`Fixture`]s attach shapes and materials to it.
//! [`World2D::step`] advances everything by one fixed increment and reports
//! begin/end touching events to a [`ContactListener`] while the world is
//! locked; structural changes during that window are rejected with
//! [`BackendError::WorldLocked`](crate::BackendError::WorldLocked).

mod body;
mod events;
mod shape;
mod world;

use glam::Vec2;
use rapier2d::math::{Point, Real, Vector};

pub use body::{Body, BodyDef, BodyHandle, BodyKind};
pub use events::{ContactEvent, ContactListener, FixtureInfo};
pub use shape::{Fixture, FixtureDef, FixtureHandle, Shape};
pub use world::World2D;

fn to_glam(v: Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn to_vector(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

fn to_point(v: Vec2) -> Point<Real> {
    Point::new(v.x, v.y)
}
