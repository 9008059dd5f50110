//! Building backend bodies and fixtures from component data.

use engine_component::Entity;
use engine_math::Transform;

use crate::backend::{BodyDef, BodyHandle, BodyKind, FixtureDef, FixtureHandle, Shape, World2D};
use crate::components::{
    BodyType, BoxCollider2DComponent, CircleCollider2DComponent, ColliderMaterial,
    RigidBody2DComponent,
};
use crate::error::PhysicsError;

#[must_use]
pub fn body_kind(body_type: BodyType) -> BodyKind {
    match body_type {
        BodyType::Static => BodyKind::Static,
        BodyType::Dynamic => BodyKind::Dynamic,
        BodyType::Kinematic => BodyKind::Kinematic,
    }
}

/// Create the backend body for `entity` and record it in `rigidbody`.
///
/// The entity ID becomes the body's user data, and the smoothing snapshot
/// starts at the current pose so the first interpolation has a valid origin.
///
/// # Errors
///
/// Propagates backend failures, e.g. a locked world.
pub fn create_body(
    world: &mut World2D,
    entity: Entity,
    transform: &Transform,
    rigidbody: &mut RigidBody2DComponent,
) -> Result<BodyHandle, PhysicsError> {
    let position = transform.position_2d();
    let angle = transform.rotation.z;
    let handle = world.create_body(&BodyDef {
        kind: body_kind(rigidbody.body_type),
        position,
        angle,
        gravity_scale: rigidbody.gravity_scale,
        fixed_rotation: rigidbody.fixed_rotation,
        user_data: entity.id(),
        ..BodyDef::default()
    })?;

    rigidbody.runtime_body = Some(handle);
    rigidbody.previous_position = position;
    rigidbody.previous_angle = angle;
    Ok(handle)
}

fn fixture_def(shape: Shape, material: &ColliderMaterial, is_sensor: bool) -> FixtureDef {
    FixtureDef {
        shape,
        density: material.density,
        friction: material.friction,
        restitution: material.restitution,
        restitution_threshold: material.restitution_threshold,
        is_sensor,
    }
}

fn attached_body(
    entity: Entity,
    rigidbody: &RigidBody2DComponent,
) -> Result<BodyHandle, PhysicsError> {
    rigidbody.runtime_body.ok_or(PhysicsError::BodyNotCreated(entity))
}

/// Attach a box fixture. Half-extents scale with the entity's X/Y scale.
///
/// # Errors
///
/// [`PhysicsError::BodyNotCreated`] if [`create_body`] has not run for the
/// entity, or a backend failure.
pub fn create_box_collider(
    world: &mut World2D,
    entity: Entity,
    transform: &Transform,
    rigidbody: &RigidBody2DComponent,
    collider: &mut BoxCollider2DComponent,
) -> Result<FixtureHandle, PhysicsError> {
    let body = attached_body(entity, rigidbody)?;
    let shape = Shape::Box {
        half_extents: (collider.size * transform.scale.truncate()).abs(),
        offset: collider.offset,
    };
    let def = fixture_def(shape, &collider.material, collider.is_sensor);
    let fixture = world.create_fixture(body, &def)?;
    collider.runtime_fixture = Some(fixture);
    Ok(fixture)
}

/// Attach a circle fixture. The radius scales with the entity's X scale only.
///
/// # Errors
///
/// [`PhysicsError::BodyNotCreated`] if [`create_body`] has not run for the
/// entity, or a backend failure.
pub fn create_circle_collider(
    world: &mut World2D,
    entity: Entity,
    transform: &Transform,
    rigidbody: &RigidBody2DComponent,
    collider: &mut CircleCollider2DComponent,
) -> Result<FixtureHandle, PhysicsError> {
    let body = attached_body(entity, rigidbody)?;
    let shape = Shape::Circle {
        radius: (collider.radius * transform.scale.x).abs(),
        offset: collider.offset,
    };
    let def = fixture_def(shape, &collider.material, collider.is_sensor);
    let fixture = world.create_fixture(body, &def)?;
    collider.runtime_fixture = Some(fixture);
    Ok(fixture)
}
