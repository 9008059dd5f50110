//! Touching events and contact material mixing during a rapier step.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use rapier2d::dynamics::RigidBodySet;
use rapier2d::geometry::{ColliderSet, CollisionEvent, ContactPair};
use rapier2d::math::{Real, Vector};
use rapier2d::pipeline::{ContactModificationContext, EventHandler, PhysicsHooks};

use super::body::{BodyHandle, entity_bits};
use super::shape::{Fixture, FixtureHandle};
use super::world::World2D;

/// One side of a contact event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureInfo {
    pub fixture: FixtureHandle,
    pub body: BodyHandle,
    /// The owning body's [`BodyDef::user_data`](super::BodyDef::user_data).
    pub user_data: u64,
    pub is_sensor: bool,
}

/// A pair of fixtures that started or stopped touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub fixture_a: FixtureInfo,
    pub fixture_b: FixtureInfo,
}

/// Receives touching events from [`World2D::step`] and
/// [`World2D::destroy_body`] callers.
///
/// During a step the world is locked for the duration of both callbacks and
/// is passed in read-only.
pub trait ContactListener {
    fn begin_contact(&mut self, world: &World2D, contact: &ContactEvent);
    fn end_contact(&mut self, world: &World2D, contact: &ContactEvent);
}

impl ContactListener for () {
    fn begin_contact(&mut self, _world: &World2D, _contact: &ContactEvent) {}
    fn end_contact(&mut self, _world: &World2D, _contact: &ContactEvent) {}
}

fn fixture_info(
    bodies: &RigidBodySet,
    colliders: &ColliderSet,
    handle: FixtureHandle,
) -> Option<FixtureInfo> {
    let collider = colliders.get(handle)?;
    let body = collider.parent()?;
    Some(FixtureInfo {
        fixture: handle,
        body,
        user_data: entity_bits(bodies.get(body)?.user_data),
        is_sensor: collider.is_sensor(),
    })
}

pub(super) fn contact_event(
    bodies: &RigidBodySet,
    colliders: &ColliderSet,
    a: FixtureHandle,
    b: FixtureHandle,
) -> Option<ContactEvent> {
    Some(ContactEvent {
        fixture_a: fixture_info(bodies, colliders, a)?,
        fixture_b: fixture_info(bodies, colliders, b)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Touch {
    Begin(ContactEvent),
    End(ContactEvent),
}

/// Collects touching events while the pipeline runs. They are handed to the
/// listener once the step has finished, still under the world lock.
#[derive(Debug, Default)]
pub(super) struct EventBuffer {
    touches: Mutex<Vec<Touch>>,
}

impl EventBuffer {
    pub(super) fn take(&self) -> Vec<Touch> {
        std::mem::take(&mut *self.touches.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventHandler for EventBuffer {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // Removal end events are produced by `World2D::destroy_body`.
        if event.removed() {
            return;
        }
        let Some(contact) = contact_event(bodies, colliders, event.collider1(), event.collider2())
        else {
            return;
        };
        let touch = if event.started() {
            Touch::Begin(contact)
        } else {
            Touch::End(contact)
        };
        self.touches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(touch);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Mixes fixture materials into the solver contacts: friction is the
/// geometric mean, restitution the larger value, and restitution only
/// applies above the smaller of the two thresholds.
pub(super) struct MaterialMixing<'a> {
    pub(super) fixtures: &'a HashMap<FixtureHandle, Fixture>,
}

impl PhysicsHooks for MaterialMixing<'_> {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let (Some(a), Some(b)) = (
            self.fixtures.get(&context.collider1),
            self.fixtures.get(&context.collider2),
        ) else {
            return;
        };
        let friction = (a.friction * b.friction).sqrt();
        let restitution = a.restitution.max(b.restitution);
        let threshold = a.restitution_threshold.min(b.restitution_threshold);

        let bodies = context.bodies;
        let body1 = context.rigid_body1.and_then(|h| bodies.get(h));
        let body2 = context.rigid_body2.and_then(|h| bodies.get(h));
        let normal = *context.normal;
        for contact in context.solver_contacts.iter_mut() {
            let v1 = body1.map_or_else(Vector::zeros, |b| b.velocity_at_point(&contact.point));
            let v2 = body2.map_or_else(Vector::zeros, |b| b.velocity_at_point(&contact.point));
            let approach = (v2 - v1).dot(&normal).abs();
            contact.friction = friction;
            contact.restitution = if approach > threshold { restitution } else { 0.0 };
        }
    }
}
