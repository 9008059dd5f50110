//! The running simulation of one scene.
//!
//! A [`PhysicsContext`] exists between [`PhysicsContext::start`] and
//! [`PhysicsContext::stop`]. It owns the backend world, the fixed-step clock
//! and the mutation queue, and is passed the scene explicitly on every call.
//!
//! Each frame, [`PhysicsContext::update`] first reports contacts ended by
//! bodies destroyed since the last frame, then runs zero or more fixed steps.
//! Around every step it snapshots interpolated bodies, steps the world with
//! contact dispatch, and applies mutations queued by scripts. Forces are
//! cleared once per frame. When at least one step ran, the smoothed poses are
//! written back to each body's [`Transform`].
//!
//! Physics reads and writes the entity's local transform, so bodies are
//! expected on root entities.

use std::collections::BTreeSet;

use engine_component::{Component, Entity};
use engine_math::{Transform, lerp};
use engine_scene::Scene;
use glam::Vec2;
use tracing::{debug, error, info, warn};

use crate::backend::{BodyHandle, ContactEvent, ContactListener, World2D};
use crate::bridge;
use crate::components::{
    BodyType, BoxCollider2DComponent, CircleCollider2DComponent, RigidBody2DComponent, Smoothing,
};
use crate::config::PhysicsConfig;
use crate::contact::{ContactDispatcher, ScriptBridge};
use crate::error::PhysicsError;
use crate::queue::{MutationBatch, MutationQueue};
use crate::step::{FixedStep, StepPlan};

#[derive(Debug)]
pub struct PhysicsContext {
    config: PhysicsConfig,
    world: World2D,
    clock: FixedStep,
    queue: MutationQueue,
    /// Entities whose body was destroyed while the entity itself lives on.
    detached: BTreeSet<Entity>,
    /// Contacts ended by a destroy outside a step, reported on the next update.
    pending_exits: Vec<ContactEvent>,
}

impl PhysicsContext {
    /// Build a body for every entity with a [`RigidBody2DComponent`] and a
    /// fixture for each of its colliders.
    ///
    /// # Errors
    ///
    /// Fails if a body cannot be built; runtime handles already written to
    /// the scene are cleared again.
    pub fn start(scene: &mut Scene, config: PhysicsConfig) -> Result<Self, PhysicsError> {
        let mut context = Self {
            world: World2D::new(config.gravity),
            clock: FixedStep::new(config.fixed_dt, config.max_steps),
            queue: MutationQueue::new(),
            detached: BTreeSet::new(),
            pending_exits: Vec::new(),
            config,
        };

        for entity in scene.entities_with::<RigidBody2DComponent>() {
            if let Err(err) = context.attach_entity(scene, entity) {
                clear_runtime_state(scene);
                return Err(err);
            }
        }

        info!(
            scene = %scene.id(),
            bodies = context.world.body_count(),
            fixtures = context.world.fixture_count(),
            "physics started"
        );
        Ok(context)
    }

    /// Tear down the world and clear every runtime handle in the scene.
    pub fn stop(self, scene: &mut Scene) {
        clear_runtime_state(scene);
        info!(scene = %scene.id(), bodies = self.world.body_count(), "physics stopped");
    }

    /// Create the body and fixtures for one entity.
    ///
    /// An entity that already owns a live body keeps it. A handle copied from
    /// another entity, e.g. by duplication, is replaced by a fresh body.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::MissingComponent`] if the entity lacks a transform or
    /// rigid body, or a backend failure.
    pub fn attach_entity(
        &mut self,
        scene: &mut Scene,
        entity: Entity,
    ) -> Result<BodyHandle, PhysicsError> {
        let transform = *scene
            .get::<Transform>(entity)
            .ok_or_else(|| missing::<Transform>(entity))?;
        let world = &mut self.world;
        let rigidbody = scene
            .get_mut::<RigidBody2DComponent>(entity)
            .ok_or_else(|| missing::<RigidBody2DComponent>(entity))?;

        if let Some(existing) = rigidbody.runtime_body
            && world.body(existing).is_some_and(|body| body.user_data() == entity.id())
        {
            return Ok(existing);
        }

        let handle = bridge::create_body(world, entity, &transform, rigidbody)?;
        let rigidbody = rigidbody.clone();

        if let Some(collider) = scene.get_mut::<BoxCollider2DComponent>(entity) {
            bridge::create_box_collider(world, entity, &transform, &rigidbody, collider)?;
        }
        if let Some(collider) = scene.get_mut::<CircleCollider2DComponent>(entity) {
            bridge::create_circle_collider(world, entity, &transform, &rigidbody, collider)?;
        }

        self.detached.remove(&entity);
        debug!(%entity, ?handle, body_type = ?rigidbody.body_type, "attached body");
        Ok(handle)
    }

    // -- Stepping --

    /// Advance the simulation by one frame.
    pub fn update(
        &mut self,
        scene: &mut Scene,
        scripts: &mut dyn ScriptBridge,
        frame_dt: f64,
    ) -> StepPlan {
        if !self.pending_exits.is_empty() {
            let exits = std::mem::take(&mut self.pending_exits);
            self.dispatch_exits(scene, scripts, &exits);
            self.apply_mutations(scene, scripts);
        }

        let plan = self.clock.advance(frame_dt);
        if plan.dropped > 0 {
            warn!(dropped = plan.dropped, "physics is falling behind, discarding excess time");
        }

        #[allow(clippy::cast_possible_truncation)]
        let dt = self.clock.dt() as f32;
        for _ in 0..plan.steps {
            self.snapshot_previous_poses(scene);
            let mut dispatcher = ContactDispatcher::new(scene, &mut self.queue, scripts);
            self.world.step(
                dt,
                self.config.velocity_iterations,
                self.config.position_iterations,
                &mut dispatcher,
            );
            self.apply_mutations(scene, scripts);
        }
        self.world.clear_forces();

        debug!(steps = plan.steps, dropped = plan.dropped, ratio = plan.ratio, "physics update");
        if plan.steps > 0 {
            self.write_poses(scene, plan.ratio);
        }
        plan
    }

    fn snapshot_previous_poses(&self, scene: &mut Scene) {
        for entity in scene.entities_with::<RigidBody2DComponent>() {
            let Some(body) = self.live_body(scene, entity).and_then(|h| self.world.body(h)) else {
                continue;
            };
            let (position, angle) = (body.position(), body.angle());
            if let Some(rb) = scene.get_mut::<RigidBody2DComponent>(entity)
                && rb.body_type != BodyType::Static
                && rb.smoothing == Smoothing::Interpolation
            {
                rb.previous_position = position;
                rb.previous_angle = angle;
            }
        }
    }

    fn write_poses(&self, scene: &mut Scene, ratio: f32) {
        #[allow(clippy::cast_possible_truncation)]
        let lead = ratio * self.clock.dt() as f32;

        for entity in scene.entities_with::<RigidBody2DComponent>() {
            let Some(body) = self.live_body(scene, entity).and_then(|h| self.world.body(h)) else {
                continue;
            };
            let Some(rb) = scene.get::<RigidBody2DComponent>(entity) else {
                continue;
            };
            if rb.body_type == BodyType::Static {
                continue;
            }

            let (position, angle) = match rb.smoothing {
                Smoothing::None => (body.position(), body.angle()),
                Smoothing::Interpolation => (
                    rb.previous_position.lerp(body.position(), ratio),
                    lerp(rb.previous_angle, body.angle(), ratio),
                ),
                Smoothing::Extrapolation => (
                    body.position() + body.linear_velocity() * lead,
                    body.angle() + body.angular_velocity() * lead,
                ),
            };

            match scene.get_mut::<Transform>(entity) {
                Some(transform) => transform.set_pose_2d(position, angle),
                None => {
                    error!(%entity, "simulated entity has no Transform");
                    debug_assert!(false, "{entity} is simulated but has no Transform");
                }
            }
        }
    }

    /// The entity's body, if it should be simulated.
    ///
    /// A rigid body without a live backend body is an invariant violation
    /// unless its body was destroyed on purpose.
    fn live_body(&self, scene: &Scene, entity: Entity) -> Option<BodyHandle> {
        let rb = scene.get::<RigidBody2DComponent>(entity)?;
        match rb.runtime_body {
            Some(handle) if self.owns(handle, entity) => Some(handle),
            None if self.detached.contains(&entity) => None,
            handle => {
                error!(%entity, ?handle, "rigid body has no backend body, was physics started?");
                debug_assert!(false, "{entity} has a RigidBody2D without a backend body");
                None
            }
        }
    }

    // -- Mutations --

    /// Hand contacts that ended outside a step to scripts.
    fn dispatch_exits(
        &mut self,
        scene: &Scene,
        scripts: &mut dyn ScriptBridge,
        exits: &[ContactEvent],
    ) {
        let mut dispatcher = ContactDispatcher::new(scene, &mut self.queue, scripts);
        for contact in exits {
            dispatcher.end_contact(&self.world, contact);
        }
    }

    fn apply_mutations(&mut self, scene: &mut Scene, scripts: &mut dyn ScriptBridge) {
        if self.queue.is_empty() {
            return;
        }
        let mut exits = Vec::new();
        for handle in self.queue.pending_destroys().to_vec() {
            exits.extend(self.destroy_handle(scene, handle));
        }
        // The destroyed bodies are still listed as pending, which the
        // dispatcher's drop rules see.
        self.dispatch_exits(scene, scripts, &exits);

        let MutationBatch {
            positions,
            rotations,
            ..
        } = self.queue.drain();
        for (handle, position) in positions {
            if let Some(angle) = self.world.body(handle).map(|b| b.angle()) {
                self.teleport(scene, handle, position, angle);
            }
        }
        for (handle, angle) in rotations {
            if let Some(position) = self.world.body(handle).map(|b| b.position()) {
                self.teleport(scene, handle, position, angle);
            }
        }
    }

    /// Returns the contacts the body was part of.
    fn destroy_handle(&mut self, scene: &mut Scene, handle: BodyHandle) -> Vec<ContactEvent> {
        let Some(entity) = self.world.body(handle).map(|b| Entity::from_raw(b.user_data())) else {
            return Vec::new();
        };
        let ended = match self.world.destroy_body(handle) {
            Ok(ended) => ended,
            Err(err) => {
                error!(%entity, %err, "failed to destroy body");
                return Vec::new();
            }
        };

        if let Some(rb) = scene.get_mut::<RigidBody2DComponent>(entity)
            && rb.runtime_body == Some(handle)
        {
            rb.runtime_body = None;
            self.detached.insert(entity);
            if let Some(collider) = scene.get_mut::<BoxCollider2DComponent>(entity) {
                collider.runtime_fixture = None;
            }
            if let Some(collider) = scene.get_mut::<CircleCollider2DComponent>(entity) {
                collider.runtime_fixture = None;
            }
        }
        debug!(%entity, ?handle, ended = ended.len(), "destroyed body");
        ended
    }

    /// Move a body and its transform together. The smoothing snapshot moves
    /// too, so interpolation does not sweep across the jump.
    fn teleport(&mut self, scene: &mut Scene, handle: BodyHandle, position: Vec2, angle: f32) {
        let Some(entity) = self.world.body(handle).map(|b| Entity::from_raw(b.user_data())) else {
            return;
        };
        if let Err(err) = self.world.set_transform(handle, position, angle) {
            error!(%entity, %err, "failed to move body");
            return;
        }
        if let Some(transform) = scene.get_mut::<Transform>(entity) {
            transform.set_pose_2d(position, angle);
        }
        if let Some(rb) = scene.get_mut::<RigidBody2DComponent>(entity) {
            rb.previous_position = position;
            rb.previous_angle = angle;
        }
    }

    /// Destroy the entity's body, keeping the entity. Deferred while the
    /// world is locked. Returns `false` if the entity has no live body.
    ///
    /// Contacts the body was part of are reported as exits on the next
    /// [`PhysicsContext::update`].
    pub fn destroy_body(&mut self, scene: &mut Scene, entity: Entity) -> bool {
        let Some(handle) = self.body_handle(scene, entity) else {
            return false;
        };
        if self.world.is_locked() {
            self.queue.destroy(handle);
        } else {
            let ended = self.destroy_handle(scene, handle);
            self.pending_exits.extend(ended);
        }
        true
    }

    /// Teleport the entity's body. Deferred while the world is locked.
    pub fn set_position(&mut self, scene: &mut Scene, entity: Entity, position: Vec2) -> bool {
        let Some(handle) = self.body_handle(scene, entity) else {
            return false;
        };
        if self.world.is_locked() {
            self.queue.set_position(handle, position);
        } else if let Some(angle) = self.world.body(handle).map(|b| b.angle()) {
            self.teleport(scene, handle, position, angle);
        }
        true
    }

    /// Rotate the entity's body. Deferred while the world is locked.
    pub fn set_rotation(&mut self, scene: &mut Scene, entity: Entity, angle: f32) -> bool {
        let Some(handle) = self.body_handle(scene, entity) else {
            return false;
        };
        if self.world.is_locked() {
            self.queue.set_rotation(handle, angle);
        } else if let Some(position) = self.world.body(handle).map(|b| b.position()) {
            self.teleport(scene, handle, position, angle);
        }
        true
    }

    /// Entity-destruction notification: drop the body while the entity's
    /// components are still readable.
    pub fn on_entity_destroyed(&mut self, scene: &Scene, entity: Entity) {
        self.detached.remove(&entity);
        let Some(handle) = self.body_handle(scene, entity) else {
            return;
        };
        if self.world.is_locked() {
            self.queue.destroy(handle);
            return;
        }
        match self.world.destroy_body(handle) {
            Ok(ended) => {
                debug!(%entity, ?handle, ended = ended.len(), "detached body of destroyed entity");
                self.pending_exits.extend(ended);
            }
            Err(err) => error!(%entity, %err, "failed to destroy body of destroyed entity"),
        }
    }

    // -- Body queries and impulses --

    /// The entity's live backend body, if any.
    #[must_use]
    pub fn body_handle(&self, scene: &Scene, entity: Entity) -> Option<BodyHandle> {
        scene
            .get::<RigidBody2DComponent>(entity)?
            .runtime_body
            .filter(|handle| self.owns(*handle, entity))
    }

    /// A handle copied along with a duplicated component still points at the
    /// original entity's body.
    fn owns(&self, handle: BodyHandle, entity: Entity) -> bool {
        self.world
            .body(handle)
            .is_some_and(|body| body.user_data() == entity.id())
    }

    fn require_body(&self, scene: &Scene, entity: Entity) -> Result<BodyHandle, PhysicsError> {
        if !scene.has::<RigidBody2DComponent>(entity) {
            return Err(missing::<RigidBody2DComponent>(entity));
        }
        self.body_handle(scene, entity)
            .ok_or(PhysicsError::BodyNotCreated(entity))
    }

    /// # Errors
    ///
    /// Fails if the entity has no live body.
    pub fn apply_linear_impulse(
        &mut self,
        scene: &Scene,
        entity: Entity,
        impulse: Vec2,
        world_point: Vec2,
    ) -> Result<(), PhysicsError> {
        let handle = self.require_body(scene, entity)?;
        Ok(self.world.apply_linear_impulse(handle, impulse, world_point)?)
    }

    /// # Errors
    ///
    /// Fails if the entity has no live body.
    pub fn apply_linear_impulse_to_center(
        &mut self,
        scene: &Scene,
        entity: Entity,
        impulse: Vec2,
    ) -> Result<(), PhysicsError> {
        let handle = self.require_body(scene, entity)?;
        Ok(self.world.apply_linear_impulse_to_center(handle, impulse)?)
    }

    /// Apply a force that lasts until the end of the current frame.
    ///
    /// # Errors
    ///
    /// Fails if the entity has no live body.
    pub fn apply_force(
        &mut self,
        scene: &Scene,
        entity: Entity,
        force: Vec2,
        world_point: Vec2,
    ) -> Result<(), PhysicsError> {
        let handle = self.require_body(scene, entity)?;
        Ok(self.world.apply_force(handle, force, world_point)?)
    }

    /// # Errors
    ///
    /// Fails if the entity has no live body.
    pub fn linear_velocity(&self, scene: &Scene, entity: Entity) -> Result<Vec2, PhysicsError> {
        let handle = self.require_body(scene, entity)?;
        self.world
            .body(handle)
            .map(|b| b.linear_velocity())
            .ok_or(PhysicsError::BodyNotCreated(entity))
    }

    /// # Errors
    ///
    /// Fails if the entity has no live body.
    pub fn set_linear_velocity(
        &mut self,
        scene: &Scene,
        entity: Entity,
        velocity: Vec2,
    ) -> Result<(), PhysicsError> {
        let handle = self.require_body(scene, entity)?;
        Ok(self.world.set_linear_velocity(handle, velocity)?)
    }

    // -- Accessors --

    #[must_use]
    pub fn world(&self) -> &World2D {
        &self.world
    }

    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Simulation time carried over to the next frame, in seconds.
    #[must_use]
    pub fn accumulator(&self) -> f64 {
        self.clock.accumulator()
    }
}

fn missing<T: Component>(entity: Entity) -> PhysicsError {
    PhysicsError::MissingComponent {
        entity,
        component: T::type_name(),
    }
}

fn clear_runtime_state(scene: &mut Scene) {
    for entity in scene.entities_with::<RigidBody2DComponent>() {
        if let Some(rb) = scene.get_mut::<RigidBody2DComponent>(entity) {
            rb.runtime_body = None;
        }
    }
    for entity in scene.entities_with::<BoxCollider2DComponent>() {
        if let Some(collider) = scene.get_mut::<BoxCollider2DComponent>(entity) {
            collider.runtime_fixture = None;
        }
    }
    for entity in scene.entities_with::<CircleCollider2DComponent>() {
        if let Some(collider) = scene.get_mut::<CircleCollider2DComponent>(entity) {
            collider.runtime_fixture = None;
        }
    }
}
