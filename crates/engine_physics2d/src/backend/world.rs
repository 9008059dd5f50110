use std::collections::HashMap;
use std::num::NonZeroUsize;

use glam::Vec2;
use rapier2d::dynamics::{
    CCDSolver, ImpulseJointSet, IntegrationParameters, IslandManager, LockedAxes,
    MultibodyJointSet, RigidBody, RigidBodyBuilder, RigidBodySet,
};
use rapier2d::geometry::{ColliderSet, DefaultBroadPhase, NarrowPhase};
use rapier2d::math::{Isometry, Real, Vector};
use rapier2d::pipeline::PhysicsPipeline;
use tracing::trace;

use super::body::{Body, BodyDef, BodyHandle, BodyKind};
use super::events::{
    ContactEvent, ContactListener, EventBuffer, MaterialMixing, Touch, contact_event,
};
use super::shape::{Fixture, FixtureDef, FixtureHandle};
use super::{to_glam, to_point, to_vector};
use crate::error::BackendError;

/// Mass of a dynamic body that has no fixture with positive density.
const UNIT_MASS: Real = 1.0;

/// Owns all bodies and fixtures and advances them in fixed increments.
///
/// Dynamic bodies run with continuous collision detection, so small fast
/// bodies do not tunnel through thin ones.
pub struct World2D {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    events: EventBuffer,
    fixtures: HashMap<FixtureHandle, Fixture>,
    locked: bool,
}

impl std::fmt::Debug for World2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World2D")
            .field("gravity", &self.gravity())
            .field("bodies", &self.bodies.len())
            .field("fixtures", &self.fixtures.len())
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

impl World2D {
    #[must_use]
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_vector(gravity),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            events: EventBuffer::default(),
            fixtures: HashMap::new(),
            locked: false,
        }
    }

    #[must_use]
    pub fn gravity(&self) -> Vec2 {
        to_glam(self.gravity)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_vector(gravity);
    }

    /// `true` while [`World2D::step`] is running.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[cfg(test)]
    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<Body<'_>> {
        self.bodies.get(handle).map(Body)
    }

    #[must_use]
    pub fn fixture(&self, handle: FixtureHandle) -> Option<&Fixture> {
        self.fixtures.get(&handle)
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    /// Number of fixture pairs currently touching.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        let solid = self
            .narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .count();
        let sensed = self
            .narrow_phase
            .intersection_pairs()
            .filter(|(_, _, intersecting)| *intersecting)
            .count();
        solid + sensed
    }

    // -- Structural changes --

    /// # Errors
    ///
    /// [`BackendError::WorldLocked`] during a step.
    pub fn create_body(&mut self, def: &BodyDef) -> Result<BodyHandle, BackendError> {
        self.ensure_unlocked()?;
        let builder = match def.kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based()
                .linvel(to_vector(def.linear_velocity))
                .angvel(def.angular_velocity),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .linvel(to_vector(def.linear_velocity))
                .angvel(def.angular_velocity)
                .additional_mass(UNIT_MASS)
                .ccd_enabled(true),
        };
        let mut builder = builder
            .translation(to_vector(def.position))
            .rotation(def.angle)
            .gravity_scale(def.gravity_scale)
            .user_data(u128::from(def.user_data));
        if def.fixed_rotation {
            builder = builder.lock_rotations();
        }

        let handle = self.bodies.insert(builder);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        Ok(handle)
    }

    /// Attach a fixture and recompute the body's mass.
    ///
    /// # Errors
    ///
    /// [`BackendError::WorldLocked`] during a step,
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn create_fixture(
        &mut self,
        body: BodyHandle,
        def: &FixtureDef,
    ) -> Result<FixtureHandle, BackendError> {
        self.ensure_unlocked()?;
        let user_data = self.body_ref(body)?.user_data();
        let fixture = Fixture::new(body, def);
        let collider = fixture.collider(user_data);
        let handle = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        self.fixtures.insert(handle, fixture);
        self.reset_mass(body);
        Ok(handle)
    }

    /// Remove a body with its fixtures.
    ///
    /// Returns the pairs that were touching the body. They end here rather
    /// than in a later step, so the caller decides who hears about them.
    ///
    /// # Errors
    ///
    /// [`BackendError::WorldLocked`] during a step,
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<Vec<ContactEvent>, BackendError> {
        self.ensure_unlocked()?;
        let fixtures = self.body_ref(handle)?.fixtures().to_vec();
        let ended = self.touching(&fixtures);

        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        for fixture in &fixtures {
            self.fixtures.remove(fixture);
        }
        trace!(?handle, ended = ended.len(), "destroyed body");
        Ok(ended)
    }

    fn touching(&self, fixtures: &[FixtureHandle]) -> Vec<ContactEvent> {
        let mut ended = Vec::new();
        for &fixture in fixtures {
            let solid = self
                .narrow_phase
                .contact_pairs_with(fixture)
                .filter(|pair| pair.has_any_active_contact)
                .map(|pair| (pair.collider1, pair.collider2));
            let sensed = self
                .narrow_phase
                .intersection_pairs_with(fixture)
                .filter(|(_, _, intersecting)| *intersecting)
                .map(|(a, b, _)| (a, b));
            ended.extend(
                solid
                    .chain(sensed)
                    .filter_map(|(a, b)| contact_event(&self.bodies, &self.colliders, a, b)),
            );
        }
        ended
    }

    /// Teleport a body.
    ///
    /// # Errors
    ///
    /// [`BackendError::WorldLocked`] during a step,
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn set_transform(
        &mut self,
        handle: BodyHandle,
        position: Vec2,
        angle: f32,
    ) -> Result<(), BackendError> {
        self.ensure_unlocked()?;
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or(BackendError::BodyNotFound(handle))?;
        body.set_position(Isometry::new(to_vector(position), angle), true);
        Ok(())
    }

    fn ensure_unlocked(&self) -> Result<(), BackendError> {
        if self.locked {
            Err(BackendError::WorldLocked)
        } else {
            Ok(())
        }
    }

    fn body_ref(&self, handle: BodyHandle) -> Result<Body<'_>, BackendError> {
        self.body(handle).ok_or(BackendError::BodyNotFound(handle))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, BackendError> {
        self.bodies
            .get_mut(handle)
            .ok_or(BackendError::BodyNotFound(handle))
    }

    /// Mass comes from fixture densities; a dynamic body whose fixtures add
    /// up to nothing keeps [`UNIT_MASS`].
    fn reset_mass(&mut self, handle: BodyHandle) {
        let Some(body) = self.bodies.get_mut(handle) else {
            return;
        };
        if !body.is_dynamic() {
            return;
        }
        body.set_additional_mass(0.0, true);
        body.recompute_mass_properties_from_colliders(&self.colliders);
        if body.mass() <= 0.0 {
            body.set_additional_mass(UNIT_MASS, true);
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
    }

    // -- Velocities and forces --

    /// # Errors
    ///
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn set_linear_velocity(
        &mut self,
        handle: BodyHandle,
        velocity: Vec2,
    ) -> Result<(), BackendError> {
        let body = self.body_mut(handle)?;
        if !body.is_fixed() {
            body.set_linvel(to_vector(velocity), true);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn set_angular_velocity(
        &mut self,
        handle: BodyHandle,
        velocity: f32,
    ) -> Result<(), BackendError> {
        let body = self.body_mut(handle)?;
        if !body.is_fixed() && !body.locked_axes().contains(LockedAxes::ROTATION_LOCKED) {
            body.set_angvel(velocity, true);
        }
        Ok(())
    }

    /// Accumulate a force at a world point; it acts on every step until
    /// [`World2D::clear_forces`].
    ///
    /// # Errors
    ///
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn apply_force(
        &mut self,
        handle: BodyHandle,
        force: Vec2,
        point: Vec2,
    ) -> Result<(), BackendError> {
        self.body_mut(handle)?
            .add_force_at_point(to_vector(force), to_point(point), true);
        Ok(())
    }

    /// # Errors
    ///
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn apply_force_to_center(
        &mut self,
        handle: BodyHandle,
        force: Vec2,
    ) -> Result<(), BackendError> {
        self.body_mut(handle)?.add_force(to_vector(force), true);
        Ok(())
    }

    /// Change velocity immediately by `impulse / mass` at a world point.
    ///
    /// # Errors
    ///
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn apply_linear_impulse(
        &mut self,
        handle: BodyHandle,
        impulse: Vec2,
        point: Vec2,
    ) -> Result<(), BackendError> {
        self.body_mut(handle)?
            .apply_impulse_at_point(to_vector(impulse), to_point(point), true);
        Ok(())
    }

    /// # Errors
    ///
    /// [`BackendError::BodyNotFound`] for a stale handle.
    pub fn apply_linear_impulse_to_center(
        &mut self,
        handle: BodyHandle,
        impulse: Vec2,
    ) -> Result<(), BackendError> {
        self.body_mut(handle)?.apply_impulse(to_vector(impulse), true);
        Ok(())
    }

    /// Zero the accumulated force and torque on every body.
    pub fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }

    // -- Simulation --

    /// Advance the world by `dt` seconds.
    ///
    /// The world stays locked from the start of the pipeline step until the
    /// listener has seen every touching event the step produced.
    pub fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: &mut dyn ContactListener,
    ) {
        self.locked = true;

        self.params.dt = dt;
        self.params.num_solver_iterations = usize::try_from(velocity_iterations)
            .ok()
            .and_then(NonZeroUsize::new)
            .unwrap_or(NonZeroUsize::MIN);
        self.params.num_internal_stabilization_iterations =
            usize::try_from(position_iterations).unwrap_or(1);

        let hooks = MaterialMixing {
            fixtures: &self.fixtures,
        };
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &hooks,
            &self.events,
        );

        for touch in self.events.take() {
            trace!(?touch, "touch");
            match touch {
                Touch::Begin(contact) => listener.begin_contact(self, &contact),
                Touch::End(contact) => listener.end_contact(self, &contact),
            }
        }

        self.locked = false;
    }
}

impl Default for World2D {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -9.8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Shape;

    const DT: f32 = 1.0 / 60.0;

    #[derive(Default)]
    struct Recorder {
        begins: Vec<(u64, u64)>,
        ends: Vec<(u64, u64)>,
        locked: Vec<bool>,
    }

    /// Order-independent pair of user data values.
    fn pair(contact: &ContactEvent) -> (u64, u64) {
        let (a, b) = (contact.fixture_a.user_data, contact.fixture_b.user_data);
        (a.min(b), a.max(b))
    }

    impl ContactListener for Recorder {
        fn begin_contact(&mut self, world: &World2D, contact: &ContactEvent) {
            self.locked.push(world.is_locked());
            self.begins.push(pair(contact));
        }
        fn end_contact(&mut self, world: &World2D, contact: &ContactEvent) {
            self.locked.push(world.is_locked());
            self.ends.push(pair(contact));
        }
    }

    fn body(world: &mut World2D, kind: BodyKind, position: Vec2, user_data: u64) -> BodyHandle {
        world
            .create_body(&BodyDef {
                kind,
                position,
                user_data,
                ..BodyDef::default()
            })
            .unwrap()
    }

    fn ground(world: &mut World2D) -> BodyHandle {
        let handle = body(world, BodyKind::Static, Vec2::ZERO, 1);
        world
            .create_fixture(
                handle,
                &FixtureDef::new(Shape::Box {
                    half_extents: Vec2::new(10.0, 0.5),
                    offset: Vec2::ZERO,
                }),
            )
            .unwrap();
        handle
    }

    fn ball(world: &mut World2D, position: Vec2, user_data: u64, sensor: bool) -> BodyHandle {
        let handle = body(world, BodyKind::Dynamic, position, user_data);
        let mut def = FixtureDef::new(Shape::Circle {
            radius: 0.5,
            offset: Vec2::ZERO,
        });
        def.is_sensor = sensor;
        world.create_fixture(handle, &def).unwrap();
        handle
    }

    #[test]
    fn test_gravity_integrates_dynamic_bodies_only() {
        let mut world = World2D::default();
        let falling = ball(&mut world, Vec2::new(0.0, 10.0), 2, false);
        let fixed = body(&mut world, BodyKind::Static, Vec2::new(5.0, 10.0), 3);
        let floating = world
            .create_body(&BodyDef {
                kind: BodyKind::Dynamic,
                gravity_scale: 0.0,
                position: Vec2::new(-5.0, 10.0),
                ..BodyDef::default()
            })
            .unwrap();

        world.step(DT, 6, 2, &mut ());

        let v = world.body(falling).unwrap().linear_velocity();
        assert!((v.y - (-9.8 * DT)).abs() < 1e-4, "vy = {}", v.y);
        assert!(world.body(falling).unwrap().position().y < 10.0);
        assert_eq!(world.body(fixed).unwrap().position(), Vec2::new(5.0, 10.0));
        assert_eq!(world.body(floating).unwrap().linear_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_kinematic_body_moves_with_velocity() {
        let mut world = World2D::default();
        let platform = body(&mut world, BodyKind::Kinematic, Vec2::ZERO, 1);
        world.set_linear_velocity(platform, Vec2::new(6.0, 0.0)).unwrap();
        world.step(0.5, 6, 2, &mut ());
        let b = world.body(platform).unwrap();
        assert!(b.position().abs_diff_eq(Vec2::new(3.0, 0.0), 1e-4));
        assert!(b.linear_velocity().abs_diff_eq(Vec2::new(6.0, 0.0), 1e-6));
        assert_eq!(b.kind(), BodyKind::Kinematic);
    }

    #[test]
    fn test_mass_from_density() {
        let mut world = World2D::default();
        let handle = body(&mut world, BodyKind::Dynamic, Vec2::ZERO, 1);
        assert!((world.body(handle).unwrap().mass() - 1.0).abs() < 1e-6);

        let mut def = FixtureDef::new(Shape::Box {
            half_extents: Vec2::new(1.0, 0.5),
            offset: Vec2::ZERO,
        });
        def.density = 3.0;
        let fixture = world.create_fixture(handle, &def).unwrap();
        assert!((world.body(handle).unwrap().mass() - 6.0).abs() < 1e-4);
        assert_eq!(world.body(handle).unwrap().fixtures(), &[fixture]);

        // A weightless fixture leaves the unit mass in place.
        let weightless = body(&mut world, BodyKind::Dynamic, Vec2::ZERO, 2);
        def.density = 0.0;
        world.create_fixture(weightless, &def).unwrap();
        assert!((world.body(weightless).unwrap().mass() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ball_comes_to_rest_on_ground() {
        let mut world = World2D::default();
        ground(&mut world);
        let b = ball(&mut world, Vec2::new(0.0, 2.0), 2, false);

        for _ in 0..240 {
            world.step(DT, 6, 2, &mut ());
        }
        let body = world.body(b).unwrap();
        // Resting on the top face at y = 0.5 with radius 0.5.
        assert!((body.position().y - 1.0).abs() < 0.05, "{}", body.position().y);
        assert!(body.linear_velocity().y.abs() < 0.2);
    }

    #[test]
    fn test_fast_small_ball_does_not_tunnel() {
        let mut world = World2D::default();
        let floor = body(&mut world, BodyKind::Static, Vec2::ZERO, 1);
        world
            .create_fixture(
                floor,
                &FixtureDef::new(Shape::Box {
                    half_extents: Vec2::new(5.0, 0.1),
                    offset: Vec2::ZERO,
                }),
            )
            .unwrap();
        let b = body(&mut world, BodyKind::Dynamic, Vec2::new(0.0, 2.4), 2);
        world
            .create_fixture(
                b,
                &FixtureDef::new(Shape::Circle {
                    radius: 0.25,
                    offset: Vec2::ZERO,
                }),
            )
            .unwrap();
        world.set_linear_velocity(b, Vec2::new(0.0, -60.0)).unwrap();

        for _ in 0..10 {
            world.step(DT, 6, 2, &mut ());
        }
        let y = world.body(b).unwrap().position().y;
        assert!(y > 0.0, "ball passed through the floor: y = {y}");
    }

    #[test]
    fn test_begin_and_end_events() {
        let mut world = World2D::new(Vec2::ZERO);
        ground(&mut world);
        let b = ball(&mut world, Vec2::new(0.0, 0.9), 2, false);
        let mut recorder = Recorder::default();

        world.step(DT, 6, 2, &mut recorder);
        assert_eq!(recorder.begins, vec![(1, 2)]);
        assert_eq!(world.contact_count(), 1);

        // Still touching: no repeated begin.
        world.step(DT, 6, 2, &mut recorder);
        assert_eq!(recorder.begins.len(), 1);

        world.set_transform(b, Vec2::new(0.0, 5.0), 0.0).unwrap();
        world.step(DT, 6, 2, &mut recorder);
        assert_eq!(recorder.ends, vec![(1, 2)]);
        assert_eq!(world.contact_count(), 0);

        // Every callback ran under the lock, which is released afterwards.
        assert!(recorder.locked.iter().all(|locked| *locked));
        assert!(!world.is_locked());
    }

    #[test]
    fn test_sensor_reports_without_response() {
        let mut world = World2D::new(Vec2::ZERO);
        ground(&mut world);
        let b = ball(&mut world, Vec2::new(0.0, 0.9), 2, true);
        world.set_linear_velocity(b, Vec2::new(0.0, -3.0)).unwrap();
        let mut recorder = Recorder::default();

        world.step(DT, 6, 2, &mut recorder);

        assert_eq!(recorder.begins, vec![(1, 2)]);
        let body = world.body(b).unwrap();
        assert!(body.linear_velocity().abs_diff_eq(Vec2::new(0.0, -3.0), 1e-5));
        assert!(body.position().y < 0.9);
    }

    #[test]
    fn test_static_pairs_do_not_collide() {
        let mut world = World2D::new(Vec2::ZERO);
        ground(&mut world);
        let other = body(&mut world, BodyKind::Kinematic, Vec2::ZERO, 5);
        world
            .create_fixture(
                other,
                &FixtureDef::new(Shape::Circle {
                    radius: 1.0,
                    offset: Vec2::ZERO,
                }),
            )
            .unwrap();
        let mut recorder = Recorder::default();
        world.step(DT, 6, 2, &mut recorder);
        assert!(recorder.begins.is_empty());
        assert_eq!(world.contact_count(), 0);
    }

    #[test]
    fn test_restitution_threshold() {
        for (speed, bounces) in [(0.5, false), (8.0, true)] {
            let mut world = World2D::new(Vec2::ZERO);
            ground(&mut world);
            let b = body(&mut world, BodyKind::Dynamic, Vec2::new(0.0, 0.99), 2);
            let mut def = FixtureDef::new(Shape::Circle {
                radius: 0.5,
                offset: Vec2::ZERO,
            });
            def.restitution = 1.0;
            def.restitution_threshold = 1.0;
            world.create_fixture(b, &def).unwrap();
            world.set_linear_velocity(b, Vec2::new(0.0, -speed)).unwrap();

            for _ in 0..10 {
                world.step(DT, 6, 2, &mut ());
            }
            let body = world.body(b).unwrap();
            let (y, vy) = (body.position().y, body.linear_velocity().y);
            if bounces {
                assert!(vy > 0.5 * speed && y > 1.2, "y = {y}, vy = {vy}");
            } else {
                assert!(vy.abs() < 0.3 && y < 1.1, "y = {y}, vy = {vy}");
            }
        }
    }

    #[test]
    fn test_locked_world_rejects_structural_changes() {
        let mut world = World2D::default();
        let b = ball(&mut world, Vec2::ZERO, 1, false);
        world.set_locked(true);

        assert!(matches!(world.create_body(&BodyDef::default()), Err(BackendError::WorldLocked)));
        assert!(matches!(world.destroy_body(b), Err(BackendError::WorldLocked)));
        assert!(matches!(
            world.set_transform(b, Vec2::ONE, 0.0),
            Err(BackendError::WorldLocked)
        ));
        // Velocity changes are not structural.
        world.set_linear_velocity(b, Vec2::X).unwrap();

        world.set_locked(false);
        world.destroy_body(b).unwrap();
        assert!(world.body(b).is_none());
        assert!(matches!(world.destroy_body(b), Err(BackendError::BodyNotFound(_))));
    }

    #[test]
    fn test_destroy_body_returns_touching_pairs() {
        let mut world = World2D::new(Vec2::ZERO);
        ground(&mut world);
        let b = ball(&mut world, Vec2::new(0.0, 0.9), 2, false);
        let zone = ball(&mut world, Vec2::new(0.3, 0.9), 3, true);
        let mut recorder = Recorder::default();
        world.step(DT, 6, 2, &mut recorder);
        assert_eq!(world.contact_count(), 3);

        let mut ended: Vec<_> = world.destroy_body(b).unwrap().iter().map(pair).collect();
        ended.sort_unstable();
        assert_eq!(ended, vec![(1, 2), (2, 3)]);
        assert_eq!(world.fixture_count(), 2);
        assert!(world.body(zone).is_some());

        // The removal is not reported a second time by the next step.
        world.step(DT, 6, 2, &mut recorder);
        assert!(!recorder.ends.contains(&(1, 2)));
        assert!(!recorder.ends.contains(&(2, 3)));
    }

    #[test]
    fn test_forces_accumulate_until_cleared() {
        let mut world = World2D::new(Vec2::ZERO);
        let b = body(&mut world, BodyKind::Dynamic, Vec2::ZERO, 1);
        world.apply_force_to_center(b, Vec2::new(2.0, 0.0)).unwrap();
        assert_eq!(world.body(b).unwrap().force(), Vec2::new(2.0, 0.0));

        world.step(0.5, 6, 2, &mut ());
        world.step(0.5, 6, 2, &mut ());
        assert!((world.body(b).unwrap().linear_velocity().x - 2.0).abs() < 1e-4);

        world.clear_forces();
        assert_eq!(world.body(b).unwrap().force(), Vec2::ZERO);
        world.step(0.5, 6, 2, &mut ());
        assert!((world.body(b).unwrap().linear_velocity().x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_impulse_off_centre_spins() {
        let mut world = World2D::new(Vec2::ZERO);
        let b = ball(&mut world, Vec2::ZERO, 1, false);
        world
            .apply_linear_impulse(b, Vec2::new(0.0, 1.0), Vec2::new(0.5, 0.0))
            .unwrap();
        let body = world.body(b).unwrap();
        assert!(body.linear_velocity().y > 0.0);
        assert!(body.angular_velocity() > 0.0);

        let fixed = world
            .create_body(&BodyDef {
                kind: BodyKind::Dynamic,
                fixed_rotation: true,
                ..BodyDef::default()
            })
            .unwrap();
        world
            .create_fixture(
                fixed,
                &FixtureDef::new(Shape::Circle {
                    radius: 0.5,
                    offset: Vec2::ZERO,
                }),
            )
            .unwrap();
        world
            .apply_linear_impulse(fixed, Vec2::Y, Vec2::new(0.5, 0.0))
            .unwrap();
        assert_eq!(world.body(fixed).unwrap().angular_velocity(), 0.0);
    }
}
