//! Routing backend contact events to entity scripts.
//!
//! Events arrive while the world is locked, or right after a body was
//! destroyed. Scripts receive a [`DeferredCommands`] that can only enqueue
//! body mutations, so nothing they do reaches the backend before the caller
//! applies the queue.

use engine_component::Entity;
use engine_scene::{Scene, ScriptComponent};
use glam::Vec2;
use tracing::debug;

use crate::backend::{BodyHandle, ContactEvent, ContactListener, World2D};
use crate::components::RigidBody2DComponent;
use crate::queue::MutationQueue;

/// Script callbacks for contact events. Every method defaults to a no-op.
///
/// `entity` is the receiving side, `other` the entity it touched.
pub trait ScriptBridge {
    fn on_collision_enter_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        let _ = (entity, other, commands);
    }

    fn on_collision_exit_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        let _ = (entity, other, commands);
    }

    fn on_trigger_enter_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        let _ = (entity, other, commands);
    }

    fn on_trigger_exit_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        let _ = (entity, other, commands);
    }
}

/// No scripts attached.
impl ScriptBridge for () {}

/// Body mutations available from inside a contact callback.
pub struct DeferredCommands<'a> {
    scene: &'a Scene,
    world: &'a World2D,
    queue: &'a mut MutationQueue,
}

impl<'a> DeferredCommands<'a> {
    pub(crate) fn new(
        scene: &'a Scene,
        world: &'a World2D,
        queue: &'a mut MutationQueue,
    ) -> Self {
        Self {
            scene,
            world,
            queue,
        }
    }

    /// Read-only view of the scene being simulated.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// The entity's own body. A handle copied along with a duplicated
    /// component belongs to the original entity and is ignored.
    fn body(&self, entity: Entity) -> Option<BodyHandle> {
        self.scene
            .get::<RigidBody2DComponent>(entity)?
            .runtime_body
            .filter(|handle| {
                self.world
                    .body(*handle)
                    .is_some_and(|body| body.user_data() == entity.id())
            })
    }

    /// Destroy the entity's body once the step returns. Returns `false` if
    /// the entity has no body of its own.
    pub fn destroy_body(&mut self, entity: Entity) -> bool {
        let Some(body) = self.body(entity) else {
            return false;
        };
        self.queue.destroy(body);
        true
    }

    /// Teleport the entity's body once the step returns.
    pub fn set_position(&mut self, entity: Entity, position: Vec2) -> bool {
        let Some(body) = self.body(entity) else {
            return false;
        };
        self.queue.set_position(body, position);
        true
    }

    /// Rotate the entity's body once the step returns.
    pub fn set_rotation(&mut self, entity: Entity, angle: f32) -> bool {
        let Some(body) = self.body(entity) else {
            return false;
        };
        self.queue.set_rotation(body, angle);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Enter,
    Exit,
}

/// Backend listener that classifies contacts and calls scripts.
pub struct ContactDispatcher<'a> {
    scene: &'a Scene,
    queue: &'a mut MutationQueue,
    scripts: &'a mut dyn ScriptBridge,
}

impl<'a> ContactDispatcher<'a> {
    pub fn new(
        scene: &'a Scene,
        queue: &'a mut MutationQueue,
        scripts: &'a mut dyn ScriptBridge,
    ) -> Self {
        Self {
            scene,
            queue,
            scripts,
        }
    }

    fn has_hook(&self, entity: Entity) -> bool {
        self.scene.exists(entity) && self.scene.has::<ScriptComponent>(entity)
    }

    fn dispatch(&mut self, world: &World2D, contact: &ContactEvent, phase: Phase) {
        let a = Entity::from_raw(contact.fixture_a.user_data);
        let b = Entity::from_raw(contact.fixture_b.user_data);

        if !self.scene.exists(a) && !self.scene.exists(b) {
            debug!(%a, %b, ?phase, "dropped contact between destroyed entities");
            return;
        }
        if self.queue.is_destroy_pending(contact.fixture_a.body)
            || self.queue.is_destroy_pending(contact.fixture_b.body)
        {
            debug!(%a, %b, ?phase, "dropped contact with a body pending destruction");
            return;
        }

        match (contact.fixture_a.is_sensor, contact.fixture_b.is_sensor) {
            (true, false) => self.trigger(world, phase, b, a),
            (false, true) => self.trigger(world, phase, a, b),
            _ => {
                self.collision(world, phase, a, b);
                self.collision(world, phase, b, a);
            }
        }
    }

    fn trigger(&mut self, world: &World2D, phase: Phase, entity: Entity, sensor: Entity) {
        if !self.has_hook(entity) {
            return;
        }
        let mut commands = DeferredCommands::new(self.scene, world, self.queue);
        match phase {
            Phase::Enter => self.scripts.on_trigger_enter_2d(entity, sensor, &mut commands),
            Phase::Exit => self.scripts.on_trigger_exit_2d(entity, sensor, &mut commands),
        }
    }

    fn collision(&mut self, world: &World2D, phase: Phase, entity: Entity, other: Entity) {
        if !self.has_hook(entity) {
            return;
        }
        let mut commands = DeferredCommands::new(self.scene, world, self.queue);
        match phase {
            Phase::Enter => self.scripts.on_collision_enter_2d(entity, other, &mut commands),
            Phase::Exit => self.scripts.on_collision_exit_2d(entity, other, &mut commands),
        }
    }
}

impl ContactListener for ContactDispatcher<'_> {
    fn begin_contact(&mut self, world: &World2D, contact: &ContactEvent) {
        self.dispatch(world, contact, Phase::Enter);
    }

    fn end_contact(&mut self, world: &World2D, contact: &ContactEvent) {
        self.dispatch(world, contact, Phase::Exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BodyDef, BodyKind, FixtureDef, FixtureInfo, Shape};

    #[derive(Debug, Default)]
    struct Calls(Vec<(&'static str, Entity, Entity)>);

    impl ScriptBridge for Calls {
        fn on_collision_enter_2d(&mut self, e: Entity, o: Entity, _: &mut DeferredCommands<'_>) {
            self.0.push(("collision_enter", e, o));
        }
        fn on_collision_exit_2d(&mut self, e: Entity, o: Entity, _: &mut DeferredCommands<'_>) {
            self.0.push(("collision_exit", e, o));
        }
        fn on_trigger_enter_2d(&mut self, e: Entity, o: Entity, _: &mut DeferredCommands<'_>) {
            self.0.push(("trigger_enter", e, o));
        }
        fn on_trigger_exit_2d(&mut self, e: Entity, o: Entity, _: &mut DeferredCommands<'_>) {
            self.0.push(("trigger_exit", e, o));
        }
    }

    struct Pair {
        scene: Scene,
        world: World2D,
        a: Entity,
        b: Entity,
        body_a: BodyHandle,
        body_b: BodyHandle,
    }

    fn body_for(world: &mut World2D, entity: Entity) -> BodyHandle {
        let body = world
            .create_body(&BodyDef {
                kind: BodyKind::Dynamic,
                user_data: entity.id(),
                ..BodyDef::default()
            })
            .unwrap();
        let shape = Shape::Circle {
            radius: 0.5,
            offset: Vec2::ZERO,
        };
        world.create_fixture(body, &FixtureDef::new(shape)).unwrap();
        body
    }

    fn setup(script_a: bool, script_b: bool) -> Pair {
        let mut scene = Scene::new("contacts");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        if script_a {
            scene.add(a, ScriptComponent::new("A")).unwrap();
        }
        if script_b {
            scene.add(b, ScriptComponent::new("B")).unwrap();
        }
        let mut world = World2D::default();
        let body_a = body_for(&mut world, a);
        let body_b = body_for(&mut world, b);
        Pair {
            scene,
            world,
            a,
            b,
            body_a,
            body_b,
        }
    }

    fn info(world: &World2D, body: BodyHandle, is_sensor: bool) -> FixtureInfo {
        let view = world.body(body).unwrap();
        FixtureInfo {
            fixture: view.fixtures()[0],
            body,
            user_data: view.user_data(),
            is_sensor,
        }
    }

    fn event(f: &Pair, sensor_a: bool, sensor_b: bool) -> ContactEvent {
        ContactEvent {
            fixture_a: info(&f.world, f.body_a, sensor_a),
            fixture_b: info(&f.world, f.body_b, sensor_b),
        }
    }

    fn run(f: &Pair, queue: &mut MutationQueue, contact: &ContactEvent, begin: bool) -> Calls {
        let mut calls = Calls::default();
        let mut dispatcher = ContactDispatcher::new(&f.scene, queue, &mut calls);
        if begin {
            dispatcher.begin_contact(&f.world, contact);
        } else {
            dispatcher.end_contact(&f.world, contact);
        }
        calls
    }

    #[test]
    fn test_solid_pair_notifies_both_sides() {
        let f = setup(true, true);
        let contact = event(&f, false, false);
        let calls = run(&f, &mut MutationQueue::new(), &contact, true);
        assert_eq!(
            calls.0,
            vec![("collision_enter", f.a, f.b), ("collision_enter", f.b, f.a)]
        );
    }

    #[test]
    fn test_sensor_notifies_only_solid_side() {
        let f = setup(true, true);
        let contact = event(&f, true, false);
        let calls = run(&f, &mut MutationQueue::new(), &contact, true);
        assert_eq!(calls.0, vec![("trigger_enter", f.b, f.a)]);

        let contact = event(&f, false, true);
        let calls = run(&f, &mut MutationQueue::new(), &contact, false);
        assert_eq!(calls.0, vec![("trigger_exit", f.a, f.b)]);
    }

    #[test]
    fn test_two_sensors_count_as_collision() {
        let f = setup(true, true);
        let contact = event(&f, true, true);
        let calls = run(&f, &mut MutationQueue::new(), &contact, false);
        assert_eq!(calls.0.len(), 2);
        assert!(calls.0.iter().all(|(kind, _, _)| *kind == "collision_exit"));
    }

    #[test]
    fn test_sides_without_script_are_skipped() {
        let f = setup(false, true);
        let contact = event(&f, false, false);
        let calls = run(&f, &mut MutationQueue::new(), &contact, true);
        assert_eq!(calls.0, vec![("collision_enter", f.b, f.a)]);

        // The solid side has no script: the trigger goes nowhere.
        let f = setup(true, false);
        let contact = event(&f, true, false);
        assert!(run(&f, &mut MutationQueue::new(), &contact, true).0.is_empty());
    }

    #[test]
    fn test_drop_rules() {
        let mut f = setup(true, true);
        let contact = event(&f, false, false);

        let mut queue = MutationQueue::new();
        queue.destroy(f.body_b);
        assert!(run(&f, &mut queue, &contact, true).0.is_empty());

        f.scene.destroy_entity(f.a);
        let calls = run(&f, &mut MutationQueue::new(), &contact, true);
        assert_eq!(calls.0, vec![("collision_enter", f.b, f.a)]);

        f.scene.destroy_entity(f.b);
        assert!(run(&f, &mut MutationQueue::new(), &contact, true).0.is_empty());
    }

    #[test]
    fn test_deferred_commands_only_enqueue() {
        let mut f = setup(false, false);
        let mut rb = RigidBody2DComponent::default();
        rb.runtime_body = Some(f.body_a);
        f.scene.add(f.a, rb).unwrap();

        let mut queue = MutationQueue::new();
        let mut commands = DeferredCommands::new(&f.scene, &f.world, &mut queue);
        assert!(commands.set_position(f.a, Vec2::ONE));
        assert!(commands.destroy_body(f.a));
        assert!(!commands.destroy_body(f.b));

        assert!(queue.is_destroy_pending(f.body_a));
        let batch = queue.drain();
        assert_eq!(batch.positions, vec![(f.body_a, Vec2::ONE)]);
        assert!(f.world.body(f.body_a).is_some());
    }

    #[test]
    fn test_deferred_commands_ignore_copied_handles() {
        let mut f = setup(false, false);
        // `b` carries a handle copied from `a`, as a duplicate would before
        // getting a body of its own.
        let mut rb = RigidBody2DComponent::default();
        rb.runtime_body = Some(f.body_a);
        f.scene.add(f.a, rb.clone()).unwrap();
        f.scene.add(f.b, rb).unwrap();

        let mut queue = MutationQueue::new();
        let mut commands = DeferredCommands::new(&f.scene, &f.world, &mut queue);
        assert!(!commands.destroy_body(f.b));
        assert!(!commands.set_position(f.b, Vec2::ONE));
        assert!(!commands.set_rotation(f.b, 1.0));
        assert!(queue.is_empty());

        let mut commands = DeferredCommands::new(&f.scene, &f.world, &mut queue);
        assert!(commands.set_rotation(f.a, 1.0));
        assert!(!queue.is_empty());
    }
}
