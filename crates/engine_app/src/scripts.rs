//! A [`ScriptBridge`] that logs contact callbacks.

use engine_component::Entity;
use engine_physics2d::{DeferredCommands, ScriptBridge};
use engine_scene::{Scene, TagComponent};
use tracing::info;

/// Entities with this tag lose their body on their first collision.
pub const FRAGILE_TAG: &str = "fragile";

/// Logs every callback and counts them.
#[derive(Debug, Default)]
pub struct LoggingScripts {
    pub collisions_entered: u32,
    pub collisions_exited: u32,
    pub triggers_entered: u32,
    pub triggers_exited: u32,
    /// Entities whose body was destroyed from a callback.
    pub broken: Vec<Entity>,
}

fn tag(scene: &Scene, entity: Entity) -> &str {
    scene
        .get::<TagComponent>(entity)
        .map_or("?", |tag| tag.tag.as_str())
}

impl ScriptBridge for LoggingScripts {
    fn on_collision_enter_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        self.collisions_entered += 1;
        let name = tag(commands.scene(), entity);
        info!(%entity, name, other = tag(commands.scene(), other), "collision enter");

        if name == FRAGILE_TAG && commands.destroy_body(entity) {
            info!(%entity, "fragile body breaks");
            self.broken.push(entity);
        }
    }

    fn on_collision_exit_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        self.collisions_exited += 1;
        let scene = commands.scene();
        info!(%entity, name = tag(scene, entity), other = tag(scene, other), "collision exit");
    }

    fn on_trigger_enter_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        self.triggers_entered += 1;
        let scene = commands.scene();
        info!(%entity, name = tag(scene, entity), sensor = tag(scene, other), "trigger enter");
    }

    fn on_trigger_exit_2d(
        &mut self,
        entity: Entity,
        other: Entity,
        commands: &mut DeferredCommands<'_>,
    ) {
        self.triggers_exited += 1;
        let scene = commands.scene();
        info!(%entity, name = tag(scene, entity), sensor = tag(scene, other), "trigger exit");
    }
}
