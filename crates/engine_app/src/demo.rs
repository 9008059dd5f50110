//! The headless demo scene.

use anyhow::{Context, Result};
use engine_component::Entity;
use engine_math::{Transform, Vec2};
use engine_physics2d::{
    BodyType, BoxCollider2DComponent, CircleCollider2DComponent, ColliderMaterial,
    RigidBody2DComponent, Smoothing,
};
use engine_scene::{Scene, ScriptComponent};

use crate::runtime::SceneRuntime;
use crate::scripts::FRAGILE_TAG;

const PLATFORM_VELOCITY: Vec2 = Vec2::new(0.0, 0.25);

fn spawn(scene: &mut Scene, name: &str, position: Vec2, angle: f32) -> Result<Entity> {
    let entity = scene.create_entity(name);
    *scene
        .get_mut::<Transform>(entity)
        .with_context(|| format!("{name} has no transform"))? =
        Transform::from_xy_angle(position, angle);
    Ok(entity)
}

/// Ground, two stacked crates, a bouncing ball, a fragile ball, a sensor
/// zone with a visitor falling into it and a kinematic platform.
///
/// # Errors
///
/// Fails only if the scene rejects a component.
pub fn build_scene() -> Result<Scene> {
    let mut scene = Scene::new("demo");

    let ground = spawn(&mut scene, "ground", Vec2::new(0.0, -1.0), 0.0)?;
    scene.add(ground, RigidBody2DComponent::new(BodyType::Static))?;
    scene.add(ground, BoxCollider2DComponent::new(Vec2::new(12.0, 0.5)))?;
    scene.add(ground, ScriptComponent::new("Ground"))?;

    for (name, height, angle) in [("crate_low", 2.0, 0.0), ("crate_high", 4.0, 0.3)] {
        let entity = spawn(&mut scene, name, Vec2::new(-3.0, height), angle)?;
        scene.add(
            entity,
            RigidBody2DComponent::new(BodyType::Dynamic).with_smoothing(Smoothing::Interpolation),
        )?;
        scene.add(entity, BoxCollider2DComponent::default())?;
    }
    let crate_low = scene
        .find_entity_by_name("crate_low")
        .context("crate_low was just created")?;
    let label = scene.create_entity("label");
    scene.add_child(crate_low, label)?;

    let ball = spawn(&mut scene, "ball", Vec2::new(2.0, 3.0), 0.0)?;
    scene.add(
        ball,
        RigidBody2DComponent::new(BodyType::Dynamic).with_smoothing(Smoothing::Extrapolation),
    )?;
    scene.add(
        ball,
        CircleCollider2DComponent::new(0.5).with_material(ColliderMaterial {
            restitution: 0.6,
            ..ColliderMaterial::default()
        }),
    )?;

    let fragile = spawn(&mut scene, FRAGILE_TAG, Vec2::new(0.0, 1.0), 0.0)?;
    scene.add(fragile, RigidBody2DComponent::new(BodyType::Dynamic))?;
    scene.add(fragile, CircleCollider2DComponent::new(0.5))?;
    scene.add(fragile, ScriptComponent::new("Fragile"))?;

    let zone = spawn(&mut scene, "zone", Vec2::new(4.0, 0.0), 0.0)?;
    scene.add(zone, RigidBody2DComponent::new(BodyType::Static))?;
    scene.add(zone, BoxCollider2DComponent::new(Vec2::ONE).sensor())?;

    let visitor = spawn(&mut scene, "visitor", Vec2::new(4.0, 3.0), 0.0)?;
    scene.add(visitor, RigidBody2DComponent::new(BodyType::Dynamic))?;
    scene.add(visitor, CircleCollider2DComponent::new(0.5))?;
    scene.add(visitor, ScriptComponent::new("Visitor"))?;

    let platform = spawn(&mut scene, "platform", Vec2::new(-7.0, 0.5), 0.0)?;
    scene.add(platform, RigidBody2DComponent::new(BodyType::Kinematic))?;
    scene.add(platform, BoxCollider2DComponent::new(Vec2::new(1.0, 0.1)))?;

    Ok(scene)
}

/// Start the platform moving. Call after the runtime has started.
///
/// # Errors
///
/// Fails if the runtime is stopped or the platform has no body.
pub fn set_in_motion(runtime: &mut SceneRuntime) -> Result<()> {
    let (physics, scene) = runtime.physics_mut().context("runtime is not running")?;
    let platform = scene
        .find_entity_by_name("platform")
        .context("demo scene has no platform")?;
    physics.set_linear_velocity(scene, platform, PLATFORM_VELOCITY)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use engine_physics2d::PhysicsConfig;

    use super::*;
    use crate::scripts::LoggingScripts;

    const DT: f64 = 1.0 / 60.0;

    fn started() -> SceneRuntime {
        let mut runtime = SceneRuntime::new(build_scene().unwrap(), PhysicsConfig::default());
        runtime.start().unwrap();
        set_in_motion(&mut runtime).unwrap();
        runtime
    }

    #[test]
    fn test_scene_builds_one_body_per_rigidbody() {
        let runtime = started();
        let physics = runtime.physics().unwrap();
        assert_eq!(physics.world().body_count(), 8);
        assert_eq!(physics.world().fixture_count(), 8);

        let label = runtime.scene().find_entity_by_name("label").unwrap();
        let crate_low = runtime.scene().find_entity_by_name("crate_low").unwrap();
        assert_eq!(runtime.scene().parent(label), crate_low);
    }

    #[test]
    fn test_fragile_breaks_and_visitor_triggers() {
        let mut runtime = started();
        let mut scripts = LoggingScripts::default();
        runtime.run(&mut scripts, std::iter::repeat_n(DT, 120));

        let scene = runtime.scene();
        let fragile = scene.find_entity_by_name(FRAGILE_TAG).unwrap();
        assert_eq!(scripts.broken, vec![fragile]);
        assert!(scene.exists(fragile));
        let rb = scene.get::<RigidBody2DComponent>(fragile).unwrap();
        assert!(rb.runtime_body.is_none());
        assert_eq!(runtime.physics().unwrap().world().body_count(), 7);

        assert!(scripts.triggers_entered >= 1);
        assert!(scripts.collisions_entered >= 2);
    }

    #[test]
    fn test_platform_rises() {
        let mut runtime = started();
        runtime.run(&mut (), std::iter::repeat_n(DT, 60));
        let platform = runtime.scene().find_entity_by_name("platform").unwrap();
        let y = runtime.scene().get::<Transform>(platform).unwrap().position.y;
        assert!(y > 0.6 && y < 0.8, "platform at {y}");
    }

    #[test]
    fn test_set_in_motion_needs_running_runtime() {
        let mut runtime = SceneRuntime::new(build_scene().unwrap(), PhysicsConfig::default());
        assert!(set_in_motion(&mut runtime).is_err());
    }
}
