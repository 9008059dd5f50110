//! Scene runtime: play, stop, pause and frame stepping around one
//! [`PhysicsContext`].

use anyhow::{Context, Result};
use engine_component::Entity;
use engine_physics2d::{
    PhysicsConfig, PhysicsContext, PhysicsError, RigidBody2DComponent, ScriptBridge, StepPlan,
};
use engine_scene::Scene;
use tracing::{debug, info};

/// Owns a scene and, while playing, its physics simulation.
#[derive(Debug)]
pub struct SceneRuntime {
    /// The simulated scene.
    scene: Scene,
    /// Settings used for the next [`SceneRuntime::start`].
    config: PhysicsConfig,
    /// Present between start and stop.
    physics: Option<PhysicsContext>,
    /// Frames simulated since the last start.
    frame: u64,
    /// While paused, frames only advance through [`SceneRuntime::step`].
    paused: bool,
    /// Frames still allowed to run while paused.
    step_frames: u32,
}

impl SceneRuntime {
    /// Create a stopped runtime.
    #[must_use]
    pub fn new(scene: Scene, config: PhysicsConfig) -> Self {
        Self {
            scene,
            config,
            physics: None,
            frame: 0,
            paused: false,
            step_frames: 0,
        }
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn physics(&self) -> Option<&PhysicsContext> {
        self.physics.as_ref()
    }

    /// The running simulation together with its scene, for driving bodies
    /// between frames.
    pub fn physics_mut(&mut self) -> Option<(&mut PhysicsContext, &Scene)> {
        self.physics.as_mut().map(|physics| (physics, &self.scene))
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.physics.is_some()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Build the physics world from the scene's current components.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::AlreadyRunning`] if started twice, or any failure
    /// while building bodies.
    pub fn start(&mut self) -> Result<(), PhysicsError> {
        if self.physics.is_some() {
            return Err(PhysicsError::AlreadyRunning);
        }
        self.physics = Some(PhysicsContext::start(&mut self.scene, self.config.clone())?);
        self.frame = 0;
        info!(scene = %self.scene.name(), "runtime started");
        Ok(())
    }

    /// Tear down the physics world. Transforms keep their last values.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::NotRunning`] if the runtime is stopped.
    pub fn stop(&mut self) -> Result<(), PhysicsError> {
        let physics = self.physics.take().ok_or(PhysicsError::NotRunning)?;
        physics.stop(&mut self.scene);
        self.paused = false;
        self.step_frames = 0;
        info!(scene = %self.scene.name(), frames = self.frame, "runtime stopped");
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Let `frames` more frames run while paused.
    pub fn step(&mut self, frames: u32) {
        self.step_frames = self.step_frames.saturating_add(frames);
    }

    /// Advance one frame. Returns `None` when stopped or paused.
    pub fn update(&mut self, scripts: &mut dyn ScriptBridge, frame_dt: f64) -> Option<StepPlan> {
        let physics = self.physics.as_mut()?;
        if self.paused {
            if self.step_frames == 0 {
                return None;
            }
            self.step_frames -= 1;
        }

        self.frame += 1;
        let plan = physics.update(&mut self.scene, scripts, frame_dt);
        debug!(frame = self.frame, steps = plan.steps, "frame");
        Some(plan)
    }

    /// Run one update per frame time.
    pub fn run(
        &mut self,
        scripts: &mut dyn ScriptBridge,
        frame_times: impl IntoIterator<Item = f64>,
    ) {
        let (mut frames, mut steps, mut dropped) = (0u64, 0u64, 0u64);
        for frame_dt in frame_times {
            if let Some(plan) = self.update(scripts, frame_dt) {
                frames += 1;
                steps += u64::from(plan.steps);
                dropped += plan.dropped;
            }
        }
        info!(frames, steps, dropped, "run complete");
    }

    /// Destroy an entity and its subtree, detaching physics bodies first.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let physics = &mut self.physics;
        self.scene.destroy_entity_with(entity, |scene, destroyed| {
            if let Some(physics) = physics.as_mut() {
                physics.on_entity_destroyed(scene, destroyed);
            }
        })
    }

    /// Duplicate an entity and its subtree. While running, every copied rigid
    /// body gets a body of its own.
    ///
    /// # Errors
    ///
    /// Fails if the entity does not exist or a body cannot be built.
    pub fn duplicate_entity(&mut self, entity: Entity) -> Result<Entity> {
        let copy = self
            .scene
            .duplicate_entity(entity)
            .with_context(|| format!("duplicating {entity}"))?;

        if let Some(physics) = self.physics.as_mut() {
            let mut pending = vec![copy];
            while let Some(current) = pending.pop() {
                pending.extend(self.scene.children(current));
                if self.scene.has::<RigidBody2DComponent>(current) {
                    physics
                        .attach_entity(&mut self.scene, current)
                        .with_context(|| format!("attaching body to {current}"))?;
                }
            }
        }
        Ok(copy)
    }
}

/// Frame times around `frame_dt`, varied by up to `jitter` of it.
///
/// The variation is a fixed pattern so runs are reproducible.
pub fn jittered_frames(frame_dt: f64, jitter: f64, count: u64) -> impl Iterator<Item = f64> {
    let jitter = jitter.clamp(0.0, 1.0);
    (0..count).map(move |i| {
        #[allow(clippy::cast_precision_loss)]
        let phase = i as f64 * 1.7;
        (frame_dt * (1.0 + jitter * phase.sin())).max(0.0)
    })
}
