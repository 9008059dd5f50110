//! # engine_app: headless scene runner
//!
//! Builds the demo scene, plays it through a [`SceneRuntime`] with jittered
//! frame times and logs where everything ended up.
//!
//! ## Run Sequence
//!
//! 1. Build the scene and start the runtime.
//! 2. Run the first half of the frames, then pause and single-step once.
//! 3. Duplicate a crate while running and play the remaining frames.
//! 4. Log final poses, destroy the visitor and stop.

mod demo;
mod runtime;
mod scripts;

use anyhow::{Context, Result};
use clap::Parser;
use engine_math::Vec3;
use engine_physics2d::PhysicsConfig;
use engine_scene::TagComponent;
use tracing::info;
use tracing_subscriber::EnvFilter;

use runtime::{SceneRuntime, jittered_frames};
use scripts::LoggingScripts;

#[derive(Parser)]
#[command(name = "engine_app", about = "Headless 2D physics scene runner")]
struct Args {
    /// Number of frames to simulate
    #[arg(long, default_value_t = 240)]
    frames: u64,

    /// Nominal frame time in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_dt: f64,

    /// Fixed physics step in seconds, independent of the frame time
    #[arg(long, default_value_t = PhysicsConfig::default().fixed_dt)]
    fixed_dt: f64,

    /// Most fixed steps per frame before time is dropped
    #[arg(long, default_value_t = 5)]
    max_steps: u32,

    /// Frame time variation as a fraction of the frame time
    #[arg(long, default_value_t = 0.5)]
    jitter: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();
    let config = PhysicsConfig::default()
        .with_fixed_dt(args.fixed_dt)
        .with_max_steps(args.max_steps);
    info!(
        frames = args.frames,
        frame_dt = args.frame_dt,
        fixed_dt = config.fixed_dt,
        max_steps = config.max_steps,
        "starting"
    );

    let mut runtime = SceneRuntime::new(demo::build_scene()?, config);
    runtime.start()?;
    demo::set_in_motion(&mut runtime)?;

    let mut scripts = LoggingScripts::default();
    let mut frames = jittered_frames(args.frame_dt, args.jitter, args.frames);

    runtime.run(&mut scripts, frames.by_ref().take(usize::try_from(args.frames / 2)?));

    runtime.set_paused(true);
    runtime.step(1);
    let stepped = runtime.update(&mut scripts, args.frame_dt).is_some();
    let held = runtime.update(&mut scripts, args.frame_dt).is_none();
    info!(paused = runtime.is_paused(), stepped, held, frame = runtime.frame(), "single step");
    runtime.set_paused(false);

    let original = runtime
        .scene()
        .find_entity_by_name("crate_high")
        .context("demo scene has no crate_high")?;
    let copy = runtime.duplicate_entity(original)?;
    let bodies = runtime.physics().map_or(0, |physics| physics.world().body_count());
    info!(%original, %copy, bodies, "duplicated crate");

    runtime.run(&mut scripts, frames);

    let scene = runtime.scene();
    for entity in scene.entities_with::<TagComponent>() {
        let position = scene.world_matrix(entity).transform_point3(Vec3::ZERO);
        let name = scene
            .get::<TagComponent>(entity)
            .map_or("?", |tag| tag.tag.as_str());
        info!(%entity, name, x = position.x, y = position.y, "final pose");
    }
    info!(
        collisions = scripts.collisions_entered,
        separations = scripts.collisions_exited,
        triggers = scripts.triggers_entered,
        trigger_exits = scripts.triggers_exited,
        broken = scripts.broken.len(),
        "contact summary"
    );

    if let Some(visitor) = runtime.scene().find_entity_by_name("visitor") {
        runtime.destroy_entity(visitor);
    }
    runtime.stop()?;
    info!(running = runtime.is_running(), frames = runtime.frame(), "done");
    Ok(())
}
