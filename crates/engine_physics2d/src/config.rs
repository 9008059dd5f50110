//! Simulation settings.

use glam::Vec2;

/// Fixed-step simulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    /// World gravity in m/s².
    pub gravity: Vec2,
    /// Length of one simulation step in seconds.
    pub fixed_dt: f64,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// Most steps taken for a single frame; surplus time is dropped.
    pub max_steps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.8),
            fixed_dt: 1.0 / 60.0,
            velocity_iterations: 6,
            position_iterations: 2,
            max_steps: 5,
        }
    }
}

impl PhysicsConfig {
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Non-positive or non-finite values keep the current step length.
    #[must_use]
    pub fn with_fixed_dt(mut self, fixed_dt: f64) -> Self {
        if fixed_dt.is_finite() && fixed_dt > 0.0 {
            self.fixed_dt = fixed_dt;
        }
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, velocity: u32, position: u32) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }
}
