//! # engine_math
//!
//! Math types for the scene. Re-exports [`glam`] for linear algebra and
//! defines the [`Transform`] component that every entity carries.

pub mod transform;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Mat2, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use transform::Transform;

/// Linear interpolation between two scalars.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
