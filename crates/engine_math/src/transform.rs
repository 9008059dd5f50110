//! Transform component.
//!
//! [`Transform`] holds position, euler rotation, and scale. Values are local
//! to the entity's parent, or world-space for root entities. Physics reads
//! and writes the `x`/`y` position and the `z` rotation.

use engine_component::Component;
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation (euler angles in radians), and per-axis scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position relative to the parent.
    pub position: Vec3,
    /// Euler rotation in radians, applied Z·Y·X.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position and default rotation/scale.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a 2D transform: `position` in the XY plane, `angle` about Z.
    #[must_use]
    pub fn from_xy_angle(position: Vec2, angle: f32) -> Self {
        Self {
            position: position.extend(0.0),
            rotation: Vec3::new(0.0, 0.0, angle),
            ..Self::IDENTITY
        }
    }

    /// The rotation as a unit quaternion.
    #[must_use]
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::ZYX, self.rotation.z, self.rotation.y, self.rotation.x)
    }

    /// Compute the local matrix: translate × rotate × scale, in that order.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation_quat())
            * Mat4::from_scale(self.scale)
    }

    /// The position projected onto the XY plane.
    #[must_use]
    pub fn position_2d(&self) -> Vec2 {
        self.position.truncate()
    }

    /// Overwrite the XY position and Z rotation, keeping everything else.
    pub fn set_pose_2d(&mut self, position: Vec2, angle: f32) {
        self.position.x = position.x;
        self.position.y = position.y;
        self.rotation.z = angle;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "Transform"
    }
}
