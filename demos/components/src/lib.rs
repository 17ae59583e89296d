//! Demo component definitions for the engine ECS.
//!
//! These show how to define components that satisfy the [`Component`] trait
//! requirements: plain `#[repr(C)]` data deriving [`Pod`] and [`Zeroable`],
//! plus a [`Default`] used by `World::new_entity`.

use bytemuck::{Pod, Zeroable};
use engine_component::Component;
use glam::{Mat4, Quat, Vec3};

/// Position, rotation, and uniform scale in 3D space.
///
/// Laid out rotation first so the 16-byte aligned quaternion leaves no
/// padding before the position and scale.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// World-space position.
    pub position: Vec3,
    /// Uniform scale factor.
    pub scale: f32,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        position: Vec3::ZERO,
        scale: 1.0,
    };

    /// Create a transform at `position` with no rotation and unit scale.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Compute the 4×4 model matrix for this transform.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
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

/// A 3D velocity component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// Linear velocity in world units per second.
    pub linear: Vec3,
}

impl Velocity {
    /// Zero velocity.
    pub const ZERO: Self = Self { linear: Vec3::ZERO };

    #[must_use]
    pub fn new(linear: Vec3) -> Self {
        Self { linear }
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Handles to the mesh and material an entity is drawn with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Mesh {
    pub mesh: u32,
    pub material: u32,
}

impl Component for Mesh {
    fn type_name() -> &'static str {
        "Mesh"
    }
}

/// A health component with current and maximum hit points.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Health {
    /// Current hit points.
    pub current: f32,
    /// Maximum hit points.
    pub max: f32,
}

impl Health {
    /// Create a new health component at full HP.
    #[must_use]
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Returns `true` if the entity is alive (HP > 0).
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Apply damage, clamping to zero.
    pub fn damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    /// Heal, clamping to max.
    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::full(100.0)
    }
}

impl Component for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}
