//! Render-side consumer of the ECS.
//!
//! There is no GPU backend here: the render pass walks every archetype that
//! has both a [`Transform`] and a [`Mesh`] column, builds a draw call per row,
//! and folds the result into [`FrameStats`].

use components::{Mesh, Transform};
use engine_component::EcsError;
use engine_world::World;
use glam::Mat4;
use serde::Serialize;

/// One queued draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: u32,
    pub material: u32,
    pub model: Mat4,
}

/// Fill `queue` with one draw call per renderable entity, column by column.
///
/// # Errors
///
/// Propagates storage errors from the column lookups.
pub fn collect_draw_calls(world: &World, queue: &mut Vec<DrawCall>) -> Result<(), EcsError> {
    queue.clear();
    for archetype in world.get_archetypes::<(Transform, Mesh)>() {
        let transforms = world.get_components::<Transform>(archetype)?;
        let meshes = world.get_components::<Mesh>(archetype)?;
        queue.reserve(transforms.len());
        for (transform, mesh) in transforms.iter().zip(meshes) {
            let transform = transform.get::<Transform>()?;
            let mesh = mesh.get::<Mesh>()?;
            queue.push(DrawCall {
                mesh: mesh.mesh,
                material: mesh.material,
                model: transform.to_matrix(),
            });
        }
    }
    Ok(())
}

/// Running totals over rendered frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frames: u64,
    pub last_draw_calls: usize,
    pub total_draw_calls: u64,
    /// Largest distance from the origin of any drawn model last frame.
    pub last_extent: f32,
}

impl FrameStats {
    /// Fold one frame's queue into the totals.
    pub fn record(&mut self, queue: &[DrawCall]) {
        self.frames += 1;
        self.last_draw_calls = queue.len();
        self.total_draw_calls += queue.len() as u64;
        self.last_extent = queue
            .iter()
            .map(|draw| draw.model.w_axis.truncate().length())
            .fold(0.0, f32::max);
    }
}
