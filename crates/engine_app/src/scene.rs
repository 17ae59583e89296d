//! Demo scene: a field of moving and static meshes.

use std::cell::RefCell;
use std::rc::Rc;

use components::{Health, Mesh, Transform, Velocity};
use engine_component::EcsError;
use engine_world::{SystemContext, World};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::render::{self, DrawCall, FrameStats};

const GRID_WIDTH: usize = 8;
const GRID_SPACING: f32 = 2.0;

/// Size and motion of the demo scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Entities with a velocity.
    pub moving: usize,
    /// Entities that never move.
    pub fixed: usize,
    /// Speed of moving entities, in units per second.
    pub speed: f32,
    /// Hit points fixed entities lose per second. A depleted entity is
    /// restored to full on the next update.
    pub decay: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            moving: 48,
            fixed: 16,
            speed: 1.0,
            decay: 5.0,
        }
    }
}

fn grid_position(i: usize) -> Vec3 {
    Vec3::new((i % GRID_WIDTH) as f32, 0.0, (i / GRID_WIDTH) as f32) * GRID_SPACING
}

fn heading(i: usize) -> Vec3 {
    let angle = i as f32 * 0.7;
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Spawn the demo entities.
///
/// # Errors
///
/// Propagates errors from [`World::spawn`].
pub fn populate(world: &mut World, config: &DemoConfig) -> Result<(), EcsError> {
    for i in 0..config.moving {
        world.spawn((
            Transform::from_position(grid_position(i)),
            Velocity::new(heading(i) * config.speed),
            Mesh {
                mesh: (i % 4) as u32,
                material: 0,
            },
        ))?;
    }
    for i in 0..config.fixed {
        world.spawn((
            Transform::from_position(grid_position(i) + Vec3::Y),
            Mesh {
                mesh: 4,
                material: 1,
            },
            Health::default(),
        ))?;
    }
    info!(
        entities = world.num_entities(),
        archetypes = world.num_archetypes(),
        "populated demo scene"
    );
    Ok(())
}

/// Advance every transform by its velocity.
fn integrate(ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
    let dt = ctx.delta_time;
    for archetype in ctx.archetypes.clone() {
        let velocities = ctx
            .column::<Velocity>(archetype)?
            .as_slice::<Velocity>()?
            .to_vec();
        let transforms = ctx
            .column_mut::<Transform>(archetype)?
            .as_mut_slice::<Transform>()?;
        for (transform, velocity) in transforms.iter_mut().zip(&velocities) {
            transform.position += velocity.linear * dt;
        }
    }
    Ok(())
}

/// Drain health at `decay` per second, refilling entities that ran out.
fn wear(ctx: &mut SystemContext<'_>, decay: f32) -> Result<(), EcsError> {
    let amount = decay * ctx.delta_time;
    for archetype in ctx.archetypes.clone() {
        for health in ctx.column_mut::<Health>(archetype)?.as_mut_slice::<Health>()? {
            if health.is_alive() {
                health.damage(amount);
            } else {
                health.heal(health.max);
            }
        }
    }
    Ok(())
}

fn report(system: &str, result: Result<(), EcsError>) {
    if let Err(err) = result {
        error!(system, error = %err, "system failed");
    }
}

/// Register the scene's systems and return the render statistics sink.
///
/// # Errors
///
/// Propagates errors from [`World::register_system`].
pub fn install(
    world: &mut World,
    config: &DemoConfig,
) -> Result<Rc<RefCell<FrameStats>>, EcsError> {
    let stats = Rc::new(RefCell::new(FrameStats::default()));

    world.register_system::<(Transform, Velocity)>("integrate", |ctx| {
        report("integrate", integrate(ctx));
    })?;

    let decay = config.decay;
    world.register_system::<(Health,)>("wear", move |ctx| {
        report("wear", wear(ctx, decay));
    })?;

    let sink = Rc::clone(&stats);
    let mut queue: Vec<DrawCall> = Vec::new();
    world.register_system::<(Transform, Mesh)>("render", move |ctx| {
        let result = render::collect_draw_calls(&*ctx.world, &mut queue);
        if result.is_ok() {
            sink.borrow_mut().record(&queue);
        }
        report("render", result);
    })?;

    Ok(stats)
}
