//! # engine_app
//!
//! Runs the demo scene on a fixed-timestep loop.
//!
//! ## Startup Sequence
//!
//! 1. Load [`AppConfig`](config::AppConfig) from `$ENGINE_CONFIG` (defaults otherwise).
//! 2. Build the world, spawn the demo entities, and register its systems.
//! 3. Enter the tick loop; each tick is one `World::update`.
//! 4. On exit, log the world and frame statistics.

mod config;
mod render;
mod scene;
mod tick;

use anyhow::Result;
use engine_world::World;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use tick::TickLoop;

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let config = AppConfig::load()?;
    info!(
        tick_rate = config.tick.tick_rate,
        max_ticks = config.tick.max_ticks,
        query_strategy = ?config.world.query_strategy,
        "engine starting"
    );

    let mut world = World::with_config(config.world.clone());
    scene::populate(&mut world, &config.demo)?;
    let frame_stats = scene::install(&mut world, &config.demo)?;

    let mut tick_loop = TickLoop::new(config.tick.clone(), world);
    tick_loop.run()?;

    info!(
        world = %serde_json::to_string(&tick_loop.world().stats())?,
        frames = %serde_json::to_string(&*frame_stats.borrow())?,
        "engine shut down"
    );
    Ok(())
}
