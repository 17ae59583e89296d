//! Fixed-timestep frame driver.
//!
//! Each tick advances the frame counter and calls [`World::update`] once
//! with the fixed delta time. [`TickLoop::run`] paces ticks to the configured
//! rate and warns when a tick overruns its budget.

use std::time::{Duration, Instant};

use anyhow::{Result, ensure};
use engine_world::World;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// The wall-clock budget of one tick.
    ///
    /// # Errors
    ///
    /// Fails unless `tick_rate` is finite and positive.
    pub fn tick_duration(&self) -> Result<Duration> {
        ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick_rate must be a positive number, got {}",
            self.tick_rate
        );
        Ok(Duration::from_secs_f64(1.0 / self.tick_rate))
    }
}

/// The frame driver: owns the world and the tick counter.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    world: World,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig, world: World) -> Self {
        Self {
            tick_id: 0,
            config,
            world,
        }
    }

    /// Returns the number of ticks run so far.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Run one frame: every registered system once, in order.
    pub fn tick(&mut self, dt: f32) {
        self.tick_id += 1;
        debug!(
            tick_id = self.tick_id,
            dt,
            entities = self.world.num_entities(),
            "tick start"
        );
        self.world.update(dt);
    }

    /// Run the tick loop for the configured number of ticks, or indefinitely.
    ///
    /// # Errors
    ///
    /// Fails if the configured tick rate is invalid.
    pub fn run(&mut self) -> Result<()> {
        let tick_duration = self.config.tick_duration()?;
        let dt = tick_duration.as_secs_f32();
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(dt);

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_tick_advances_counter() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), World::new());
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(1.0 / 60.0);
        assert_eq!(tick_loop.tick_id(), 1);
        tick_loop.tick(1.0 / 60.0);
        assert_eq!(tick_loop.tick_id(), 2);
    }

    #[test]
    fn test_tick_runs_world_systems() {
        let mut world = World::new();
        let total = Rc::new(Cell::new(0.0f32));
        let total_in = Rc::clone(&total);
        world
            .register_system::<()>("clock", move |ctx| {
                total_in.set(total_in.get() + ctx.delta_time);
            })
            .unwrap();

        let mut tick_loop = TickLoop::new(TickConfig::default(), world);
        tick_loop.tick(0.25);
        tick_loop.tick(0.25);
        assert_eq!(total.get(), 0.5);
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 5,
        };
        let mut tick_loop = TickLoop::new(config, World::new());
        tick_loop.run().unwrap();
        assert_eq!(tick_loop.tick_id(), 5);
    }

    #[test]
    fn test_invalid_tick_rate_rejected() {
        let config = TickConfig {
            tick_rate: 0.0,
            max_ticks: 1,
        };
        let mut tick_loop = TickLoop::new(config, World::new());
        assert!(tick_loop.run().is_err());
        assert_eq!(tick_loop.tick_id(), 0);
    }
}
