//! # engine_world
//!
//! The ECS façade. A [`World`] ties the storage primitives from
//! `engine_component` together: it canonicalises component sets into
//! archetypes, tracks where every entity lives, answers archetype queries,
//! and runs registered systems once per [`World::update`].
//!
//! ```rust
//! use bytemuck::{Pod, Zeroable};
//! use engine_component::Component;
//! use engine_world::World;
//!
//! #[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
//! #[repr(C)]
//! struct Counter {
//!     ticks: u32,
//! }
//!
//! impl Component for Counter {}
//!
//! let mut world = World::new();
//! world
//!     .register_system::<(Counter,)>("count", |ctx| {
//!         for id in ctx.archetypes.clone() {
//!             let pool = ctx.world.get_components_mut::<Counter>(id).unwrap();
//!             for counter in pool.as_mut_slice::<Counter>().unwrap() {
//!                 counter.ticks += 1;
//!             }
//!         }
//!     })
//!     .unwrap();
//!
//! let entity = world.new_entity::<(Counter,)>().unwrap();
//! world.update(1.0 / 60.0);
//! assert_eq!(world.get_component::<Counter>(entity).unwrap().ticks, 1);
//! ```

pub mod config;
pub mod system;
pub mod world;

pub use config::WorldConfig;
pub use system::{System, SystemContext, SystemFn};
pub use world::{ArchetypeStats, World, WorldStats};
