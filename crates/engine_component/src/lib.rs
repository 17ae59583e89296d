//! # engine_component
//!
//! The storage half of the ECS: what a component is, how it is laid out in
//! memory, and how archetypes are matched by queries.
//!
//! This crate provides:
//!
//! - [`Component`] trait and the per-world [`ComponentRegistry`].
//! - [`ComponentPool`]: a type-erased, contiguous column of fixed-size elements.
//! - [`Archetype`]: one column per component type, keyed by a canonical
//!   [`ArchetypeKey`], plus the [`ArchetypeRecord`] reverse index.
//! - [`EntityId`] and the monotonically increasing [`EntityAllocator`].
//! - [`QueryStrategy`] and the archetype matching helpers in [`query`].

pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod pool;
pub mod query;

pub use archetype::{Archetype, ArchetypeId, ArchetypeKey, ArchetypeRecord};
pub use component::{Component, ComponentId, ComponentInfo, ComponentRegistry, ComponentSet};
pub use entity::{Entity, EntityAllocator, EntityId};
pub use error::EcsError;
pub use pool::{ComponentPool, ElementRef, Elements, MAX_COMPONENT_ALIGN};
pub use query::QueryStrategy;
