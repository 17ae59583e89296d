//! Systems and the per-invocation context handed to them.

use engine_component::{ArchetypeId, ArchetypeKey, Component, ComponentPool, EcsError};

use crate::world::World;

/// Callback signature for a system.
pub type SystemFn = Box<dyn FnMut(&mut SystemContext<'_>)>;

/// Context provided to a system callback on each [`World::update`].
///
/// `archetypes` is a snapshot of the archetypes matching the system's key,
/// taken just before the call. Entities spawned by the callback are visible
/// through `world` but do not extend the snapshot.
pub struct SystemContext<'w> {
    /// The world being updated.
    pub world: &'w mut World,
    /// Seconds since the previous update, as passed to [`World::update`].
    pub delta_time: f32,
    /// Matching archetypes in ascending ID order.
    pub archetypes: Vec<ArchetypeId>,
}

impl SystemContext<'_> {
    /// The `T` column of `archetype`.
    ///
    /// # Errors
    ///
    /// See [`World::get_components`].
    pub fn column<T: Component>(&self, archetype: ArchetypeId) -> Result<&ComponentPool, EcsError> {
        self.world.get_components::<T>(archetype)
    }

    /// The `T` column of `archetype`, mutably.
    ///
    /// # Errors
    ///
    /// See [`World::get_components_mut`].
    pub fn column_mut<T: Component>(
        &mut self,
        archetype: ArchetypeId,
    ) -> Result<&mut ComponentPool, EcsError> {
        self.world.get_components_mut::<T>(archetype)
    }

    /// Number of entities across the matching archetypes.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.archetypes
            .iter()
            .filter_map(|&id| self.world.archetype(id).ok())
            .map(|archetype| archetype.len())
            .sum()
    }
}

impl std::fmt::Debug for SystemContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemContext")
            .field("delta_time", &self.delta_time)
            .field("archetypes", &self.archetypes)
            .finish_non_exhaustive()
    }
}

/// A registered system: the canonical key it queries and its callback.
pub struct System {
    pub(crate) name: String,
    pub(crate) key: ArchetypeKey,
    pub(crate) callback: SystemFn,
}

impl System {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> &ArchetypeKey {
        &self.key
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
