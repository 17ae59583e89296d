//! Archetype definitions and storage.
//!
//! An archetype is a unique combination of component types. Entities sharing
//! the same set of components are grouped into the same archetype, one
//! [`ComponentPool`] per component type, so that systems can walk a column
//! contiguously.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentId, ComponentRegistry};
use crate::entity::EntityId;
use crate::error::EcsError;
use crate::pool::ComponentPool;

/// A sequential archetype identifier. IDs are handed out in creation order
/// starting at zero and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeId(pub u32);

impl ArchetypeId {
    /// Returns the raw index of this ID.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Archetype({})", self.0)
    }
}

/// The canonical form of a component set: strictly increasing, duplicate
/// free [`ComponentId`]s.
///
/// The same set of types always produces the same key regardless of the
/// order they were listed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeKey(Vec<ComponentId>);

impl ArchetypeKey {
    /// Canonicalise a list of component IDs.
    #[must_use]
    pub fn new(mut ids: Vec<ComponentId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// The key of the archetype with no components.
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ComponentId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the key contains `id`.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.position(id).is_some()
    }

    /// Returns the index of `id` in the key, which is also the column index
    /// of that component in the archetype.
    #[must_use]
    pub fn position(&self, id: ComponentId) -> Option<usize> {
        self.0.binary_search(&id).ok()
    }

    /// Returns `true` if every component of `other` is also in `self`.
    #[must_use]
    pub fn is_superset_of(&self, other: &ArchetypeKey) -> bool {
        other.0.iter().all(|&id| self.contains(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ComponentId> for ArchetypeKey {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Vec<ComponentId>> for ArchetypeKey {
    fn from(ids: Vec<ComponentId>) -> Self {
        Self::new(ids)
    }
}

/// A table of entities sharing the same set of component types.
///
/// Data is stored in struct-of-arrays layout: one [`ComponentPool`] per key
/// entry, in key order, with the owning entity IDs kept in a parallel vector.
/// `entities[r]` and row `r` of every column describe the same entity.
#[derive(Debug, Clone)]
pub struct Archetype {
    id: ArchetypeId,
    key: ArchetypeKey,
    columns: Vec<ComponentPool>,
    entities: Vec<EntityId>,
}

impl Archetype {
    /// Create an empty archetype with one column per key entry, sized from
    /// the registry. `capacity` rows are reserved up front in every column.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponentId`] if a key entry is not in the
    /// registry.
    pub fn new(
        id: ArchetypeId,
        key: ArchetypeKey,
        registry: &ComponentRegistry,
        capacity: usize,
    ) -> Result<Self, EcsError> {
        let columns = key
            .iter()
            .map(|component| -> Result<ComponentPool, EcsError> {
                let size = registry
                    .size_of(component)
                    .ok_or(EcsError::UnknownComponentId(component))?;
                let mut pool = ComponentPool::new(component);
                pool.set_element_size(size)?;
                pool.reserve(capacity);
                Ok(pool)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            key,
            columns,
            entities: Vec::with_capacity(capacity),
        })
    }

    #[must_use]
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    #[must_use]
    pub fn key(&self) -> &ArchetypeKey {
        &self.key
    }

    /// Returns the number of entities (rows) stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All columns, in key order.
    #[must_use]
    pub fn columns(&self) -> &[ComponentPool] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ComponentPool> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn column_mut(&mut self, index: usize) -> Option<&mut ComponentPool> {
        self.columns.get_mut(index)
    }

    /// Returns the column index for the given component, if present.
    #[must_use]
    pub fn column_index(&self, component: ComponentId) -> Option<usize> {
        self.key.position(component)
    }

    #[must_use]
    pub fn has_component(&self, component: ComponentId) -> bool {
        self.key.contains(component)
    }

    /// Entity IDs in row order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// The entity stored at `row`.
    #[must_use]
    pub fn entity_at(&self, row: usize) -> Option<EntityId> {
        self.entities.get(row).copied()
    }

    /// Append a zeroed row to every column for `entity` and return its index.
    pub fn add_row(&mut self, entity: EntityId) -> usize {
        let row = self.entities.len();
        for column in &mut self.columns {
            column.add_element();
        }
        self.entities.push(entity);
        row
    }

    /// Returns `true` if every column holds exactly one element per entity.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.columns.iter().all(|c| c.len() == self.entities.len())
    }

    /// Write `value` into the `T` column at `row`.
    ///
    /// # Errors
    ///
    /// Fails if `T` is unregistered, the archetype has no `T` column, or the
    /// row is out of range.
    pub fn write<T: Component>(
        &mut self,
        registry: &ComponentRegistry,
        row: usize,
        value: T,
    ) -> Result<(), EcsError> {
        let component = registry
            .id_of::<T>()
            .ok_or(EcsError::UnknownComponent(T::type_name()))?;
        let index = self
            .column_index(component)
            .ok_or(EcsError::MissingComponent {
                component: T::type_name(),
                archetype: self.id,
            })?;
        *self.columns[index].get_mut::<T>(row)? = value;
        Ok(())
    }
}

/// For one component type: every archetype that stores it, and the column
/// index it occupies there. Ordered by [`ArchetypeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchetypeRecord {
    columns: BTreeMap<ArchetypeId, usize>,
}

impl ArchetypeRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `archetype` stores the component in column `column`.
    pub fn insert(&mut self, archetype: ArchetypeId, column: usize) {
        self.columns.insert(archetype, column);
    }

    #[must_use]
    pub fn contains(&self, archetype: ArchetypeId) -> bool {
        self.columns.contains_key(&archetype)
    }

    /// The column index of the component inside `archetype`.
    #[must_use]
    pub fn column(&self, archetype: ArchetypeId) -> Option<usize> {
        self.columns.get(&archetype).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Archetypes containing the component, in ascending ID order.
    pub fn archetypes(&self) -> impl Iterator<Item = ArchetypeId> + '_ {
        self.columns.keys().copied()
    }
}
