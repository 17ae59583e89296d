//! World state storage.
//!
//! The [`World`] owns every registry in the ECS: component IDs, archetypes
//! and their records, the entity table, and the system list. It is the only
//! way to create entities and the only place their location is tracked.

use std::collections::HashMap;

use engine_component::query;
use engine_component::{
    Archetype, ArchetypeId, ArchetypeKey, ArchetypeRecord, Component, ComponentId, ComponentPool,
    ComponentRegistry, ComponentSet, EcsError, Entity, EntityAllocator, EntityId, QueryStrategy,
};
use serde::Serialize;
use tracing::{debug, error, trace};

use crate::config::WorldConfig;
use crate::system::{System, SystemContext};

/// Log invariant violations as they surface; pass every error through.
fn surface(err: EcsError) -> EcsError {
    if err.is_invariant_violation() {
        error!(error = %err, "ECS storage invariant violated");
    }
    err
}

/// Per-archetype summary in [`WorldStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchetypeStats {
    pub id: ArchetypeId,
    pub components: Vec<ComponentId>,
    pub rows: usize,
}

/// A serialisable snapshot of world bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    pub entities: usize,
    pub components: usize,
    pub systems: usize,
    pub archetypes: Vec<ArchetypeStats>,
}

/// The ECS world.
#[derive(Debug, Default)]
pub struct World {
    config: WorldConfig,
    components: ComponentRegistry,
    allocator: EntityAllocator,
    /// Indexed by the counter half of [`EntityId`].
    entities: Vec<Entity>,
    /// Indexed by [`ArchetypeId`].
    archetypes: Vec<Archetype>,
    archetype_index: HashMap<ArchetypeKey, ArchetypeId>,
    records: HashMap<ComponentId, ArchetypeRecord>,
    systems: Vec<System>,
    /// Systems taken out of `systems` by an `update` in progress.
    running: usize,
    /// Bumped by every `reset`.
    resets: u64,
}

impl World {
    /// Create a new empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Register `T`, returning its ID. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails if `T` is over-aligned.
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentId, EcsError> {
        let before = self.components.len();
        let id = self.components.register::<T>()?;
        if self.components.len() > before {
            debug!(
                component = %id,
                name = T::type_name(),
                size = std::mem::size_of::<T>(),
                "registered component"
            );
        }
        Ok(id)
    }

    fn register_set<S: ComponentSet>(&mut self) -> Result<ArchetypeKey, EcsError> {
        let before = self.components.len();
        let ids = S::register(&mut self.components)?;
        for info in self.components.iter().skip(before) {
            debug!(
                component = %info.id,
                name = info.name,
                size = info.size,
                "registered component"
            );
        }
        Ok(ArchetypeKey::new(ids))
    }

    /// Return the archetype for `key`, creating it and updating the
    /// component records if it does not exist yet.
    fn get_or_add_archetype(&mut self, key: ArchetypeKey) -> Result<ArchetypeId, EcsError> {
        if let Some(&id) = self.archetype_index.get(&key) {
            return Ok(id);
        }

        let id = ArchetypeId(self.archetypes.len() as u32);
        let archetype = Archetype::new(
            id,
            key.clone(),
            &self.components,
            self.config.initial_capacity,
        )?;
        for (column, component) in key.iter().enumerate() {
            self.records.entry(component).or_default().insert(id, column);
        }
        debug!(archetype = %id, components = ?key.as_slice(), "created archetype");

        self.archetypes.push(archetype);
        self.archetype_index.insert(key, id);
        Ok(id)
    }

    /// Create an entity holding the default value of every type in `S`.
    ///
    /// `S` is a tuple of components; `()` places the entity in the empty
    /// archetype.
    ///
    /// # Errors
    ///
    /// Fails if a member type cannot be registered or the entity ID space is
    /// exhausted.
    pub fn new_entity<S: ComponentSet + Default>(&mut self) -> Result<EntityId, EcsError> {
        self.spawn(S::default())
    }

    /// Create an entity holding the given component values.
    ///
    /// # Errors
    ///
    /// See [`World::new_entity`].
    pub fn spawn<S: ComponentSet>(&mut self, bundle: S) -> Result<EntityId, EcsError> {
        let key = self.register_set::<S>()?;
        let archetype_id = self.get_or_add_archetype(key)?;
        let id = self.allocator.allocate()?;

        let archetype = self
            .archetypes
            .get_mut(archetype_id.index())
            .ok_or(EcsError::UnknownArchetype(archetype_id))?;
        let row = archetype.add_row(id);
        debug_assert!(archetype.is_aligned());
        self.entities.push(Entity {
            id,
            archetype: archetype_id,
            row,
        });

        bundle
            .write_into(archetype, &self.components, row)
            .map_err(surface)?;
        trace!(entity = %id, archetype = %archetype_id, row, "spawned entity");
        Ok(id)
    }

    /// Location of an entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] for IDs this world never issued.
    pub fn entity(&self, id: EntityId) -> Result<Entity, EcsError> {
        self.entities
            .get(id.index() as usize)
            .filter(|entity| entity.id == id)
            .copied()
            .ok_or(EcsError::EntityNotFound(id))
    }

    /// Resolve the column index of `T` in `archetype` through its record.
    fn column_of<T: Component>(&self, archetype: ArchetypeId) -> Result<usize, EcsError> {
        let component = self
            .components
            .id_of::<T>()
            .ok_or(EcsError::UnknownComponent(T::type_name()))?;
        if archetype.index() >= self.archetypes.len() {
            return Err(EcsError::UnknownArchetype(archetype));
        }
        self.records
            .get(&component)
            .and_then(|record| record.column(archetype))
            .ok_or(EcsError::MissingComponent {
                component: T::type_name(),
                archetype,
            })
    }

    fn pool(
        &self,
        archetype: ArchetypeId,
        column: usize,
        component: ComponentId,
    ) -> Result<&ComponentPool, EcsError> {
        self.archetypes
            .get(archetype.index())
            .and_then(|a| a.column(column))
            .filter(|pool| pool.component() == component)
            .ok_or(EcsError::ArchetypeMismatch {
                archetype,
                component,
            })
            .map_err(surface)
    }

    fn pool_mut(
        &mut self,
        archetype: ArchetypeId,
        column: usize,
        component: ComponentId,
    ) -> Result<&mut ComponentPool, EcsError> {
        self.archetypes
            .get_mut(archetype.index())
            .and_then(|a| a.column_mut(column))
            .filter(|pool| pool.component() == component)
            .ok_or(EcsError::ArchetypeMismatch {
                archetype,
                component,
            })
            .map_err(surface)
    }

    fn component_id<T: Component>(&self) -> Result<ComponentId, EcsError> {
        self.components
            .id_of::<T>()
            .ok_or(EcsError::UnknownComponent(T::type_name()))
    }

    /// The `T` component of an entity.
    ///
    /// # Errors
    ///
    /// Fails if the entity is unknown, `T` is unregistered, or the entity's
    /// archetype does not store `T`.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Result<&T, EcsError> {
        let location = self.entity(entity)?;
        let column = self.column_of::<T>(location.archetype)?;
        let component = self.component_id::<T>()?;
        self.pool(location.archetype, column, component)?
            .get::<T>(location.row)
            .map_err(surface)
    }

    /// The `T` component of an entity, mutably.
    ///
    /// # Errors
    ///
    /// See [`World::get_component`].
    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> Result<&mut T, EcsError> {
        let location = self.entity(entity)?;
        let column = self.column_of::<T>(location.archetype)?;
        let component = self.component_id::<T>()?;
        self.pool_mut(location.archetype, column, component)?
            .get_mut::<T>(location.row)
            .map_err(surface)
    }

    /// Every archetype whose component set contains all of `S`, in ascending
    /// ID order. Types never registered with this world match nothing.
    #[must_use]
    pub fn get_archetypes<S: ComponentSet>(&self) -> Vec<ArchetypeId> {
        match S::lookup(&self.components) {
            Some(ids) => self.matching_archetypes(&ArchetypeKey::new(ids)),
            None => Vec::new(),
        }
    }

    /// Every archetype whose key is a superset of `key`, in ascending ID
    /// order.
    #[must_use]
    pub fn matching_archetypes(&self, key: &ArchetypeKey) -> Vec<ArchetypeId> {
        if key.is_empty() {
            return self.archetypes.iter().map(Archetype::id).collect();
        }
        match self.config.query_strategy {
            QueryStrategy::Scan => query::scan(&self.archetypes, key),
            QueryStrategy::Indexed => {
                let records: Option<Vec<&ArchetypeRecord>> =
                    key.iter().map(|id| self.records.get(&id)).collect();
                records.map_or_else(Vec::new, |records| query::intersect(&records))
            }
        }
    }

    /// The `T` column of an archetype.
    ///
    /// # Errors
    ///
    /// Fails if `T` is unregistered, the archetype does not exist, or it does
    /// not store `T`.
    pub fn get_components<T: Component>(
        &self,
        archetype: ArchetypeId,
    ) -> Result<&ComponentPool, EcsError> {
        let column = self.column_of::<T>(archetype)?;
        let component = self.component_id::<T>()?;
        self.pool(archetype, column, component)
    }

    /// The `T` column of an archetype, mutably.
    ///
    /// # Errors
    ///
    /// See [`World::get_components`].
    pub fn get_components_mut<T: Component>(
        &mut self,
        archetype: ArchetypeId,
    ) -> Result<&mut ComponentPool, EcsError> {
        let column = self.column_of::<T>(archetype)?;
        let component = self.component_id::<T>()?;
        self.pool_mut(archetype, column, component)
    }

    /// Register a system over the component set `S`. Systems run in
    /// registration order on every [`World::update`].
    ///
    /// # Errors
    ///
    /// Fails if a member of `S` cannot be registered.
    pub fn register_system<S: ComponentSet>(
        &mut self,
        name: impl Into<String>,
        callback: impl FnMut(&mut SystemContext<'_>) + 'static,
    ) -> Result<&mut Self, EcsError> {
        let key = self.register_set::<S>()?;
        let name = name.into();
        debug!(system = %name, components = ?key.as_slice(), "registered system");
        self.systems.push(System {
            name,
            key,
            callback: Box::new(callback),
        });
        Ok(self)
    }

    /// Run every system once, in registration order.
    ///
    /// Each system's matching archetypes are recomputed right before it runs,
    /// so it sees archetypes created by earlier systems in the same update.
    /// Systems registered during the update first run on the next one. A
    /// [`World::reset`] from inside a callback ends the pass and drops every
    /// system registered before the reset.
    pub fn update(&mut self, delta_time: f32) -> &mut Self {
        let mut systems = std::mem::take(&mut self.systems);
        let resets = self.resets;
        let outer = self.running;
        self.running += systems.len();
        debug!(systems = systems.len(), delta_time, "world update");

        for system in &mut systems {
            let archetypes = self.matching_archetypes(&system.key);
            trace!(system = %system.name, archetypes = archetypes.len(), "running system");
            let mut context = SystemContext {
                world: self,
                delta_time,
                archetypes,
            };
            (system.callback)(&mut context);

            if self.resets != resets {
                debug!(system = %system.name, "world reset during update, dropping systems");
                break;
            }
        }

        if self.resets == resets {
            self.running = outer;
            systems.append(&mut self.systems);
            self.systems = systems;
        }
        self
    }

    /// Number of entities created.
    #[must_use]
    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn num_archetypes(&self) -> usize {
        self.archetypes.len()
    }

    #[must_use]
    pub fn num_systems(&self) -> usize {
        self.systems.len() + self.running
    }

    /// Look up an archetype by ID.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownArchetype`] for IDs this world never issued.
    pub fn archetype(&self, id: ArchetypeId) -> Result<&Archetype, EcsError> {
        self.archetypes
            .get(id.index())
            .ok_or(EcsError::UnknownArchetype(id))
    }

    /// All archetypes in creation order.
    #[must_use]
    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// The archetype record of a component, if any archetype stores it.
    #[must_use]
    pub fn archetype_record(&self, component: ComponentId) -> Option<&ArchetypeRecord> {
        self.records.get(&component)
    }

    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Registered systems. While [`World::update`] runs, this holds only the
    /// systems registered during the current pass.
    #[must_use]
    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            entities: self.entities.len(),
            components: self.components.len(),
            systems: self.num_systems(),
            archetypes: self
                .archetypes
                .iter()
                .map(|archetype| ArchetypeStats {
                    id: archetype.id(),
                    components: archetype.key().as_slice().to_vec(),
                    rows: archetype.len(),
                })
                .collect(),
        }
    }

    /// Drop every entity, archetype, component registration and system, and
    /// restart the component and entity counters at zero. The configuration
    /// is kept.
    ///
    /// Called from a system callback, the rest of the current update is
    /// skipped.
    pub fn reset(&mut self) {
        debug!(
            entities = self.entities.len(),
            archetypes = self.archetypes.len(),
            "resetting world"
        );
        self.components.reset();
        self.allocator.reset();
        self.entities.clear();
        self.archetypes.clear();
        self.archetype_index.clear();
        self.records.clear();
        self.systems.clear();
        self.running = 0;
        self.resets += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use bytemuck::{Pod, Zeroable};

    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct A {
        value: i32,
    }
    impl Component for A {}

    #[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct B {
        flag: u32,
    }
    impl Component for B {}

    #[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct C {
        x: f32,
        y: f32,
    }
    impl Component for C {}

    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Value {
        value: i32,
    }
    impl Default for Value {
        fn default() -> Self {
            Self { value: 10 }
        }
    }
    impl Component for Value {}

    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Scale {
        factor: f32,
    }
    impl Default for Scale {
        fn default() -> Self {
            Self { factor: 1.5 }
        }
    }
    impl Component for Scale {}

    #[test]
    fn test_permuted_sets_share_an_archetype() {
        let mut world = World::new();
        let first = world.new_entity::<(A, B)>().unwrap();
        let second = world.new_entity::<(B, A)>().unwrap();

        assert_eq!(world.num_archetypes(), 1);
        assert_eq!(world.num_entities(), 2);
        assert_eq!(
            world.entity(first).unwrap().archetype,
            world.entity(second).unwrap().archetype
        );
    }

    #[test]
    fn test_query_superset_matching() {
        let mut world = World::new();
        world.new_entity::<(A, C)>().unwrap();
        world.new_entity::<(B, C)>().unwrap();
        world.new_entity::<(C,)>().unwrap();

        assert_eq!(world.get_archetypes::<(C,)>().len(), 3);
        assert_eq!(world.get_archetypes::<(A, C)>().len(), 1);
        assert!(world.get_archetypes::<(A, B)>().is_empty());
    }

    #[test]
    fn test_system_sees_matching_archetype() {
        let mut world = World::new();
        let seen = Rc::new(Cell::new(None));
        let calls = Rc::new(Cell::new(0));

        let seen_in = Rc::clone(&seen);
        let calls_in = Rc::clone(&calls);
        world
            .register_system::<(A,)>("read_a", move |ctx| {
                calls_in.set(calls_in.get() + 1);
                assert_eq!(ctx.archetypes.len(), 1);
                let pool = ctx.column::<A>(ctx.archetypes[0]).unwrap();
                assert_eq!(pool.len(), 1);
                seen_in.set(Some(pool.get::<A>(0).unwrap().value));
            })
            .unwrap();

        let entity = world.new_entity::<(A,)>().unwrap();
        world.get_component_mut::<A>(entity).unwrap().value = 5;
        world.update(0.0);

        assert_eq!(calls.get(), 1);
        assert_eq!(seen.get(), Some(5));
    }

    #[test]
    fn test_component_write_persists() {
        let mut world = World::new();
        let entity = world.new_entity::<(A, B)>().unwrap();
        world.get_component_mut::<A>(entity).unwrap().value = 42;
        assert_eq!(world.get_component::<A>(entity).unwrap().value, 42);
        assert_eq!(world.get_component::<B>(entity).unwrap().flag, 0);
    }

    #[test]
    fn test_default_values_written() {
        let mut world = World::new();
        let entity = world.new_entity::<(Value, Scale)>().unwrap();
        assert_eq!(world.get_component::<Value>(entity).unwrap().value, 10);
        assert_eq!(world.get_component::<Scale>(entity).unwrap().factor, 1.5);
    }

    #[test]
    fn test_spawn_writes_given_values() {
        let mut world = World::new();
        let entity = world
            .spawn((Value { value: -3 }, C { x: 1.0, y: 2.0 }))
            .unwrap();
        assert_eq!(world.get_component::<Value>(entity).unwrap().value, -3);
        assert_eq!(
            world.get_component::<C>(entity).unwrap(),
            &C { x: 1.0, y: 2.0 }
        );
    }

    #[test]
    fn test_entity_ids_and_rows_sequential() {
        let mut world = World::new();
        let ids: Vec<_> = (0..4).map(|_| world.new_entity::<(A,)>().unwrap()).collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(id.index() as usize, i);
            assert_eq!(id.generation(), 0);
            assert_eq!(world.entity(*id).unwrap().row, i);
        }
        let archetype = world.archetype(ArchetypeId(0)).unwrap();
        assert_eq!(archetype.entities(), ids.as_slice());
        assert!(archetype.is_aligned());
    }

    #[test]
    fn test_rows_do_not_bleed_between_entities() {
        let mut world = World::new();
        let ids: Vec<_> = (0..8).map(|i| world.spawn((A { value: i },)).unwrap()).collect();
        world.get_component_mut::<A>(ids[3]).unwrap().value = 100;
        for (i, id) in ids.iter().enumerate() {
            let expected = if i == 3 { 100 } else { i as i32 };
            assert_eq!(world.get_component::<A>(*id).unwrap().value, expected);
        }
    }

    #[test]
    fn test_columns_stay_aligned_across_archetypes() {
        let mut world = World::new();
        for i in 0..10 {
            if i % 2 == 0 {
                world.new_entity::<(A, B, C)>().unwrap();
            } else {
                world.new_entity::<(C, A)>().unwrap();
            }
        }
        for archetype in world.archetypes() {
            assert!(archetype.is_aligned());
            assert_eq!(archetype.len(), 5);
        }
    }

    #[test]
    fn test_empty_component_set() {
        let mut world = World::new();
        let first = world.new_entity::<()>().unwrap();
        let second = world.new_entity::<()>().unwrap();
        assert_eq!(world.num_archetypes(), 1);
        assert_eq!(world.entity(second).unwrap().row, 1);
        let archetype = world.entity(first).unwrap().archetype;
        assert!(world.archetype(archetype).unwrap().key().is_empty());
        assert_eq!(world.get_archetypes::<()>().len(), 1);
    }

    #[test]
    fn test_missing_component_errors() {
        let mut world = World::new();
        let entity = world.new_entity::<(A,)>().unwrap();
        world.new_entity::<(B,)>().unwrap();

        assert!(matches!(
            world.get_component::<B>(entity),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(matches!(
            world.get_component::<C>(entity),
            Err(EcsError::UnknownComponent(_))
        ));
        assert_eq!(
            world.get_component::<A>(EntityId::from_raw(99)).unwrap_err(),
            EcsError::EntityNotFound(EntityId::from_raw(99))
        );
        assert_eq!(
            world.get_components::<A>(ArchetypeId(7)).unwrap_err(),
            EcsError::UnknownArchetype(ArchetypeId(7))
        );
    }

    #[test]
    fn test_unregistered_query_matches_nothing() {
        let mut world = World::new();
        world.new_entity::<(A,)>().unwrap();
        assert!(world.get_archetypes::<(A, Value)>().is_empty());
        assert!(world.components().id_of::<Value>().is_none());
    }

    #[test]
    fn test_query_results_ordered_and_unique() {
        let mut world = World::new();
        world.new_entity::<(C, B)>().unwrap();
        world.new_entity::<(A,)>().unwrap();
        world.new_entity::<(A, B)>().unwrap();
        world.new_entity::<(A, B, C)>().unwrap();
        world.new_entity::<(B, A)>().unwrap();

        assert_eq!(
            world.get_archetypes::<(B,)>(),
            vec![ArchetypeId(0), ArchetypeId(2), ArchetypeId(3)]
        );
        assert_eq!(
            world.get_archetypes::<(A, A)>(),
            vec![ArchetypeId(1), ArchetypeId(2), ArchetypeId(3)]
        );
    }

    #[test]
    fn test_strategies_agree() {
        let mut indexed = World::new();
        let mut scan =
            World::with_config(WorldConfig::default().with_query_strategy(QueryStrategy::Scan));
        for world in [&mut indexed, &mut scan] {
            world.new_entity::<(A, B)>().unwrap();
            world.new_entity::<(B, C)>().unwrap();
            world.new_entity::<(A, C)>().unwrap();
            world.new_entity::<(A, B, C)>().unwrap();
        }
        assert_eq!(indexed.get_archetypes::<(A,)>(), scan.get_archetypes::<(A,)>());
        assert_eq!(indexed.get_archetypes::<(B, C)>(), scan.get_archetypes::<(B, C)>());
        assert_eq!(indexed.get_archetypes::<(A, B, C)>(), vec![ArchetypeId(3)]);
        assert_eq!(scan.get_archetypes::<(A, B, C)>(), vec![ArchetypeId(3)]);
    }

    #[test]
    fn test_records_track_columns() {
        let mut world = World::new();
        world.register_component::<A>().unwrap();
        world.new_entity::<(C, A)>().unwrap();
        world.new_entity::<(C,)>().unwrap();
        let c = world.components().id_of::<C>().unwrap();
        let record = world.archetype_record(c).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.column(ArchetypeId(0)), Some(1));
        assert_eq!(record.column(ArchetypeId(1)), Some(0));
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let mut world = World::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            world
                .register_system::<()>(name, move |_| order.borrow_mut().push(name))
                .unwrap();
        }
        world.update(0.016).update(0.016);
        assert_eq!(
            *order.borrow(),
            vec!["first", "second", "third", "first", "second", "third"]
        );
    }

    #[test]
    fn test_system_mutates_columns_with_delta_time() {
        let mut world = World::new();
        world
            .register_system::<(C, Scale)>("grow", |ctx| {
                for id in ctx.archetypes.clone() {
                    let factor = ctx.column::<Scale>(id).unwrap().get::<Scale>(0).unwrap().factor;
                    let dt = ctx.delta_time;
                    for c in ctx.column_mut::<C>(id).unwrap().as_mut_slice::<C>().unwrap() {
                        c.x += factor * dt;
                    }
                }
            })
            .unwrap();
        let entity = world.new_entity::<(C, Scale)>().unwrap();
        world.update(2.0);
        assert_eq!(world.get_component::<C>(entity).unwrap().x, 3.0);
    }

    #[test]
    fn test_query_recomputed_every_update() {
        let mut world = World::new();
        let counts = Rc::new(RefCell::new(Vec::new()));
        let counts_in = Rc::clone(&counts);
        world
            .register_system::<(A,)>("count", move |ctx| {
                counts_in.borrow_mut().push(ctx.entity_count());
            })
            .unwrap();

        world.update(0.0);
        world.new_entity::<(A,)>().unwrap();
        world.new_entity::<(A, B)>().unwrap();
        world.update(0.0);
        assert_eq!(*counts.borrow(), vec![0, 2]);
    }

    #[test]
    fn test_spawning_inside_system_keeps_snapshot() {
        let mut world = World::new();
        let seen = Rc::new(Cell::new(0));
        let seen_in = Rc::clone(&seen);
        world
            .register_system::<(A,)>("spawner", move |ctx| {
                seen_in.set(ctx.archetypes.len());
                ctx.world.new_entity::<(A, C)>().unwrap();
            })
            .unwrap();
        world.new_entity::<(A,)>().unwrap();

        world.update(0.0);
        assert_eq!(seen.get(), 1);
        world.update(0.0);
        assert_eq!(seen.get(), 2);
        assert_eq!(world.num_entities(), 3);
    }

    #[test]
    fn test_system_registered_during_update_runs_next_frame() {
        let mut world = World::new();
        let late_calls = Rc::new(Cell::new(0));
        let late_in = Rc::clone(&late_calls);
        let registered = Cell::new(false);
        world
            .register_system::<()>("registrar", move |ctx| {
                if !registered.replace(true) {
                    let late_in = Rc::clone(&late_in);
                    ctx.world
                        .register_system::<()>("late", move |_| late_in.set(late_in.get() + 1))
                        .unwrap();
                }
            })
            .unwrap();

        world.update(0.0);
        assert_eq!(late_calls.get(), 0);
        assert_eq!(world.num_systems(), 2);
        world.update(0.0);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn test_independent_worlds() {
        let mut first = World::new();
        let mut second = World::new();
        first.new_entity::<(A,)>().unwrap();
        first.new_entity::<(B,)>().unwrap();
        second.new_entity::<(B,)>().unwrap();

        assert_eq!(first.components().id_of::<B>(), Some(ComponentId(1)));
        assert_eq!(second.components().id_of::<B>(), Some(ComponentId(0)));
        assert_eq!(second.num_entities(), 1);
    }

    #[test]
    fn test_reset_inside_system_drops_running_systems() {
        let mut world = World::new();
        let resets = Rc::new(Cell::new(0));
        let stale_runs = Rc::new(Cell::new(0));

        let resets_in = Rc::clone(&resets);
        world
            .register_system::<(A,)>("resetter", move |ctx| {
                resets_in.set(resets_in.get() + 1);
                ctx.world.reset();
            })
            .unwrap();
        let stale_in = Rc::clone(&stale_runs);
        world
            .register_system::<(A,)>("after", move |_| stale_in.set(stale_in.get() + 1))
            .unwrap();
        world.new_entity::<(A,)>().unwrap();

        world.update(0.0);
        assert_eq!(resets.get(), 1);
        assert_eq!(stale_runs.get(), 0);
        assert_eq!(world.num_systems(), 0);
        assert!(world.systems().is_empty());

        let entity = world.new_entity::<(B,)>().unwrap();
        world.update(0.0);
        assert_eq!(resets.get(), 1);
        assert_eq!(world.get_archetypes::<(B,)>(), vec![ArchetypeId(0)]);
        assert_eq!(world.get_component::<B>(entity).unwrap().flag, 0);
    }

    #[test]
    fn test_systems_registered_after_reset_in_update_survive() {
        let mut world = World::new();
        let late_runs = Rc::new(Cell::new(0));
        let late_in = Rc::clone(&late_runs);
        world
            .register_system::<()>("rebuild", move |ctx| {
                ctx.world.reset();
                let late_in = Rc::clone(&late_in);
                ctx.world
                    .register_system::<()>("late", move |_| late_in.set(late_in.get() + 1))
                    .unwrap();
            })
            .unwrap();

        world.update(0.0);
        assert_eq!(world.num_systems(), 1);
        assert_eq!(world.systems()[0].name(), "late");
        world.update(0.0);
        assert_eq!(late_runs.get(), 1);
    }

    #[test]
    fn test_num_systems_counts_running_pass() {
        let mut world = World::new();
        let seen = Rc::new(Cell::new(0));
        let seen_in = Rc::clone(&seen);
        world
            .register_system::<()>("count", move |ctx| seen_in.set(ctx.world.num_systems()))
            .unwrap();
        world.register_system::<(A,)>("noop", |_| {}).unwrap();

        world.update(0.0);
        assert_eq!(seen.get(), 2);
        assert_eq!(world.num_systems(), 2);
        assert_eq!(world.stats().systems, 2);
    }

    #[test]
    fn test_over_aligned_member_leaves_registry_untouched() {
        #[derive(Debug, Clone, Copy, Default)]
        #[repr(C, align(32))]
        struct Wide {
            lanes: [u8; 32],
        }
        // SAFETY: a byte array with no padding; every bit pattern is valid.
        unsafe impl Zeroable for Wide {}
        unsafe impl Pod for Wide {}
        impl Component for Wide {}

        let mut world = World::new();
        assert!(matches!(
            world.new_entity::<(A, Wide)>(),
            Err(EcsError::UnsupportedAlignment { .. })
        ));
        assert!(world.components().is_empty());
        assert_eq!(world.num_entities(), 0);
        assert_eq!(world.num_archetypes(), 0);
    }

    #[test]
    fn test_reset_restarts_counters() {
        let mut world = World::new();
        world.new_entity::<(A, B)>().unwrap();
        world.register_system::<(A,)>("noop", |_| {}).unwrap();
        world.reset();

        assert_eq!(world.num_entities(), 0);
        assert_eq!(world.num_archetypes(), 0);
        assert_eq!(world.num_systems(), 0);
        let entity = world.new_entity::<(C,)>().unwrap();
        assert_eq!(entity, EntityId::from_raw(0));
        assert_eq!(world.components().id_of::<C>(), Some(ComponentId(0)));
    }

    #[test]
    fn test_stats_snapshot() {
        let mut world = World::new();
        world.new_entity::<(A,)>().unwrap();
        world.new_entity::<(A,)>().unwrap();
        world.new_entity::<(B, A)>().unwrap();

        let stats = world.stats();
        assert_eq!(stats.entities, 3);
        assert_eq!(stats.components, 2);
        assert_eq!(stats.archetypes.len(), 2);
        assert_eq!(stats.archetypes[0].rows, 2);
        assert_eq!(
            stats.archetypes[1].components,
            vec![ComponentId(0), ComponentId(1)]
        );

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["entities"], 3);
    }

    #[test]
    fn test_initial_capacity_does_not_add_rows() {
        let mut world = World::with_config(WorldConfig::default().with_initial_capacity(256));
        world.new_entity::<(A,)>().unwrap();
        let archetype = world.get_archetypes::<(A,)>()[0];
        assert_eq!(world.get_components::<A>(archetype).unwrap().len(), 1);
    }
}
