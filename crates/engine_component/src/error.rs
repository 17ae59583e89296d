//! Storage-layer error types.

use crate::archetype::ArchetypeId;
use crate::component::ComponentId;
use crate::entity::EntityId;

/// Errors that can occur while registering, storing, or resolving components.
///
/// Most variants describe recoverable caller mistakes (asking for a component
/// an entity does not have, an entity that was never spawned). Two variants,
/// [`EcsError::RowOutOfRange`] and [`EcsError::ArchetypeMismatch`], can only
/// surface when the storage bookkeeping itself is corrupt; see
/// [`EcsError::is_invariant_violation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The component type was never registered with the world.
    #[error("component type `{0}` is not registered")]
    UnknownComponent(&'static str),

    /// A raw component ID does not belong to the registry.
    #[error("{0} is not registered")]
    UnknownComponentId(ComponentId),

    /// The archetype exists but does not store the requested component.
    #[error("{archetype} has no `{component}` column")]
    MissingComponent {
        /// Name of the requested component type.
        component: &'static str,
        /// The archetype that was searched.
        archetype: ArchetypeId,
    },

    /// No entity with this ID was ever spawned in the world.
    #[error("{0} not found")]
    EntityNotFound(EntityId),

    /// No archetype with this ID exists.
    #[error("{0} not found")]
    UnknownArchetype(ArchetypeId),

    /// The entity counter reached the end of its 32-bit range.
    #[error("entity ID space exhausted")]
    EntityIdsExhausted,

    /// The component type needs a stricter alignment than pools provide.
    #[error("`{type_name}` requires {align}-byte alignment, at most {max} is supported")]
    UnsupportedAlignment {
        /// Name of the offending type.
        type_name: &'static str,
        /// Alignment the type requires.
        align: usize,
        /// Largest alignment a pool can honour.
        max: usize,
    },

    /// `set_element_size` was called on a pool that is already configured.
    #[error("element size of the {0} pool is already set")]
    ElementSizeAlreadySet(ComponentId),

    /// `set_element_size` was called after rows were added.
    #[error("{component} pool already holds {len} rows, its element size can no longer change")]
    PoolNotEmpty {
        /// The component stored by the pool.
        component: ComponentId,
        /// Number of rows in the pool.
        len: usize,
    },

    /// A typed access used a type whose size differs from the pool stride.
    #[error("{component} pool stores {expected}-byte elements, accessed as {actual} bytes")]
    ElementSizeMismatch {
        /// The component stored by the pool.
        component: ComponentId,
        /// The pool's element size.
        expected: usize,
        /// Size of the type used for access.
        actual: usize,
    },

    /// A row index past the end of a pool. Rows are only handed out by the
    /// world, so this indicates corrupted bookkeeping.
    #[error("row {row} out of range for a pool of {len} elements")]
    RowOutOfRange {
        /// The requested row.
        row: usize,
        /// Number of rows in the pool.
        len: usize,
    },

    /// The archetype record for a component points at a column the archetype
    /// does not hold.
    #[error("record for {component} points at a column {archetype} does not hold")]
    ArchetypeMismatch {
        /// The archetype whose columns were searched.
        archetype: ArchetypeId,
        /// The component whose record was consulted.
        component: ComponentId,
    },
}

impl EcsError {
    /// Returns `true` for errors that signal broken internal invariants
    /// rather than a recoverable caller mistake.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EcsError::RowOutOfRange { .. } | EcsError::ArchetypeMismatch { .. }
        )
    }
}
