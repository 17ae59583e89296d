//! Entity identifiers, locations, and allocation.
//!
//! An [`EntityId`] is a lightweight `u64` identifier with no inherent data.
//! The low 32 bits hold a per-world counter; the high 32 bits are reserved
//! for a generation and are always zero since IDs are never recycled.

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeId;
use crate::error::EcsError;

const INDEX_MASK: u64 = 0xFFFF_FFFF;

/// A unique entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// The null / invalid entity sentinel.
    pub const INVALID: EntityId = EntityId(u64::MAX);

    /// Create an entity ID from a raw `u64`.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The counter part of the ID (low 32 bits).
    #[must_use]
    pub const fn index(self) -> u32 {
        (self.0 & INDEX_MASK) as u32
    }

    /// The generation part of the ID (high 32 bits).
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns `true` unless this is [`EntityId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u64::MAX
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Where an entity lives: its archetype and row. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub archetype: ArchetypeId,
    pub row: usize,
}

/// Allocates monotonically increasing entity IDs, starting at zero.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    next: u32,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity ID.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityIdsExhausted`] once the 32-bit counter is
    /// used up.
    pub fn allocate(&mut self) -> Result<EntityId, EcsError> {
        let index = self.next;
        self.next = index.checked_add(1).ok_or(EcsError::EntityIdsExhausted)?;
        Ok(EntityId(u64::from(index)))
    }

    /// Returns the number of IDs allocated so far.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.next
    }

    /// Restart numbering from zero.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
