//! Archetype matching for queries.
//!
//! A query names a set of component types; it matches every archetype whose
//! key is a superset of that set. Two strategies produce the same answer:
//!
//! - [`QueryStrategy::Indexed`] intersects the per-component
//!   [`ArchetypeRecord`]s, starting from the smallest.
//! - [`QueryStrategy::Scan`] walks every archetype and tests its key.
//!
//! Results are always in ascending [`ArchetypeId`] order.

use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, ArchetypeId, ArchetypeKey, ArchetypeRecord};

/// How a world resolves the archetypes matching a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    /// Intersect archetype records, smallest first.
    #[default]
    Indexed,
    /// Test every archetype's key.
    Scan,
}

/// Archetypes whose key is a superset of `key`, by linear scan.
pub fn scan<'a>(
    archetypes: impl IntoIterator<Item = &'a Archetype>,
    key: &ArchetypeKey,
) -> Vec<ArchetypeId> {
    let mut matches: Vec<ArchetypeId> = archetypes
        .into_iter()
        .filter(|archetype| archetype.key().is_superset_of(key))
        .map(Archetype::id)
        .collect();
    matches.sort_unstable();
    matches
}

/// Archetypes present in every record. The caller handles the empty query,
/// which matches every archetype and has no records to intersect.
#[must_use]
pub fn intersect(records: &[&ArchetypeRecord]) -> Vec<ArchetypeId> {
    let Some(smallest) = records.iter().min_by_key(|record| record.len()) else {
        return Vec::new();
    };
    smallest
        .archetypes()
        .filter(|&id| records.iter().all(|record| record.contains(id)))
        .collect()
}
