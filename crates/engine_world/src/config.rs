//! World configuration.

use engine_component::QueryStrategy;
use serde::{Deserialize, Serialize};

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// How queries resolve their matching archetypes.
    pub query_strategy: QueryStrategy,
    /// Rows reserved up front in every newly created archetype.
    pub initial_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            query_strategy: QueryStrategy::Indexed,
            initial_capacity: 16,
        }
    }
}

impl WorldConfig {
    /// Override the query strategy.
    #[must_use]
    pub fn with_query_strategy(mut self, strategy: QueryStrategy) -> Self {
        self.query_strategy = strategy;
        self
    }

    /// Override the number of rows reserved per new archetype.
    #[must_use]
    pub fn with_initial_capacity(mut self, rows: usize) -> Self {
        self.initial_capacity = rows;
        self
    }
}
