//! Application configuration.
//!
//! Loaded from the JSON file named by `ENGINE_CONFIG`; every field is
//! optional and falls back to its default.

use std::path::Path;

use anyhow::{Context, Result};
use engine_world::WorldConfig;
use serde::{Deserialize, Serialize};

use crate::scene::DemoConfig;
use crate::tick::TickConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "ENGINE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tick: TickConfig,
    pub world: WorldConfig,
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Load from `$ENGINE_CONFIG`, or use defaults if it is unset.
    ///
    /// # Errors
    ///
    /// Fails if the named file cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parse from a JSON string.
    ///
    /// # Errors
    ///
    /// Fails if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
