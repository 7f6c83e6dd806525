//! Cache configuration
//!
//! The store takes an explicit `CacheConfig` at construction; there is no
//! ambient or global lookup. Configuration can also be loaded from a TOML
//! file, falling back to defaults when the file does not exist.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Storage root for cache entries
    pub path: PathBuf,

    /// Default TTL in seconds, applied when `set` is called without an
    /// explicit TTL. Zero means entries never expire.
    pub timeout: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("../cache"),
            timeout: 10_000,
        }
    }
}

impl CacheConfig {
    /// Load configuration, using defaults if the file does not exist
    pub fn load(path: &Path) -> CacheResult<Self> {
        if !path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::from_file(path)
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> CacheResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CacheError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
