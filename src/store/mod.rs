//! Filesystem-backed entry store
//!
//! One file per cache entry, nested directories mirroring the key. Each
//! file holds the entry's absolute expiry instant and the serialized
//! value; expired entries are reclaimed lazily on the next write of the
//! same key or en masse by `flush`.
//!
//! # On-disk layout
//!
//! ```text
//! <root>/<dir-seg-1>/.../<dir-seg-n>/<leaf>
//! ```
//!
//! The `class-modified/` namespace is reserved for the modification
//! tracker; general keys must not use it.

mod entry;
mod key;

pub use entry::NEVER_EXPIRES;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem-backed cache store
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
    default_ttl: i64,
}

impl Cache {
    /// Create a store from configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            root: config.path,
            default_ttl: config.timeout,
        }
    }

    /// Create a store with an explicit root and default TTL
    pub fn with_root(root: impl Into<PathBuf>, default_ttl: i64) -> Self {
        Self {
            root: root.into(),
            default_ttl,
        }
    }

    /// Get the storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a value under `key` using the default TTL
    pub fn set<V: Serialize>(&self, key: &str, value: &V) -> CacheResult<()> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// Store a value under `key` with an explicit TTL in seconds.
    ///
    /// A TTL of zero stores the entry forever. A negative TTL writes an
    /// entry that immediately reads back as absent.
    pub fn set_with_ttl<V: Serialize>(&self, key: &str, value: &V, ttl: i64) -> CacheResult<()> {
        let (parent, file) = key::resolve(&self.root, key);
        fs::create_dir_all(&parent).map_err(|e| {
            CacheError::io(format!("creating cache directory {}", parent.display()), e)
        })?;

        let payload = serde_json::to_string(value)?;
        let expires_at = entry::expiry_for(ttl, Utc::now().timestamp());
        write_atomic(&file, &entry::encode(expires_at, &payload))?;

        debug!("Stored cache entry {} (expires {})", key, expires_at);
        Ok(())
    }

    /// Fetch the value under `key`, or `default` when the entry is
    /// absent, expired, or undecodable.
    ///
    /// Absence is a normal, silent outcome; this never errors for a
    /// missing key.
    pub fn get<V: DeserializeOwned>(&self, key: &str, default: V) -> V {
        match self.load_value(key) {
            Some((_, payload)) => serde_json::from_str(&payload).unwrap_or(default),
            None => default,
        }
    }

    /// Whether a valid entry exists under `key`
    pub fn has(&self, key: &str) -> bool {
        self.load_value(key).is_some()
    }

    /// Remove the entry under `key`. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) -> CacheResult<()> {
        let (_, file) = key::resolve(&self.root, key);
        match fs::remove_file(&file) {
            Ok(()) => {
                debug!("Deleted cache entry {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(
                format!("deleting cache entry {}", file.display()),
                e,
            )),
        }
    }

    /// Remove the storage root and everything beneath it.
    ///
    /// The next `set` recreates the root on demand.
    pub fn flush(&self) -> CacheResult<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                debug!("Flushed cache root {}", self.root.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(
                format!("flushing cache root {}", self.root.display()),
                e,
            )),
        }
    }

    /// Load the raw entry under `key`.
    ///
    /// Returns the expiry instant and serialized payload for a valid hit,
    /// `None` when the entry is absent, expired, or malformed. `get` and
    /// `has` are both built on this, so the freshness test cannot drift
    /// between them.
    pub fn load_value(&self, key: &str) -> Option<(i64, String)> {
        let (_, file) = key::resolve(&self.root, key);
        let content = fs::read_to_string(&file).ok()?;
        let (expires_at, payload) = entry::decode(&content)?;
        if !entry::is_fresh(expires_at, Utc::now().timestamp()) {
            return None;
        }
        Some((expires_at, payload.to_string()))
    }
}

/// Write `content` to `path` through a temporary file and rename, so a
/// concurrent reader never observes a torn entry.
fn write_atomic(path: &Path, content: &str) -> CacheResult<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)
        .map_err(|e| CacheError::io(format!("writing cache entry {}", temp_path.display()), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o644)).map_err(|e| {
            CacheError::io(format!("setting permissions on {}", temp_path.display()), e)
        })?;
    }

    fs::rename(&temp_path, path)
        .map_err(|e| CacheError::io(format!("renaming cache entry to {}", path.display()), e))?;

    Ok(())
}
