//! Source modification tracking
//!
//! Records when a named unit of computation was last validated and
//! compares that instant against the modification times of the unit's
//! source chain to decide whether cached artifacts derived from it are
//! stale. The tracker owns no storage of its own; validation records are
//! ordinary cache entries under a reserved key namespace.

use crate::error::{CacheError, CacheResult};
use crate::store::Cache;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

/// Reserved key namespace for validation records.
///
/// General cache keys must not start with this prefix.
pub const MODIFIED_NAMESPACE: &str = "class-modified";

/// Supplies the ordered chain of source files backing a unit: the unit's
/// own file first, then its ancestors'.
pub trait SourceResolver {
    fn source_chain(&self, unit: &str) -> CacheResult<Vec<PathBuf>>;
}

#[derive(Debug, Clone)]
struct UnitSource {
    file: PathBuf,
    parent: Option<String>,
}

/// Lookup-table resolver: units are registered explicitly with their
/// source file and an optional parent unit.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    units: HashMap<String, UnitSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit with its source file
    pub fn register(&mut self, unit: impl Into<String>, file: impl Into<PathBuf>) {
        self.units.insert(
            unit.into(),
            UnitSource {
                file: file.into(),
                parent: None,
            },
        );
    }

    /// Register a unit that derives from a parent unit
    pub fn register_with_parent(
        &mut self,
        unit: impl Into<String>,
        file: impl Into<PathBuf>,
        parent: impl Into<String>,
    ) {
        self.units.insert(
            unit.into(),
            UnitSource {
                file: file.into(),
                parent: Some(parent.into()),
            },
        );
    }
}

impl SourceResolver for SourceRegistry {
    /// Walk the parent links, collecting each unit's source file.
    ///
    /// Unregistered names are an error; a repeated name ends the walk so
    /// a miswired registry terminates.
    fn source_chain(&self, unit: &str) -> CacheResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(unit.to_string());

        while let Some(name) = current {
            if !seen.insert(name.clone()) {
                break;
            }
            let source = self
                .units
                .get(&name)
                .ok_or_else(|| CacheError::UnknownUnit(name.clone()))?;
            files.push(source.file.clone());
            current = source.parent.clone();
        }

        Ok(files)
    }
}

/// Tracks per-unit validation timestamps on top of a [`Cache`]
pub struct ModificationTracker<R: SourceResolver> {
    cache: Cache,
    resolver: R,
}

impl<R: SourceResolver> ModificationTracker<R> {
    pub fn new(cache: Cache, resolver: R) -> Self {
        Self { cache, resolver }
    }

    /// Whether cached artifacts derived from `unit` should be considered
    /// stale.
    ///
    /// A unit that has never been validated is always reported modified.
    /// Otherwise the unit is modified when any file in its source chain
    /// was touched at or after the last validation instant; a file
    /// touched in the same second counts as changed. With `autosave`, a
    /// modified verdict refreshes the stored validation instant before
    /// returning; a not-modified verdict has no side effect.
    pub fn is_modified(&self, unit: &str, autosave: bool) -> CacheResult<bool> {
        let key = record_key(unit);
        let validated_at: i64 = self.cache.get(&key, 0);

        if validated_at == 0 {
            debug!("Unit {} has no validation record", unit);
            if autosave {
                self.mark_validated(unit)?;
            }
            return Ok(true);
        }

        for file in self.resolver.source_chain(unit)? {
            if mtime_secs(&file)? >= validated_at {
                debug!(
                    "Unit {} modified: {} touched since last validation",
                    unit,
                    file.display()
                );
                if autosave {
                    self.mark_validated(unit)?;
                }
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Record `unit` as validated now. The record never expires.
    pub fn mark_validated(&self, unit: &str) -> CacheResult<()> {
        self.cache
            .set_with_ttl(&record_key(unit), &Utc::now().timestamp(), 0)
    }
}

/// Cache key holding a unit's validation record
fn record_key(unit: &str) -> String {
    format!("{}/{}", MODIFIED_NAMESPACE, unit.replace("::", "_"))
}

/// Last-modified time of `path` in epoch seconds
fn mtime_secs(path: &Path) -> CacheResult<i64> {
    let metadata = fs::metadata(path)
        .map_err(|e| CacheError::io(format!("reading metadata for {}", path.display()), e))?;
    let modified = metadata
        .modified()
        .map_err(|e| CacheError::io(format!("reading mtime for {}", path.display()), e))?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(secs as i64)
}
