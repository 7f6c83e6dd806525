//! Key-to-path resolution
//!
//! Keys nest with either `:` or `/`; both map to the same directory
//! hierarchy under the storage root. The canonical on-disk layout uses
//! the path separator exclusively.

use std::path::{Path, PathBuf};

/// Split a key into its directory part and leaf name.
///
/// The split point is the last separator; keys without a separator have
/// no directory part. Leading/trailing separators on the directory part
/// are trimmed.
pub(crate) fn split(key: &str) -> (Option<String>, String) {
    let normalized = key.replace(':', "/");
    match normalized.rsplit_once('/') {
        Some((dir, leaf)) => {
            let dir = dir.trim_matches('/');
            let dir = if dir.is_empty() {
                None
            } else {
                Some(dir.to_string())
            };
            (dir, leaf.to_string())
        }
        None => (None, normalized),
    }
}

/// Resolve a key to the directory that must exist and the entry file
/// path beneath it.
pub(crate) fn resolve(root: &Path, key: &str) -> (PathBuf, PathBuf) {
    let (dir, leaf) = split(key);
    let parent = match dir {
        Some(dir) => root.join(dir),
        None => root.to_path_buf(),
    };
    let file = parent.join(&leaf);
    (parent, file)
}
