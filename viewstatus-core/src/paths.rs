//! Directory identity shared by the record store and the thumbnail cache.

use std::fs;
use std::path::{Path, PathBuf};

use viewstatus_model::ResourceKey;

/// Resolve `directory` to its canonical form.
///
/// Falls back to the path as given when it cannot be resolved (missing
/// directory, permissions), so callers still get a stable key.
pub(crate) fn canonical_directory(directory: &Path) -> PathBuf {
    fs::canonicalize(directory).unwrap_or_else(|_| directory.to_path_buf())
}

/// `key` with its directory canonicalised.
pub(crate) fn canonical_key(key: &ResourceKey) -> ResourceKey {
    let directory = canonical_directory(key.directory());
    if directory == key.directory() {
        return key.clone();
    }
    ResourceKey::new(directory, key.file_name()).unwrap_or_else(|_| key.clone())
}
