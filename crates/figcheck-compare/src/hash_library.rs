//! Hash libraries.
//!
//! A hash library is a flat JSON object mapping test identities to baseline
//! fingerprints. Libraries are read lazily on first use and cached for the
//! rest of the run; several tests usually share one library.

use crate::{CompareError, CompareResult};
use figcheck_io::write_atomic;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Test identity -> fingerprint.
pub type HashLibrary = BTreeMap<String, String>;

/// Reads a hash library file.
pub fn load_hash_library(path: &Path) -> CompareResult<HashLibrary> {
    if !path.is_file() {
        return Err(CompareError::HashLibraryNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| CompareError::InvalidHashLibrary {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Writes a hash library as pretty, key-sorted JSON.
pub fn write_hash_library(path: &Path, library: &HashLibrary) -> CompareResult<()> {
    let mut json = serde_json::to_string_pretty(library).map_err(|e| {
        CompareError::InvalidHashLibrary {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    json.push('\n');
    write_atomic(path, json.as_bytes())?;
    Ok(())
}

/// Per-run cache of loaded libraries.
#[derive(Debug, Default)]
pub struct HashLibraryCache {
    loaded: Mutex<HashMap<PathBuf, Arc<HashLibrary>>>,
}

impl HashLibraryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the library at `path`, loading it on first request.
    ///
    /// Load failures are not cached, so a later test sees the same error.
    pub fn get(&self, path: &Path) -> CompareResult<Arc<HashLibrary>> {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(library) = loaded.get(path) {
            return Ok(Arc::clone(library));
        }
        let library = Arc::new(load_hash_library(path)?);
        debug!(path = %path.display(), entries = library.len(), "loaded hash library");
        loaded.insert(path.to_path_buf(), Arc::clone(&library));
        Ok(library)
    }
}
