use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use log::debug;

use super::loader::load_file;
use super::model::Dataset;
use crate::config::LoadOptions;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Memoized dataset loads
// ---------------------------------------------------------------------------

/// Source identity: where the data lives and how its schema is shaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    options: LoadOptions,
}

/// Loaded datasets keyed by source identity. Entries are never invalidated:
/// a source is treated as immutable for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<CacheKey, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it on first access.
    ///
    /// Loads run under the cache lock, so concurrent first accesses of the
    /// same source read it once. Failed loads are not cached.
    pub fn load(&self, path: &Path, options: &LoadOptions) -> Result<Arc<Dataset>> {
        let key = CacheKey {
            path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
            options: options.clone(),
        };

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(dataset) = entries.get(&key) {
            debug!("dataset cache hit for {}", key.path.display());
            return Ok(Arc::clone(dataset));
        }

        debug!("dataset cache miss for {}", key.path.display());
        let dataset = Arc::new(load_file(path, options)?);
        entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The process-wide cache shared by every session.
pub fn global() -> &'static DatasetCache {
    static CACHE: OnceLock<DatasetCache> = OnceLock::new();
    CACHE.get_or_init(DatasetCache::new)
}

/// Load through the process-wide cache.
pub fn load_cached(path: &Path, options: &LoadOptions) -> Result<Arc<Dataset>> {
    global().load(path, options)
}
