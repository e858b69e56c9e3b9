use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use crate::association::RawAssociation;

/// Thread-safe LRU cache of association API pages
///
/// Keyed by the full request URL (direction, node, relation and row limit
/// are all part of it). Discovery revisits the same ids several times per
/// run, so hits avoid repeated round trips. Only successful responses are
/// stored.
pub struct ResponseCache {
    cache: Mutex<LruCache<String, Vec<RawAssociation>>>,
}

impl ResponseCache {
    /// Create a new response cache; a capacity of 0 is raised to 1
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<RawAssociation>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached page for a request URL
    pub fn get(&self, url: &str) -> Option<Vec<RawAssociation>> {
        self.lock().get(url).cloned()
    }

    /// Store a page for a request URL
    pub fn put(&self, url: String, associations: Vec<RawAssociation>) {
        self.lock().put(url, associations);
    }

    /// Get the current number of cached entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.lock().clear();
    }
}
