use std::sync::{Arc, Mutex, MutexGuard};

use super::KnowledgeGraph;
use crate::association::AssociationRecord;

/// Thread-safe handle to a `KnowledgeGraph` for concurrent producers.
///
/// All insertions go through one mutex, so for association-derived ids the
/// payload of whichever worker commits first is kept ("first committer
/// wins"). Content-hashed edges are identical regardless of who commits.
#[derive(Debug, Clone, Default)]
pub struct SharedKnowledgeGraph {
    inner: Arc<Mutex<KnowledgeGraph>>,
}

impl SharedKnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, KnowledgeGraph> {
        // Insertions never leave the maps half-written, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a batch atomically with respect to other committers.
    pub fn add_records(&self, records: &[AssociationRecord]) -> (usize, usize) {
        self.lock().add_records(records)
    }

    pub fn node_count(&self) -> usize {
        self.lock().node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.lock().edge_count()
    }

    /// Take the graph out, cloning only if other handles are still alive.
    pub fn into_graph(self) -> KnowledgeGraph {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
        }
    }
}
