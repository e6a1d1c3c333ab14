use crate::error::SearchError;
use crate::index::{IndexSegment, Posting};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::Arc;

/// Owner of the active segment.
///
/// The segment itself is immutable; the only mutable state is the pointer to
/// it, which [`IndexStore::install`] replaces in one step. Readers clone the
/// `Arc` and keep a complete segment for as long as they need it.
#[derive(Default)]
pub struct IndexStore {
    active: RwLock<Option<Arc<IndexSegment>>>,
    build_lock: Mutex<()>,
}

impl IndexStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_segment(segment: IndexSegment) -> Self {
        let store = Self::new();
        store.install(segment);
        store
    }

    /// The active segment, or `IndexUnavailable` before the first install.
    pub fn snapshot(&self) -> Result<Arc<IndexSegment>, SearchError> {
        self.active.read().clone().ok_or(SearchError::IndexUnavailable)
    }

    pub fn is_ready(&self) -> bool { self.active.read().is_some() }

    /// Atomically replace the active segment, returning the previous one.
    pub fn install(&self, segment: IndexSegment) -> Option<Arc<IndexSegment>> {
        let segment = Arc::new(segment);
        self.active.write().replace(segment)
    }

    /// Exclusive right to build. Held for the whole build so that two
    /// rebuilds never interleave; searches do not take it.
    pub fn lock_build(&self) -> MutexGuard<'_, ()> { self.build_lock.lock() }

    pub fn postings_for(&self, term: &str) -> Result<Vec<Posting>, SearchError> {
        Ok(self.snapshot()?.postings_for(term).to_vec())
    }

    pub fn length_of(&self, document_id: &str) -> Result<Option<u32>, SearchError> {
        Ok(self.snapshot()?.length_of(document_id))
    }

    pub fn document_count(&self) -> Result<u32, SearchError> {
        Ok(self.snapshot()?.document_count())
    }

    pub fn average_document_length(&self) -> Result<f64, SearchError> {
        Ok(self.snapshot()?.average_document_length())
    }
}
