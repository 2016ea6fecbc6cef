use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, SifterError};
use crate::models::StoredDocument;
use crate::segment::{DocId, Generation, IndexStore, TermInfo};

struct ReaderInner {
    /// `None` once released
    generation: RwLock<Option<Arc<Generation>>>,
    store: Arc<IndexStore>,
}

/// Point-in-time reader over one generation
///
/// The reader keeps its generation alive until [`IndexReader::release`] is
/// called or the last clone is dropped; commits made afterwards are never
/// observed. Clones share the binding, so releasing one releases all.
#[derive(Clone)]
pub struct IndexReader {
    inner: Arc<ReaderInner>,
}

impl IndexReader {
    /// Bind to the latest committed generation of `store`
    pub fn open(store: &Arc<IndexStore>) -> Result<Self> {
        if store.is_closed() {
            return Err(SifterError::StoreClosed);
        }
        Ok(Self {
            inner: Arc::new(ReaderInner {
                generation: RwLock::new(Some(store.current())),
                store: Arc::clone(store),
            }),
        })
    }

    /// The bound generation
    pub fn generation(&self) -> Result<Arc<Generation>> {
        self.inner
            .generation
            .read()
            .clone()
            .ok_or(SifterError::StaleGenerationAccess)
    }

    /// Terms of `field` with document frequencies, sorted by term
    pub fn terms(&self, field: &str) -> Result<Vec<TermInfo>> {
        Ok(self.generation()?.terms(field))
    }

    pub fn doc_freq(&self, field: &str, term: &str) -> Result<u32> {
        Ok(self.generation()?.doc_freq(field, term))
    }

    pub fn num_docs(&self) -> Result<u32> {
        Ok(self.generation()?.num_docs())
    }

    pub fn max_doc(&self) -> Result<u32> {
        Ok(self.generation()?.max_doc())
    }

    pub fn generation_number(&self) -> Result<u64> {
        Ok(self.generation()?.number())
    }

    /// Stored fields of `doc`, `None` when the doc id is not committed
    pub fn document(&self, doc: DocId) -> Result<Option<StoredDocument>> {
        Ok(self.generation()?.stored(doc).cloned())
    }

    /// Drop the binding; every later call fails with `StaleGenerationAccess`
    pub fn release(&self) {
        self.inner.generation.write().take();
    }

    pub fn is_released(&self) -> bool {
        self.inner.generation.read().is_none()
    }

    /// A new reader if a newer generation has been committed since this one
    pub fn reopen_if_changed(&self) -> Result<Option<IndexReader>> {
        let current = self.generation()?;
        if self.inner.store.current().number() == current.number() {
            return Ok(None);
        }
        Self::open(&self.inner.store).map(Some)
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.inner.store
    }
}

impl std::fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let generation = self.inner.generation.read().as_ref().map(|g| g.number());
        f.debug_struct("IndexReader")
            .field("generation", &generation)
            .finish()
    }
}
