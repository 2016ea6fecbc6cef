use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, SifterError};
use crate::models::Document;
use crate::segment::{AnalyzedDocument, DocId, IndexStore, MutableBuffer, SegmentWriter};

/// The single writer of an [`IndexStore`]
///
/// Documents are analyzed without holding any lock; only doc id assignment
/// and the append into the pending buffer are serialized, so `add_document`
/// can be called from several threads. Nothing becomes visible to readers
/// until [`IndexWriter::commit`] publishes a new generation.
///
/// A failed commit poisons the writer: every later call returns
/// [`SifterError::Commit`] and the caller has to drop it and take a fresh
/// writer from the store.
pub struct IndexWriter {
    store: Arc<IndexStore>,
    buffer: Mutex<MutableBuffer>,
    failed: AtomicBool,
}

impl IndexWriter {
    pub(crate) fn new(store: Arc<IndexStore>) -> Self {
        let base_doc = store.current().max_doc();
        Self {
            store,
            buffer: Mutex::new(MutableBuffer::new(base_doc)),
            failed: AtomicBool::new(false),
        }
    }

    /// Analyze and buffer one document, returning its doc id
    pub fn add_document(&self, doc: Document) -> Result<DocId> {
        self.ensure_usable()?;
        let analyzed = AnalyzedDocument::analyze(self.store.tokenizer(), doc)?;
        self.buffer.lock().index_document(analyzed)
    }

    pub fn add_documents<I>(&self, docs: I) -> Result<Vec<DocId>>
    where
        I: IntoIterator<Item = Document>,
    {
        docs.into_iter().map(|doc| self.add_document(doc)).collect()
    }

    /// Publish pending documents as a new generation and return its number
    ///
    /// With nothing pending this is a no-op returning the current generation.
    pub fn commit(&self) -> Result<u64> {
        self.ensure_usable()?;
        let mut buffer = self.buffer.lock();
        if buffer.is_empty() {
            return Ok(self.store.current().number());
        }

        let pending = buffer.doc_count();
        let published = SegmentWriter::new(self.store.allocate_segment_id())
            .write_from_buffer(&buffer)
            .and_then(|segment| self.store.publish_segment(segment));

        let generation = match published {
            Ok(generation) => generation,
            Err(e) => {
                self.failed.store(true, Ordering::Release);
                warn!("Commit of {} documents failed: {}", pending, e);
                return Err(match e {
                    SifterError::Commit(msg) => SifterError::Commit(msg),
                    other => SifterError::Commit(other.to_string()),
                });
            }
        };
        buffer.reset(generation.max_doc());
        drop(buffer);

        match self.store.merge(false) {
            Ok(Some(merged)) => Ok(merged.number()),
            Ok(None) => Ok(generation.number()),
            Err(e) => {
                // The commit itself is durable; only the merge is abandoned
                warn!("Background merge after generation {} failed: {}", generation.number(), e);
                Ok(generation.number())
            }
        }
    }

    /// Drop pending documents; the next doc id follows the last commit again
    pub fn rollback(&self) -> Result<()> {
        self.ensure_usable()?;
        let mut buffer = self.buffer.lock();
        debug!("Rolled back {} pending documents", buffer.doc_count());
        buffer.reset(self.store.current().max_doc());
        Ok(())
    }

    pub fn pending_docs(&self) -> u32 {
        self.buffer.lock().doc_count()
    }

    /// Merge every committed segment into one, returning the generation number
    pub fn force_merge(&self) -> Result<u64> {
        self.ensure_usable()?;
        let _buffer = self.buffer.lock();
        match self.store.merge(true) {
            Ok(Some(generation)) => Ok(generation.number()),
            Ok(None) => Ok(self.store.current().number()),
            Err(e) => {
                self.failed.store(true, Ordering::Release);
                Err(match e {
                    SifterError::Commit(msg) => SifterError::Commit(msg),
                    other => SifterError::Commit(other.to_string()),
                })
            }
        }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Release the write lock, discarding pending documents
    pub fn close(self) {}

    fn ensure_usable(&self) -> Result<()> {
        if self.failed.load(Ordering::Acquire) {
            return Err(SifterError::Commit(
                "writer is unusable after a failed commit".to_string(),
            ));
        }
        Ok(())
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let pending = self.buffer.get_mut().doc_count();
        if pending > 0 {
            debug!("Discarding {} uncommitted documents", pending);
        }
        self.store.release_writer();
    }
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("pending_docs", &self.pending_docs())
            .field("failed", &self.failed.load(Ordering::Acquire))
            .finish()
    }
}
