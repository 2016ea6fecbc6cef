//! Index store: owner of the current generation
//!
//! Readers load the current generation lock-free through `ArcSwap`. The
//! single writer publishes new generations under the manifest lock, so
//! generation numbers strictly increase and a published generation is
//! never mutated.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::generation::Generation;
use super::manifest::{ManifestEntry, SegmentManifest};
use super::merge::{merge_segments, MergeCandidate, MergePolicy};
use super::reader::Segment;
use super::store::SegmentStore;
use super::types::SegmentId;
use crate::config::IndexSettings;
use crate::error::{Result, SifterError};
use crate::index::{IndexReader, IndexWriter};
use crate::tokenizer::Tokenizer;

/// Append-only index made of generations
pub struct IndexStore {
    current: ArcSwap<Generation>,
    /// Committed manifest; its lock serializes publishes
    manifest: Mutex<SegmentManifest>,
    /// On-disk store, `None` for in-memory indexes
    store: Option<SegmentStore>,
    settings: IndexSettings,
    tokenizer: Tokenizer,
    closed: AtomicBool,
    writer_active: AtomicBool,
}

impl IndexStore {
    /// Create an empty index that lives only in memory
    pub fn in_memory(settings: IndexSettings) -> Arc<Self> {
        Arc::new(Self::build(
            Generation::empty(),
            SegmentManifest::new(),
            None,
            settings,
        ))
    }

    /// Open (or create) an index in `dir`, recovering the last committed generation
    pub fn open<P: AsRef<Path>>(dir: P, settings: IndexSettings) -> Result<Arc<Self>> {
        let store = SegmentStore::new(dir, settings.sync_on_commit)?;
        let manifest = store.load_manifest()?.unwrap_or_default();

        let mut segments: Vec<Arc<Segment>> = Vec::with_capacity(manifest.segment_count());
        let mut next_doc = 0u32;
        for entry in &manifest.segments {
            if entry.meta.base_doc != next_doc {
                return Err(SifterError::Corrupted(format!(
                    "{} starts at doc {}, expected {}",
                    entry.meta.id, entry.meta.base_doc, next_doc
                )));
            }
            let segment = store.read_segment(entry)?;
            next_doc = segment.meta().end_doc();
            segments.push(Arc::new(segment));
        }

        let removed = store.remove_orphans(&manifest)?;
        let generation = Generation::new(manifest.generation, segments);
        info!(
            "Opened index at {} (generation {}, {} segments, {} docs, {} orphaned files removed)",
            store.base_dir().display(),
            generation.number(),
            generation.segment_count(),
            generation.num_docs(),
            removed
        );

        Ok(Arc::new(Self::build(
            generation,
            manifest,
            Some(store),
            settings,
        )))
    }

    fn build(
        generation: Generation,
        manifest: SegmentManifest,
        store: Option<SegmentStore>,
        settings: IndexSettings,
    ) -> Self {
        Self {
            current: ArcSwap::from_pointee(generation),
            manifest: Mutex::new(manifest),
            store,
            tokenizer: Tokenizer::new(&settings.tokenizer_config),
            settings,
            closed: AtomicBool::new(false),
            writer_active: AtomicBool::new(false),
        }
    }

    /// Latest published generation
    pub fn current(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Directory of an on-disk index
    pub fn data_dir(&self) -> Option<&Path> {
        self.store.as_ref().map(|s| s.base_dir())
    }

    /// Reject new readers and writers; later commits fail
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Closed index store at generation {}", self.current().number());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Take the single-writer lock
    pub fn writer(self: &Arc<Self>) -> Result<IndexWriter> {
        if self.is_closed() {
            return Err(SifterError::StoreClosed);
        }
        self.writer_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SifterError::WriterLocked)?;
        debug!("Write lock acquired");
        Ok(IndexWriter::new(Arc::clone(self)))
    }

    /// Reader bound to the current generation
    pub fn reader(self: &Arc<Self>) -> Result<IndexReader> {
        IndexReader::open(self)
    }

    pub(crate) fn release_writer(&self) {
        self.writer_active.store(false, Ordering::Release);
        debug!("Write lock released");
    }

    pub(crate) fn allocate_segment_id(&self) -> SegmentId {
        self.manifest.lock().allocate_segment_id()
    }

    /// Append a committed segment and publish the next generation
    pub(crate) fn publish_segment(&self, segment: Segment) -> Result<Arc<Generation>> {
        let mut manifest = self.manifest.lock();
        self.ensure_open()?;

        let current = self.current();
        if segment.base_doc() != current.max_doc() {
            return Err(SifterError::Commit(format!(
                "{} starts at doc {} but generation {} ends at {}",
                segment.id(),
                segment.base_doc(),
                current.number(),
                current.max_doc()
            )));
        }

        let entry = self.persist(&segment)?;
        let mut next = manifest.clone();
        next.add_segment(entry);
        if let Some(store) = &self.store {
            store.save_manifest(&next)?;
        }
        *manifest = next;

        let mut segments = current.segments().to_vec();
        segments.push(Arc::new(segment));
        let generation = Arc::new(Generation::new(manifest.generation, segments));
        self.current.store(Arc::clone(&generation));

        info!(
            "Committed generation {} ({} segments, {} docs)",
            generation.number(),
            generation.segment_count(),
            generation.num_docs()
        );
        Ok(generation)
    }

    /// Merge segments of the current generation
    ///
    /// `forced` collapses every segment; otherwise the merge policy decides.
    /// Returns `None` when there was nothing to merge.
    pub(crate) fn merge(&self, forced: bool) -> Result<Option<Arc<Generation>>> {
        let mut manifest = self.manifest.lock();
        self.ensure_open()?;

        let current = self.current();
        let policy = MergePolicy::new(self.settings.merge_segment_threshold);
        let candidate = if forced {
            policy.forced(current.segments())
        } else {
            policy.find_merge(current.segments())
        };
        let Some(candidate) = candidate else {
            return Ok(None);
        };

        let (before, selected, after) = split_candidate(current.segments(), &candidate);
        let mut next = manifest.clone();
        let merged = merge_segments(next.allocate_segment_id(), &selected)?;
        let entry = self.persist(&merged)?;
        next.replace_segments(&candidate.segment_ids, entry);
        if let Some(store) = &self.store {
            store.save_manifest(&next)?;
        }
        *manifest = next;

        let merged_id = merged.id();
        let mut segments = before;
        segments.push(Arc::new(merged));
        segments.extend(after);
        let generation = Arc::new(Generation::new(manifest.generation, segments));
        self.current.store(Arc::clone(&generation));

        if let Some(store) = &self.store {
            for segment in &selected {
                segment.retire(store.segment_path(segment.id()));
            }
        }

        info!(
            "Merged {} segments into {} ({:?}, {} docs), generation {}",
            candidate.segment_ids.len(),
            merged_id,
            candidate.reason,
            candidate.doc_count,
            generation.number()
        );
        Ok(Some(generation))
    }

    fn persist(&self, segment: &Segment) -> Result<ManifestEntry> {
        match &self.store {
            Some(store) => store.write_segment(segment),
            None => Ok(ManifestEntry {
                meta: *segment.meta(),
                checksum: 0,
                size_bytes: 0,
            }),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SifterError::Commit("index store is closed".to_string()));
        }
        Ok(())
    }
}

type SegmentList = Vec<Arc<Segment>>;

/// Split segments into (before, selected, after) around a merge candidate
fn split_candidate(
    segments: &[Arc<Segment>],
    candidate: &MergeCandidate,
) -> (SegmentList, SegmentList, SegmentList) {
    let mut before = Vec::new();
    let mut selected = Vec::new();
    let mut after = Vec::new();
    for segment in segments {
        if candidate.segment_ids.contains(&segment.id()) {
            selected.push(Arc::clone(segment));
        } else if selected.is_empty() {
            before.push(Arc::clone(segment));
        } else {
            after.push(Arc::clone(segment));
        }
    }
    (before, selected, after)
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("generation", &self.current().number())
            .field("data_dir", &self.data_dir())
            .field("closed", &self.is_closed())
            .finish()
    }
}
