//! Append-only taxonomy of facet labels
//!
//! Every label is assigned a small integer ordinal on first sight. Ordinal 0
//! is the root; dimensions are its children. Ordinals are never reused or
//! renumbered, so documents indexed with them stay valid for the lifetime
//! of the taxonomy.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::path::FacetPath;
use crate::error::{Result, SifterError};
use crate::segment::{write_atomic, Ordinal};
use crate::version::{EngineVersion, INDEX_FORMAT_VERSION};

pub const TAXONOMY_FILE: &str = "taxonomy.bin";

/// Ordinal of the taxonomy root
pub const ROOT_ORDINAL: Ordinal = 0;

/// On-disk form of the taxonomy
#[derive(Serialize, Deserialize)]
struct TaxonomyFile {
    format_version: u32,
    checksum: u32,
    /// bincode of the labels, ordinal `i + 1` at index `i`
    labels: Vec<u8>,
}

#[derive(Clone, Debug)]
struct TaxonomyData {
    /// Label of ordinal `i + 1`
    labels: Vec<FacetPath>,
    /// Parent of ordinal `i + 1`
    parents: Vec<Ordinal>,
    /// Children per ordinal, root included, in insertion order
    children: Vec<Vec<Ordinal>>,
    ordinals: HashMap<FacetPath, Ordinal>,
}

impl TaxonomyData {
    fn new() -> Self {
        Self {
            labels: Vec::new(),
            parents: Vec::new(),
            children: vec![Vec::new()],
            ordinals: HashMap::new(),
        }
    }

    fn from_labels(labels: Vec<FacetPath>) -> Result<Self> {
        let mut data = Self::new();
        for label in labels {
            if data.ordinals.contains_key(&label) {
                return Err(SifterError::Corrupted(format!(
                    "duplicate taxonomy label '{}'",
                    label
                )));
            }
            let parent = match label.parent() {
                Some(parent) => data.ordinals.get(&parent).copied().ok_or_else(|| {
                    SifterError::Corrupted(format!("taxonomy label '{}' precedes its parent", label))
                })?,
                None => ROOT_ORDINAL,
            };
            data.push(label, parent);
        }
        Ok(data)
    }

    /// Number of ordinals including the root
    fn size(&self) -> usize {
        self.labels.len() + 1
    }

    fn push(&mut self, label: FacetPath, parent: Ordinal) -> Ordinal {
        let ordinal = self.size() as Ordinal;
        self.labels.push(label.clone());
        self.parents.push(parent);
        self.children.push(Vec::new());
        self.children[parent as usize].push(ordinal);
        self.ordinals.insert(label, ordinal);
        ordinal
    }

    fn get_or_add(&mut self, path: &FacetPath) -> Ordinal {
        let mut parent = ROOT_ORDINAL;
        for prefix in path.prefixes() {
            parent = match self.ordinals.get(&prefix) {
                Some(&ordinal) => ordinal,
                None => self.push(prefix, parent),
            };
        }
        parent
    }

    fn ordinal(&self, path: &FacetPath) -> Option<Ordinal> {
        self.ordinals.get(path).copied()
    }

    fn path(&self, ordinal: Ordinal) -> Option<&FacetPath> {
        let index = (ordinal as usize).checked_sub(1)?;
        self.labels.get(index)
    }

    fn parent(&self, ordinal: Ordinal) -> Option<Ordinal> {
        let index = (ordinal as usize).checked_sub(1)?;
        self.parents.get(index).copied()
    }

    fn children(&self, ordinal: Ordinal) -> &[Ordinal] {
        self.children
            .get(ordinal as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Adds labels to the taxonomy
///
/// Labels added since the last [`TaxonomyWriter::commit`] resolve to stable
/// ordinals at once but are only visible to readers after the commit.
pub struct TaxonomyWriter {
    pending: Mutex<TaxonomyData>,
    committed: ArcSwap<TaxonomyData>,
    dir: Option<PathBuf>,
}

impl TaxonomyWriter {
    pub fn in_memory() -> Self {
        Self::with_data(TaxonomyData::new(), None)
    }

    /// Open or create the taxonomy stored in `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let data = load(dir)?.unwrap_or_else(TaxonomyData::new);
        info!(
            "Opened taxonomy at {:?} with {} ordinals",
            dir,
            data.size()
        );
        Ok(Self::with_data(data, Some(dir.to_path_buf())))
    }

    fn with_data(data: TaxonomyData, dir: Option<PathBuf>) -> Self {
        Self {
            committed: ArcSwap::from_pointee(data.clone()),
            pending: Mutex::new(data),
            dir,
        }
    }

    /// Ordinal of `path`, adding it and any missing ancestors
    pub fn add_path(&self, path: &FacetPath) -> Result<Ordinal> {
        path.validate()?;
        Ok(self.pending.lock().get_or_add(path))
    }

    /// Parent of an ordinal known to this writer
    pub fn parent(&self, ordinal: Ordinal) -> Option<Ordinal> {
        self.pending.lock().parent(ordinal)
    }

    /// Persist pending labels and publish them to new readers
    pub fn commit(&self) -> Result<()> {
        let snapshot = self.pending.lock().clone();
        if let Some(dir) = &self.dir {
            let labels = bincode::serialize(&snapshot.labels)?;
            let file = TaxonomyFile {
                format_version: INDEX_FORMAT_VERSION,
                checksum: crc32fast::hash(&labels),
                labels,
            };
            let bytes = bincode::serialize(&file)?;
            write_atomic(&dir.join(TAXONOMY_FILE), &bytes, true)?;
        }
        debug!("Committed taxonomy with {} ordinals", snapshot.size());
        self.committed.store(Arc::new(snapshot));
        Ok(())
    }

    /// Number of ordinals including the root and uncommitted labels
    pub fn size(&self) -> usize {
        self.pending.lock().size()
    }

    /// Commit pending labels and release the writer
    pub fn close(self) -> Result<()> {
        self.commit()
    }

    fn has_pending(&self) -> bool {
        self.pending.lock().size() != self.committed.load().size()
    }
}

impl Drop for TaxonomyWriter {
    // Ordinals handed out may already be durable in index segments and must
    // not be reassigned after a restart.
    fn drop(&mut self) {
        if self.dir.is_none() || !self.has_pending() {
            return;
        }
        warn!("Taxonomy writer dropped with uncommitted labels, committing");
        if let Err(e) = self.commit() {
            warn!("Failed to commit taxonomy on drop: {}", e);
        }
    }
}

impl std::fmt::Debug for TaxonomyWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyWriter")
            .field("size", &self.size())
            .field("dir", &self.dir)
            .finish()
    }
}

fn load(dir: &Path) -> Result<Option<TaxonomyData>> {
    let path = dir.join(TAXONOMY_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path)?;
    let file: TaxonomyFile = bincode::deserialize(&bytes)?;
    if !EngineVersion::current().is_compatible(file.format_version) {
        return Err(SifterError::IncompatibleFormat {
            expected: INDEX_FORMAT_VERSION,
            actual: file.format_version,
        });
    }
    if crc32fast::hash(&file.labels) != file.checksum {
        return Err(SifterError::Corrupted(format!(
            "checksum mismatch in {:?}",
            path
        )));
    }
    let labels: Vec<FacetPath> = bincode::deserialize(&file.labels)?;
    TaxonomyData::from_labels(labels).map(Some)
}

/// Read-only view of a committed taxonomy
#[derive(Clone, Debug)]
pub struct TaxonomyReader {
    data: Arc<TaxonomyData>,
}

impl TaxonomyReader {
    /// Snapshot of the writer's last commit
    pub fn open(writer: &TaxonomyWriter) -> Self {
        Self {
            data: writer.committed.load_full(),
        }
    }

    /// Taxonomy persisted in `dir`; empty when nothing was committed there
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let data = load(dir.as_ref())?.unwrap_or_else(TaxonomyData::new);
        Ok(Self {
            data: Arc::new(data),
        })
    }

    pub fn ordinal(&self, path: &FacetPath) -> Option<Ordinal> {
        self.data.ordinal(path)
    }

    pub fn path(&self, ordinal: Ordinal) -> Option<&FacetPath> {
        self.data.path(ordinal)
    }

    /// `None` for the root and unknown ordinals
    pub fn parent(&self, ordinal: Ordinal) -> Option<Ordinal> {
        self.data.parent(ordinal)
    }

    pub fn children(&self, ordinal: Ordinal) -> &[Ordinal] {
        self.data.children(ordinal)
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }
}
