//! Segment manifest for tracking live segments
//!
//! Commit protocol:
//! 1. Write the new segment file to a temp name, fsync, rename
//! 2. Write manifest.json.tmp, fsync
//! 3. Atomic rename to manifest.json
//!
//! A crash before step 3 leaves the previous manifest in place; segment
//! files it does not reference are removed on the next open.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::reader::SegmentMeta;
use super::types::SegmentId;
use crate::error::Result;
use crate::version::INDEX_FORMAT_VERSION;

/// Manifest entry for a segment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub meta: SegmentMeta,
    /// CRC32 of the segment file
    pub checksum: u32,
    pub size_bytes: u64,
}

/// The segment manifest tracks all live segments of the committed generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentManifest {
    /// Index format version the store was written with
    pub format_version: u32,
    /// Generation number (incremented on each publish)
    pub generation: u64,
    /// Next segment ID to allocate
    pub next_segment_id: SegmentId,
    /// Live segments in doc id order
    pub segments: Vec<ManifestEntry>,
    /// Seconds since the epoch of the last update
    pub updated_at: u64,
}

impl SegmentManifest {
    pub fn new() -> Self {
        Self {
            format_version: INDEX_FORMAT_VERSION,
            generation: 0,
            next_segment_id: SegmentId::new(0),
            segments: Vec::new(),
            updated_at: 0,
        }
    }

    pub fn allocate_segment_id(&mut self) -> SegmentId {
        let id = self.next_segment_id;
        self.next_segment_id = id.next();
        id
    }

    /// Append a freshly committed segment and bump the generation
    pub fn add_segment(&mut self, entry: ManifestEntry) {
        self.segments.push(entry);
        self.bump();
    }

    /// Swap the run of `replaced` segments for the merged one
    pub fn replace_segments(&mut self, replaced: &[SegmentId], merged: ManifestEntry) {
        let position = self
            .segments
            .iter()
            .position(|e| replaced.contains(&e.meta.id))
            .unwrap_or(self.segments.len());
        self.segments.retain(|e| !replaced.contains(&e.meta.id));
        self.segments.insert(position.min(self.segments.len()), merged);
        self.bump();
    }

    fn bump(&mut self) {
        self.generation += 1;
        self.updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
    }

    pub fn total_doc_count(&self) -> u64 {
        self.segments.iter().map(|e| e.meta.doc_count as u64).sum()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.segments.iter().map(|e| e.size_bytes).sum()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get_segment(&self, segment_id: SegmentId) -> Option<&ManifestEntry> {
        self.segments.iter().find(|e| e.meta.id == segment_id)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

impl Default for SegmentManifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: SegmentId, base_doc: u32, doc_count: u32) -> ManifestEntry {
        ManifestEntry {
            meta: SegmentMeta {
                id,
                base_doc,
                doc_count,
            },
            checksum: 0xdead_beef,
            size_bytes: 128,
        }
    }

    #[test]
    fn test_manifest_serialization() {
        let mut manifest = SegmentManifest::new();
        let id = manifest.allocate_segment_id();
        manifest.add_segment(entry(id, 0, 1000));

        let json = manifest.to_json().unwrap();
        let restored = SegmentManifest::from_json(&json).unwrap();

        assert_eq!(restored.generation, 1);
        assert_eq!(restored.format_version, INDEX_FORMAT_VERSION);
        assert_eq!(restored.segment_count(), 1);
        assert_eq!(restored.total_doc_count(), 1000);
        assert_eq!(restored.next_segment_id, SegmentId::new(1));
        assert_eq!(restored.get_segment(id).unwrap().checksum, 0xdead_beef);
    }

    #[test]
    fn test_replace_segments_keeps_order() {
        let mut manifest = SegmentManifest::new();
        let ids: Vec<_> = (0..3).map(|_| manifest.allocate_segment_id()).collect();
        manifest.add_segment(entry(ids[0], 0, 10));
        manifest.add_segment(entry(ids[1], 10, 5));
        manifest.add_segment(entry(ids[2], 15, 5));

        let merged = manifest.allocate_segment_id();
        manifest.replace_segments(&ids[..2], entry(merged, 0, 15));

        let order: Vec<_> = manifest.segments.iter().map(|e| e.meta.id).collect();
        assert_eq!(order, vec![merged, ids[2]]);
        assert_eq!(manifest.generation, 4);
        assert_eq!(manifest.total_doc_count(), 20);
        assert_eq!(manifest.total_size_bytes(), 256);
    }

    #[test]
    fn test_invalid_json() {
        assert!(SegmentManifest::from_json(b"{not json").is_err());
    }
}
