//! Core types for the segment-based index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment identifier (monotonically increasing per store)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Document number, unique within one index store
///
/// Assigned densely in commit order and never reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Taxonomy ordinal of a facet label
pub type Ordinal = u32;

/// A single posting entry within a posting list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: DocId,
    /// Term frequency in this document
    pub term_frequency: u32,
}

impl Posting {
    pub fn new(doc: DocId, term_frequency: u32) -> Self {
        Self {
            doc,
            term_frequency,
        }
    }
}

/// Posting list metadata stored in the term dictionary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingListMeta {
    /// Offset in the field's postings blob
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
    /// Document frequency (number of documents containing this term)
    pub doc_frequency: u32,
    /// Total term frequency across all documents
    pub total_term_frequency: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_id() {
        let id = SegmentId::new(42);
        assert_eq!(id.0, 42);
        assert_eq!(id.next().0, 43);
        assert_eq!(format!("{}", id), "segment_42");
    }

    #[test]
    fn test_doc_id() {
        let doc = DocId::new(100);
        assert_eq!(doc.as_u32(), 100);
        assert_eq!(doc.as_usize(), 100);
        assert_eq!(doc.to_string(), "doc#100");
        assert!(DocId(1) < DocId(2));
    }
}
