//! Segment merging
//!
//! Merging concatenates a run of adjacent segments into one. Doc ids are
//! preserved, so the merged segment covers exactly the union of the input
//! ranges and existing match sets stay valid across the merge.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::reader::{Segment, SegmentMeta};
use super::statistics::FieldNorms;
use super::types::{Posting, SegmentId};
use super::writer::build_field;
use crate::error::{Result, SifterError};

/// Reason why segments should be merged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeReason {
    /// Segment count passed the configured threshold
    TooManySegments,
    /// Explicit request to collapse the index
    Forced,
}

/// A candidate merge operation
#[derive(Clone, Debug)]
pub struct MergeCandidate {
    /// Segment IDs to merge, in doc id order
    pub segment_ids: Vec<SegmentId>,
    pub doc_count: u64,
    pub reason: MergeReason,
}

/// Merge policy: collapse everything once the segment count passes a threshold
#[derive(Clone, Debug)]
pub struct MergePolicy {
    segment_threshold: usize,
}

impl MergePolicy {
    /// `segment_threshold` of zero disables automatic merges
    pub fn new(segment_threshold: usize) -> Self {
        Self { segment_threshold }
    }

    /// Find a merge for the segments of a generation
    pub fn find_merge(&self, segments: &[Arc<Segment>]) -> Option<MergeCandidate> {
        if self.segment_threshold == 0 || segments.len() <= self.segment_threshold {
            return None;
        }
        Some(Self::candidate(segments, MergeReason::TooManySegments))
    }

    /// Merge of every segment, `None` when there is nothing to merge
    pub fn forced(&self, segments: &[Arc<Segment>]) -> Option<MergeCandidate> {
        (segments.len() > 1).then(|| Self::candidate(segments, MergeReason::Forced))
    }

    fn candidate(segments: &[Arc<Segment>], reason: MergeReason) -> MergeCandidate {
        MergeCandidate {
            segment_ids: segments.iter().map(|s| s.id()).collect(),
            doc_count: segments.iter().map(|s| s.doc_count() as u64).sum(),
            reason,
        }
    }
}

/// Merge adjacent segments into a new segment with id `id`
pub fn merge_segments(id: SegmentId, segments: &[Arc<Segment>]) -> Result<Segment> {
    let first = segments
        .first()
        .ok_or_else(|| SifterError::Commit("nothing to merge".to_string()))?;

    for pair in segments.windows(2) {
        if pair[0].meta().end_doc() != pair[1].base_doc() {
            return Err(SifterError::Commit(format!(
                "cannot merge non-adjacent segments {} and {}",
                pair[0].id(),
                pair[1].id()
            )));
        }
    }

    let doc_count: u32 = segments.iter().map(|s| s.doc_count()).sum();
    let field_names: BTreeSet<&str> = segments.iter().flat_map(|s| s.field_names()).collect();

    let mut fields = BTreeMap::new();
    for name in field_names {
        // Segments are in doc id order, so appending keeps postings sorted
        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut lengths = Vec::with_capacity(doc_count as usize);

        for segment in segments {
            match segment.field(name) {
                Some(index) => {
                    for (term, meta) in index.terms().iter_terms() {
                        let postings = index.read_postings(meta)?;
                        terms.entry(term).or_default().extend(postings);
                    }
                    lengths.extend_from_slice(index.norms().lengths());
                }
                None => lengths.extend(std::iter::repeat(0).take(segment.doc_count() as usize)),
            }
        }

        let field = build_field(terms.into_iter().collect(), FieldNorms::from_lengths(lengths))?;
        fields.insert(name.to_string(), field);
    }

    let meta = SegmentMeta {
        id,
        base_doc: first.base_doc(),
        doc_count,
    };
    let stored = segments
        .iter()
        .flat_map(|s| s.stored_documents().iter().cloned())
        .collect();
    let facet_ordinals = segments
        .iter()
        .flat_map(|s| s.all_facet_ordinals().iter().cloned())
        .collect();

    Segment::from_parts(meta, fields, stored, facet_ordinals)
}
