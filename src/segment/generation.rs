//! Generations: immutable point-in-time views of the index
//!
//! Every successful commit or merge publishes a new generation. A
//! generation never changes after publication; segments are shared between
//! generations through `Arc`, so a segment lives as long as the newest
//! generation that references it.

use std::collections::BTreeMap;
use std::sync::Arc;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use super::reader::Segment;
use super::statistics::FieldStatistics;
use super::types::{DocId, Ordinal, Posting};
use crate::error::Result;
use crate::models::StoredDocument;

/// A term and the number of documents containing it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    pub term: String,
    pub doc_freq: u32,
}

/// Immutable snapshot of the index
#[derive(Debug)]
pub struct Generation {
    number: u64,
    /// Segments ordered by doc id range
    segments: Vec<Arc<Segment>>,
    /// One past the highest committed doc id
    max_doc: u32,
}

impl Generation {
    /// Generation zero: no segments
    pub fn empty() -> Self {
        Self {
            number: 0,
            segments: Vec::new(),
            max_doc: 0,
        }
    }

    pub fn new(number: u64, segments: Vec<Arc<Segment>>) -> Self {
        let max_doc = segments.last().map(|s| s.meta().end_doc()).unwrap_or(0);
        Self {
            number,
            segments,
            max_doc,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    pub fn num_docs(&self) -> u32 {
        self.segments.iter().map(|s| s.doc_count()).sum()
    }

    /// Segment holding `doc`
    pub fn segment_for(&self, doc: DocId) -> Option<&Arc<Segment>> {
        let idx = self
            .segments
            .partition_point(|s| s.meta().end_doc() <= doc.0);
        self.segments.get(idx).filter(|s| s.contains(doc))
    }

    /// All distinct terms of `field`, sorted, with generation-wide doc frequency
    pub fn terms(&self, field: &str) -> Vec<TermInfo> {
        let mut merged: BTreeMap<String, u32> = BTreeMap::new();
        for segment in &self.segments {
            for (term, df) in segment.terms(field) {
                *merged.entry(term).or_insert(0) += df;
            }
        }
        merged
            .into_iter()
            .map(|(term, doc_freq)| TermInfo { term, doc_freq })
            .collect()
    }

    pub fn doc_freq(&self, field: &str, term: &str) -> u32 {
        self.segments.iter().map(|s| s.doc_freq(field, term)).sum()
    }

    /// Postings of `term` across all segments, in doc id order
    pub fn postings(&self, field: &str, term: &str) -> Result<Vec<Posting>> {
        let mut all = Vec::new();
        for segment in &self.segments {
            all.extend(segment.postings(field, term)?);
        }
        Ok(all)
    }

    pub fn field_stats(&self, field: &str) -> FieldStatistics {
        let mut stats = FieldStatistics::default();
        for segment in &self.segments {
            stats.merge(&segment.field_stats(field));
        }
        stats
    }

    pub fn field_length(&self, field: &str, doc: DocId) -> u32 {
        self.segment_for(doc)
            .map(|s| s.field_length(field, doc))
            .unwrap_or(0)
    }

    pub fn stored(&self, doc: DocId) -> Option<&StoredDocument> {
        self.segment_for(doc).and_then(|s| s.stored(doc))
    }

    pub fn facet_ordinals(&self, doc: DocId) -> &[Ordinal] {
        self.segment_for(doc)
            .map(|s| s.facet_ordinals(doc))
            .unwrap_or(&[])
    }

    /// Every committed doc id
    pub fn all_docs(&self) -> RoaringBitmap {
        let mut docs = RoaringBitmap::new();
        for segment in &self.segments {
            docs.insert_range(segment.base_doc()..segment.meta().end_doc());
        }
        docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use crate::segment::buffer::{AnalyzedDocument, MutableBuffer};
    use crate::segment::types::SegmentId;
    use crate::segment::writer::SegmentWriter;
    use crate::tokenizer::Tokenizer;

    fn segment(id: u64, base: u32, texts: &[&str]) -> Arc<Segment> {
        let mut buffer = MutableBuffer::new(base);
        for text in texts {
            let doc = Document::new().with_text("body", *text);
            let analyzed = AnalyzedDocument::analyze(&Tokenizer::whitespace(), doc).unwrap();
            buffer.index_document(analyzed).unwrap();
        }
        Arc::new(
            SegmentWriter::new(SegmentId::new(id))
                .write_from_buffer(&buffer)
                .unwrap(),
        )
    }

    fn generation() -> Generation {
        Generation::new(
            2,
            vec![
                segment(1, 0, &["the quick fox", "a dog"]),
                segment(2, 2, &["the lazy fox"]),
            ],
        )
    }

    #[test]
    fn test_empty_generation() {
        let gen = Generation::empty();
        assert_eq!(gen.number(), 0);
        assert_eq!(gen.max_doc(), 0);
        assert!(gen.terms("body").is_empty());
        assert!(gen.all_docs().is_empty());
        assert!(gen.stored(DocId(0)).is_none());
    }

    #[test]
    fn test_terms_merged_across_segments() {
        let gen = generation();
        let terms = gen.terms("body");
        let names: Vec<&str> = terms.iter().map(|t| t.term.as_str()).collect();

        assert_eq!(names, vec!["a", "dog", "fox", "lazy", "quick", "the"]);
        assert_eq!(terms[2].doc_freq, 2);
        assert_eq!(gen.doc_freq("body", "fox"), 2);
    }

    #[test]
    fn test_postings_in_doc_order() {
        let gen = generation();
        let docs: Vec<u32> = gen
            .postings("body", "the")
            .unwrap()
            .iter()
            .map(|p| p.doc.0)
            .collect();
        assert_eq!(docs, vec![0, 2]);
    }

    #[test]
    fn test_doc_lookup() {
        let gen = generation();
        assert_eq!(gen.max_doc(), 3);
        assert_eq!(gen.num_docs(), 3);
        assert_eq!(gen.segment_for(DocId(2)).unwrap().id(), SegmentId::new(2));
        assert_eq!(gen.stored(DocId(1)).unwrap().get("body"), Some("a dog"));
        assert!(gen.segment_for(DocId(3)).is_none());
        assert_eq!(gen.field_length("body", DocId(2)), 3);
        assert_eq!(gen.field_stats("body").total_length, 8);
        assert_eq!(gen.all_docs().len(), 3);
    }
}
