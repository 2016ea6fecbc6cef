//! Immutable segment
//!
//! A segment covers the doc id range `base_doc..base_doc + doc_count` and
//! holds, per field, an FST term dictionary, the postings blob and the
//! document lengths. Stored fields and facet ordinals are kept per document.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SifterError};
use crate::models::StoredDocument;

use super::postings::read_posting_list;
use super::statistics::{FieldNorms, FieldStatistics};
use super::term_dict::TermDictionary;
use super::types::{DocId, Ordinal, Posting, PostingListMeta, SegmentId};

/// Metadata for a segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    /// First doc id of the segment
    pub base_doc: u32,
    pub doc_count: u32,
}

impl SegmentMeta {
    /// One past the last doc id of the segment
    pub fn end_doc(&self) -> u32 {
        self.base_doc + self.doc_count
    }

    pub fn contains(&self, doc: DocId) -> bool {
        doc.0 >= self.base_doc && doc.0 < self.end_doc()
    }
}

/// Inverted index of one field within a segment
#[derive(Debug)]
pub struct FieldIndex {
    terms: TermDictionary,
    postings: Vec<u8>,
    norms: FieldNorms,
}

impl FieldIndex {
    pub fn new(terms: TermDictionary, postings: Vec<u8>, norms: FieldNorms) -> Self {
        Self {
            terms,
            postings,
            norms,
        }
    }

    pub fn terms(&self) -> &TermDictionary {
        &self.terms
    }

    pub fn norms(&self) -> &FieldNorms {
        &self.norms
    }

    /// Decode the posting list behind a dictionary entry
    pub fn read_postings(&self, meta: &PostingListMeta) -> Result<Vec<Posting>> {
        read_posting_list(&self.postings, meta)
    }
}

/// On-disk form of one field
#[derive(Serialize, Deserialize)]
pub(crate) struct FieldData {
    name: String,
    fst: Vec<u8>,
    metadata: Vec<PostingListMeta>,
    postings: Vec<u8>,
    lengths: Vec<u32>,
}

/// On-disk form of a segment (bincode)
#[derive(Serialize, Deserialize)]
pub(crate) struct SegmentData {
    meta: SegmentMeta,
    fields: Vec<FieldData>,
    stored: Vec<StoredDocument>,
    facet_ordinals: Vec<Vec<Ordinal>>,
}

/// Immutable segment shared by every generation that references it
#[derive(Debug)]
pub struct Segment {
    meta: SegmentMeta,
    fields: BTreeMap<String, FieldIndex>,
    stored: Vec<StoredDocument>,
    facet_ordinals: Vec<Vec<Ordinal>>,
    /// File to delete once the last generation holding this segment is gone
    retired_file: Mutex<Option<PathBuf>>,
}

impl Segment {
    pub(crate) fn from_parts(
        meta: SegmentMeta,
        fields: BTreeMap<String, FieldIndex>,
        stored: Vec<StoredDocument>,
        facet_ordinals: Vec<Vec<Ordinal>>,
    ) -> Result<Self> {
        let count = meta.doc_count as usize;
        if stored.len() != count || facet_ordinals.len() != count {
            return Err(SifterError::Corrupted(format!(
                "{} holds {} documents but {} stored entries and {} facet entries",
                meta.id,
                count,
                stored.len(),
                facet_ordinals.len()
            )));
        }
        if let Some((name, _)) = fields.iter().find(|(_, f)| f.norms.lengths().len() != count) {
            return Err(SifterError::Corrupted(format!(
                "{} field '{}' has a norms table of the wrong size",
                meta.id, name
            )));
        }

        Ok(Self {
            meta,
            fields,
            stored,
            facet_ordinals,
            retired_file: Mutex::new(None),
        })
    }

    pub(crate) fn from_data(data: SegmentData) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for field in data.fields {
            let terms = TermDictionary::new(field.fst, field.metadata)?;
            let norms = FieldNorms::from_lengths(field.lengths);
            fields.insert(field.name, FieldIndex::new(terms, field.postings, norms));
        }
        Self::from_parts(data.meta, fields, data.stored, data.facet_ordinals)
    }

    pub(crate) fn to_data(&self) -> SegmentData {
        SegmentData {
            meta: self.meta,
            fields: self
                .fields
                .iter()
                .map(|(name, field)| FieldData {
                    name: name.clone(),
                    fst: field.terms.fst_bytes().to_vec(),
                    metadata: field.terms.metadata().to_vec(),
                    postings: field.postings.clone(),
                    lengths: field.norms.lengths().to_vec(),
                })
                .collect(),
            stored: self.stored.clone(),
            facet_ordinals: self.facet_ordinals.clone(),
        }
    }

    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    pub fn base_doc(&self) -> u32 {
        self.meta.base_doc
    }

    pub fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    pub fn contains(&self, doc: DocId) -> bool {
        self.meta.contains(doc)
    }

    fn local(&self, doc: DocId) -> Option<usize> {
        self.contains(doc)
            .then(|| (doc.0 - self.meta.base_doc) as usize)
    }

    /// Names of the indexed fields, sorted
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }

    pub fn field(&self, field: &str) -> Option<&FieldIndex> {
        self.fields.get(field)
    }

    /// Postings of `term` in `field`, empty when absent
    pub fn postings(&self, field: &str, term: &str) -> Result<Vec<Posting>> {
        match self.field(field) {
            Some(index) => match index.terms.get(term) {
                Some(meta) => index.read_postings(meta),
                None => Ok(Vec::new()),
            },
            None => Ok(Vec::new()),
        }
    }

    pub fn doc_freq(&self, field: &str, term: &str) -> u32 {
        self.field(field)
            .and_then(|index| index.terms.get(term))
            .map(|meta| meta.doc_frequency)
            .unwrap_or(0)
    }

    /// Terms of `field` with their document frequency, in byte order
    pub fn terms(&self, field: &str) -> Vec<(String, u32)> {
        self.field(field)
            .map(|index| {
                index
                    .terms
                    .iter_terms()
                    .into_iter()
                    .map(|(term, meta)| (term, meta.doc_frequency))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn field_length(&self, field: &str, doc: DocId) -> u32 {
        match (self.field(field), self.local(doc)) {
            (Some(index), Some(local)) => index.norms.get(local),
            _ => 0,
        }
    }

    pub fn field_stats(&self, field: &str) -> FieldStatistics {
        self.field(field)
            .map(|index| *index.norms.stats())
            .unwrap_or_default()
    }

    pub fn stored(&self, doc: DocId) -> Option<&StoredDocument> {
        self.local(doc).and_then(|local| self.stored.get(local))
    }

    pub fn stored_documents(&self) -> &[StoredDocument] {
        &self.stored
    }

    /// Facet ordinals of a document, empty when it has none
    pub fn facet_ordinals(&self, doc: DocId) -> &[Ordinal] {
        self.local(doc)
            .and_then(|local| self.facet_ordinals.get(local))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_facet_ordinals(&self) -> &[Vec<Ordinal>] {
        &self.facet_ordinals
    }

    /// Delete `path` when this segment is dropped
    pub(crate) fn retire(&self, path: PathBuf) {
        *self.retired_file.lock() = Some(path);
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        if let Some(path) = self.retired_file.get_mut().take() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(segment = %self.meta.id, path = %path.display(), "Removed retired segment file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(segment = %self.meta.id, error = %e, "Failed to remove retired segment file"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use crate::segment::buffer::{AnalyzedDocument, MutableBuffer};
    use crate::segment::writer::SegmentWriter;
    use crate::tokenizer::Tokenizer;

    fn segment(base: u32, texts: &[&str]) -> Segment {
        let mut buffer = MutableBuffer::new(base);
        for text in texts {
            let doc = Document::new().with_text("body", *text);
            let analyzed = AnalyzedDocument::analyze(&Tokenizer::whitespace(), doc).unwrap();
            buffer.index_document(analyzed).unwrap();
        }
        SegmentWriter::new(SegmentId::new(1))
            .write_from_buffer(&buffer)
            .unwrap()
    }

    #[test]
    fn test_lookup_by_global_doc_id() {
        let seg = segment(5, &["quick fox", "lazy dog dog"]);

        assert!(seg.contains(DocId(5)));
        assert!(!seg.contains(DocId(7)));
        assert_eq!(seg.doc_freq("body", "dog"), 1);
        assert_eq!(
            seg.postings("body", "dog").unwrap(),
            vec![Posting::new(DocId(6), 2)]
        );
        assert_eq!(seg.field_length("body", DocId(6)), 3);
        assert_eq!(seg.stored(DocId(5)).unwrap().get("body"), Some("quick fox"));
        assert!(seg.stored(DocId(4)).is_none());
        assert!(seg.postings("title", "dog").unwrap().is_empty());
    }

    #[test]
    fn test_data_roundtrip() {
        let seg = segment(0, &["a b", "b c"]);
        let bytes = bincode::serialize(&seg.to_data()).unwrap();
        let rebuilt = Segment::from_data(bincode::deserialize(&bytes).unwrap()).unwrap();

        assert_eq!(rebuilt.meta(), seg.meta());
        assert_eq!(rebuilt.terms("body"), seg.terms("body"));
        assert_eq!(rebuilt.field_stats("body"), seg.field_stats("body"));
    }

    #[test]
    fn test_retired_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segment_1.bin");
        std::fs::write(&path, b"x").unwrap();

        let seg = segment(0, &["a"]);
        seg.retire(path.clone());
        drop(seg);

        assert!(!path.exists());
    }
}
