//! Mutable buffer for documents added since the last commit
//!
//! Commit turns the buffer into one immutable segment.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SifterError};
use crate::models::{Document, StoredDocument};
use crate::tokenizer::Tokenizer;

use super::types::{DocId, Ordinal, Posting};

/// Analyzed form of one field of a document
#[derive(Clone, Debug, Default)]
pub struct AnalyzedField {
    pub term_frequencies: HashMap<String, u32>,
    /// Number of tokens, duplicates included
    pub length: u32,
}

/// Document after analysis, ready for the buffer
#[derive(Clone, Debug)]
pub struct AnalyzedDocument {
    pub stored: StoredDocument,
    pub fields: BTreeMap<String, AnalyzedField>,
    pub facet_ordinals: Vec<Ordinal>,
}

impl AnalyzedDocument {
    /// Run every indexed field through the tokenizer
    ///
    /// Repeated fields with the same name are merged into one token stream.
    pub fn analyze(tokenizer: &Tokenizer, doc: Document) -> Result<Self> {
        let (fields, facets, ordinals) = doc.into_parts();

        let facet_ordinals = match (facets.is_empty(), ordinals) {
            (true, _) => Vec::new(),
            (false, Some(ordinals)) => ordinals,
            (false, None) => {
                return Err(SifterError::InvalidDocument(format!(
                    "{} facet label(s) were not resolved through FacetsConfig::build",
                    facets.len()
                )))
            }
        };

        let mut analyzed: BTreeMap<String, AnalyzedField> = BTreeMap::new();
        for field in fields.iter().filter(|f| f.indexed) {
            if field.name.is_empty() {
                return Err(SifterError::InvalidDocument(
                    "field name must not be empty".to_string(),
                ));
            }
            let entry = analyzed.entry(field.name.clone()).or_default();
            for token in tokenizer.tokenize(&field.value) {
                *entry.term_frequencies.entry(token).or_insert(0) += 1;
                entry.length += 1;
            }
        }

        Ok(Self {
            stored: StoredDocument { fields },
            fields: analyzed,
            facet_ordinals,
        })
    }
}

/// In-memory buffer for uncommitted writes
#[derive(Debug)]
pub struct MutableBuffer {
    /// Doc id of the first buffered document
    base_doc: u32,
    /// Field -> term -> postings
    terms: BTreeMap<String, HashMap<String, Vec<Posting>>>,
    /// Field -> (segment-local position, length)
    field_lengths: BTreeMap<String, Vec<(usize, u32)>>,
    stored: Vec<StoredDocument>,
    facet_ordinals: Vec<Vec<Ordinal>>,
    /// Approximate size in bytes
    size_bytes: usize,
}

impl MutableBuffer {
    /// Create an empty buffer whose first document gets `base_doc`
    pub fn new(base_doc: u32) -> Self {
        Self {
            base_doc,
            terms: BTreeMap::new(),
            field_lengths: BTreeMap::new(),
            stored: Vec::new(),
            facet_ordinals: Vec::new(),
            size_bytes: 0,
        }
    }

    /// Index a document into the buffer
    ///
    /// Returns the assigned DocId for this document.
    pub fn index_document(&mut self, doc: AnalyzedDocument) -> Result<DocId> {
        let local = self.stored.len();
        let doc_id = self
            .base_doc
            .checked_add(local as u32)
            .map(DocId)
            .ok_or_else(|| SifterError::InvalidDocument("document id space exhausted".to_string()))?;

        for (field, analyzed) in doc.fields {
            if analyzed.length == 0 {
                continue;
            }
            let postings = self.terms.entry(field.clone()).or_default();
            for (term, tf) in analyzed.term_frequencies {
                self.size_bytes += std::mem::size_of::<Posting>() + term.len();
                postings.entry(term).or_default().push(Posting::new(doc_id, tf));
            }
            self.field_lengths
                .entry(field)
                .or_default()
                .push((local, analyzed.length));
        }

        self.size_bytes += doc
            .stored
            .fields
            .iter()
            .map(|f| f.name.len() + f.value.len())
            .sum::<usize>();
        self.stored.push(doc.stored);
        self.facet_ordinals.push(doc.facet_ordinals);

        Ok(doc_id)
    }

    pub fn base_doc(&self) -> u32 {
        self.base_doc
    }

    /// Doc id the next buffered document will get
    pub fn next_doc(&self) -> u32 {
        self.base_doc + self.stored.len() as u32
    }

    pub fn doc_count(&self) -> u32 {
        self.stored.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Postings of every field (for segment writing)
    pub fn all_postings(&self) -> &BTreeMap<String, HashMap<String, Vec<Posting>>> {
        &self.terms
    }

    pub fn field_lengths(&self, field: &str) -> &[(usize, u32)] {
        self.field_lengths
            .get(field)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn stored(&self) -> &[StoredDocument] {
        &self.stored
    }

    pub fn facet_ordinals(&self) -> &[Vec<Ordinal>] {
        &self.facet_ordinals
    }

    /// Drop buffered documents; the next document gets `base_doc`
    pub fn reset(&mut self, base_doc: u32) {
        *self = Self::new(base_doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed(text: &str) -> AnalyzedDocument {
        let doc = Document::new().with_text("body", text);
        AnalyzedDocument::analyze(&Tokenizer::whitespace(), doc).unwrap()
    }

    #[test]
    fn test_analyze_merges_repeated_fields() {
        let doc = Document::new()
            .with_text("body", "a b")
            .with_text("body", "b c")
            .with_stored("id", "x y");
        let analyzed = AnalyzedDocument::analyze(&Tokenizer::whitespace(), doc).unwrap();

        let body = &analyzed.fields["body"];
        assert_eq!(body.length, 4);
        assert_eq!(body.term_frequencies["b"], 2);
        assert!(!analyzed.fields.contains_key("id"));
        assert_eq!(analyzed.stored.fields.len(), 3);
    }

    #[test]
    fn test_unresolved_facets_rejected() {
        let doc = Document::new().with_facet("category", ["c1"]);
        let err = AnalyzedDocument::analyze(&Tokenizer::whitespace(), doc).unwrap_err();
        assert!(matches!(err, SifterError::InvalidDocument(_)));
    }

    #[test]
    fn test_index_document_assigns_sequential_ids() {
        let mut buffer = MutableBuffer::new(10);

        let first = buffer.index_document(analyzed("hello world")).unwrap();
        let second = buffer.index_document(analyzed("hello")).unwrap();

        assert_eq!(first, DocId(10));
        assert_eq!(second, DocId(11));
        assert_eq!(buffer.next_doc(), 12);
        assert_eq!(buffer.all_postings()["body"]["hello"].len(), 2);
        assert_eq!(buffer.field_lengths("body"), &[(0, 2), (1, 1)]);
    }

    #[test]
    fn test_reset() {
        let mut buffer = MutableBuffer::new(0);
        buffer.index_document(analyzed("x")).unwrap();
        assert!(buffer.size_bytes() > 0);

        buffer.reset(1);
        assert!(buffer.is_empty());
        assert_eq!(buffer.next_doc(), 1);
        assert_eq!(buffer.size_bytes(), 0);
    }
}
