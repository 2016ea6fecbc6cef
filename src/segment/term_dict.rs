//! Term dictionary using FST (Finite State Transducer)
//!
//! Use an FST term dictionary with per-term offsets into postings.
//! FST provides O(|key|) lookups, ordered iteration and automaton search.

use fst::automaton::Levenshtein;
use fst::{IntoStreamer, Map, MapBuilder, Streamer};

use crate::error::{Result, SifterError};

use super::types::PostingListMeta;

/// Term dictionary backed by FST
///
/// Maps terms to postings metadata (offset, length, doc frequency).
/// The FST stores a u64 value which indexes into a metadata array.
pub struct TermDictionary {
    /// FST mapping term -> index in metadata array
    fst: Map<Vec<u8>>,
    /// Metadata for each term (parallel to FST output values)
    metadata: Vec<PostingListMeta>,
}

impl TermDictionary {
    /// Create a term dictionary from FST data and metadata
    pub fn new(fst_data: Vec<u8>, metadata: Vec<PostingListMeta>) -> Result<Self> {
        let fst = Map::new(fst_data)
            .map_err(|e| SifterError::Corrupted(format!("term dictionary: {}", e)))?;
        if fst.len() != metadata.len() {
            return Err(SifterError::Corrupted(format!(
                "term dictionary has {} terms but {} metadata entries",
                fst.len(),
                metadata.len()
            )));
        }
        Ok(Self { fst, metadata })
    }

    /// Look up a term and return its postings metadata
    pub fn get(&self, term: &str) -> Option<&PostingListMeta> {
        self.fst
            .get(term.as_bytes())
            .and_then(|idx| self.metadata.get(idx as usize))
    }

    /// Check if a term exists
    pub fn contains(&self, term: &str) -> bool {
        self.fst.contains_key(term.as_bytes())
    }

    /// Get the number of terms
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Get the raw FST data (for serialization)
    pub fn fst_bytes(&self) -> &[u8] {
        self.fst.as_fst().as_bytes()
    }

    /// Get the metadata array (for serialization)
    pub fn metadata(&self) -> &[PostingListMeta] {
        &self.metadata
    }

    /// Iterate over all terms in the dictionary, in byte order
    pub fn iter_terms(&self) -> Vec<(String, &PostingListMeta)> {
        self.collect(self.fst.stream())
    }

    /// Terms within `max_edits` Levenshtein distance of `term`
    ///
    /// Returns `None` when the automaton for `term` would be too large to
    /// build; callers fall back to scanning [`TermDictionary::iter_terms`].
    pub fn fuzzy_terms(&self, term: &str, max_edits: u32) -> Option<Vec<(String, &PostingListMeta)>> {
        let automaton = Levenshtein::new(term, max_edits).ok()?;
        Some(self.collect(self.fst.search(automaton).into_stream()))
    }

    fn collect<'a, S>(&'a self, mut stream: S) -> Vec<(String, &'a PostingListMeta)>
    where
        S: for<'s> Streamer<'s, Item = (&'s [u8], u64)>,
    {
        let mut results = Vec::new();
        while let Some((key, idx)) = stream.next() {
            if let (Ok(term), Some(meta)) = (std::str::from_utf8(key), self.metadata.get(idx as usize)) {
                results.push((term.to_string(), meta));
            }
        }
        results
    }
}

impl std::fmt::Debug for TermDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermDictionary")
            .field("terms", &self.metadata.len())
            .finish()
    }
}

/// Builder for term dictionaries
pub struct TermDictionaryBuilder {
    terms: Vec<(String, PostingListMeta)>,
}

impl TermDictionaryBuilder {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    /// Add a term with its postings metadata
    pub fn add(&mut self, term: String, meta: PostingListMeta) {
        self.terms.push((term, meta));
    }

    /// Build the term dictionary
    pub fn build(mut self) -> Result<TermDictionary> {
        // FST requires sorted, unique input
        self.terms.sort_by(|a, b| a.0.cmp(&b.0));
        self.terms.dedup_by(|a, b| a.0 == b.0);

        let mut fst_builder = MapBuilder::memory();
        let mut metadata = Vec::with_capacity(self.terms.len());

        for (idx, (term, meta)) in self.terms.into_iter().enumerate() {
            fst_builder
                .insert(term.as_bytes(), idx as u64)
                .map_err(|e| SifterError::Corrupted(format!("term dictionary: {}", e)))?;
            metadata.push(meta);
        }

        let fst_data = fst_builder
            .into_inner()
            .map_err(|e| SifterError::Corrupted(format!("term dictionary: {}", e)))?;

        TermDictionary::new(fst_data, metadata)
    }
}

impl Default for TermDictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
