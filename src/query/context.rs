//! Query execution context
//!
//! The `QueryContext` gives query nodes access to one generation plus the
//! scoring parameters, and caches per-field statistics for the duration of
//! a single search.

use std::collections::HashMap;

use parking_lot::RwLock;
use roaring::RoaringBitmap;

use crate::config::IndexSettings;
use crate::error::Result;
use crate::segment::{bm25_score, DocId, FieldStatistics, Generation, Posting};

/// Query execution context over one generation
pub struct QueryContext<'a> {
    generation: &'a Generation,
    settings: &'a IndexSettings,
    /// Field statistics cache, filled lazily
    field_stats: RwLock<HashMap<String, FieldStatistics>>,
}

impl<'a> QueryContext<'a> {
    pub fn new(generation: &'a Generation, settings: &'a IndexSettings) -> Self {
        Self {
            generation,
            settings,
            field_stats: RwLock::new(HashMap::new()),
        }
    }

    pub fn generation(&self) -> &'a Generation {
        self.generation
    }

    pub fn settings(&self) -> &'a IndexSettings {
        self.settings
    }

    /// Number of documents in the generation
    pub fn total_docs(&self) -> u32 {
        self.generation.num_docs()
    }

    pub fn all_docs(&self) -> RoaringBitmap {
        self.generation.all_docs()
    }

    pub fn postings(&self, field: &str, term: &str) -> Result<Vec<Posting>> {
        self.generation.postings(field, term)
    }

    pub fn field_stats(&self, field: &str) -> FieldStatistics {
        if let Some(stats) = self.field_stats.read().get(field) {
            return *stats;
        }
        let stats = self.generation.field_stats(field);
        self.field_stats.write().insert(field.to_string(), stats);
        stats
    }

    /// BM25 score of one posting of a term with document frequency `doc_frequency`
    pub fn bm25(&self, field: &str, posting: &Posting, doc_frequency: u32) -> f32 {
        let stats = self.field_stats(field);
        bm25_score(
            posting.term_frequency,
            doc_frequency,
            self.total_docs(),
            self.field_length(field, posting.doc),
            stats.avg_length(),
            &self.settings.bm25,
        )
    }

    fn field_length(&self, field: &str, doc: DocId) -> u32 {
        self.generation.field_length(field, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use crate::segment::IndexStore;

    #[test]
    fn test_field_stats_cached_and_scores_positive() {
        let store = IndexStore::in_memory(IndexSettings::default());
        let writer = store.writer().unwrap();
        writer.add_document(Document::new().with_text("body", "a b c")).unwrap();
        writer.add_document(Document::new().with_text("body", "a")).unwrap();
        writer.commit().unwrap();

        let generation = store.current();
        let settings = IndexSettings::default();
        let ctx = QueryContext::new(&generation, &settings);

        assert_eq!(ctx.total_docs(), 2);
        assert_eq!(ctx.field_stats("body").total_length, 4);
        assert_eq!(ctx.field_stats("body").avg_length(), 2.0);

        let postings = ctx.postings("body", "a").unwrap();
        let short = ctx.bm25("body", &postings[1], 2);
        let long = ctx.bm25("body", &postings[0], 2);
        assert!(short > long);
        assert!(long > 0.0);
    }
}
