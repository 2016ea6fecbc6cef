//! Concrete query node implementations
//!
//! This module provides implementations of the `QueryNode` trait for
//! each query type of the `Query` tree.

mod all_docs;
mod bool_query;
mod fuzzy_query;
mod term_query;

pub use all_docs::MatchAllQuery;
pub use bool_query::BoolQuery;
pub use fuzzy_query::{levenshtein_distance, FuzzyExpansion, FuzzyQuery, MAX_EDITS};
pub use term_query::TermQuery;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::config::IndexSettings;
    use crate::models::Document;
    use crate::segment::IndexStore;

    /// Store with one committed document per text in field `body`
    pub(crate) fn store_with(texts: &[&str]) -> Arc<IndexStore> {
        let store = IndexStore::in_memory(IndexSettings::default());
        let writer = store.writer().unwrap();
        for text in texts {
            writer
                .add_document(Document::new().with_text("body", *text))
                .unwrap();
        }
        writer.commit().unwrap();
        store
    }
}
