//! Term query - exact match on a field

use crate::query::ast::{Matches, QueryNode};
use crate::query::context::QueryContext;
use crate::Result;

/// Query that matches documents containing an exact term in a field
///
/// This is the most basic query type: it reads the term's postings from
/// every segment and scores each posting with BM25.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermQuery {
    /// Field to search in
    pub field: String,
    /// Exact term to match
    pub term: String,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
        }
    }
}

impl QueryNode for TermQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<Matches> {
        let postings = ctx.postings(&self.field, &self.term)?;
        let doc_frequency = postings.len() as u32;

        let mut matches = Matches::empty();
        for posting in &postings {
            matches.docs.insert(posting.doc.as_u32());
            matches
                .scores
                .insert(posting.doc.as_u32(), ctx.bm25(&self.field, posting, doc_frequency));
        }
        Ok(matches)
    }

    fn query_type(&self) -> &'static str {
        "term"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use crate::query::nodes::test_support::store_with;

    #[test]
    fn test_term_query_execute() {
        let store = store_with(&["the quick fox", "the lazy dog", "fox fox fox"]);
        let generation = store.current();
        let settings = IndexSettings::default();
        let ctx = QueryContext::new(&generation, &settings);

        let matches = TermQuery::new("body", "fox").execute(&ctx).unwrap();
        assert_eq!(matches.docs.iter().collect::<Vec<_>>(), vec![0, 2]);
        assert!(matches.score(2) > matches.score(0));

        let none = TermQuery::new("body", "Fox").execute(&ctx).unwrap();
        assert!(none.docs.is_empty());
        let other_field = TermQuery::new("title", "fox").execute(&ctx).unwrap();
        assert!(other_field.docs.is_empty());
    }

    #[test]
    fn test_term_query_type() {
        assert_eq!(TermQuery::new("title", "rust").query_type(), "term");
    }
}
