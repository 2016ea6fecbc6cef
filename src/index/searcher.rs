//! Query execution against a reader's generation
//!
//! Evaluation produces the full match bitmap and the scores of every match;
//! the searcher then keeps the best `n` with a bounded heap so that
//! `total_hits` is always exact.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use roaring::RoaringBitmap;
use tracing::debug;

use super::reader::IndexReader;
use crate::error::Result;
use crate::models::{MatchSet, ScoreDoc, StoredDocument, TopDocs};
use crate::query::{Matches, Query, QueryContext, QueryNode};
use crate::segment::{DocId, Generation};

/// Searches the generation bound to an [`IndexReader`]
#[derive(Clone, Debug)]
pub struct IndexSearcher {
    reader: IndexReader,
}

impl IndexSearcher {
    pub fn new(reader: IndexReader) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Best `n` hits in ranking order plus the exact hit count
    pub fn search(&self, query: &Query, n: usize) -> Result<TopDocs> {
        let (_, matches) = self.evaluate(query)?;
        let total_hits = matches.docs.len();
        let score_docs = top_n(&matches.docs, &matches, n);

        debug!(
            "{} query matched {} docs, returning {}",
            query.query_type(),
            total_hits,
            score_docs.len()
        );

        Ok(TopDocs {
            total_hits,
            score_docs,
        })
    }

    /// Every matching doc id, bound to the searched generation
    pub fn collect(&self, query: &Query) -> Result<MatchSet> {
        let (generation, matches) = self.evaluate(query)?;
        Ok(MatchSet::new(generation.number(), matches.docs))
    }

    pub fn count(&self, query: &Query) -> Result<u64> {
        Ok(self.evaluate(query)?.1.docs.len())
    }

    pub fn doc(&self, doc: DocId) -> Result<Option<StoredDocument>> {
        self.reader.document(doc)
    }

    /// Run `query` against the bound generation
    pub(crate) fn evaluate(&self, query: &Query) -> Result<(Arc<Generation>, Matches)> {
        let generation = self.reader.generation()?;
        let settings = self.reader.store().settings();
        let matches = {
            let ctx = QueryContext::new(&generation, settings);
            query.execute(&ctx)?
        };
        Ok((generation, matches))
    }
}

/// Heap entry ordered so that the worst ranked hit is the greatest
struct Ranked(ScoreDoc);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.ranking_cmp(&other.0)
    }
}

/// Best `n` of `docs` by score, ties by ascending doc id
pub(crate) fn top_n(docs: &RoaringBitmap, matches: &Matches, n: usize) -> Vec<ScoreDoc> {
    let n = n.min(usize::try_from(docs.len()).unwrap_or(usize::MAX));
    if n == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Ranked> = BinaryHeap::with_capacity(n);
    for doc in docs.iter() {
        let candidate = Ranked(ScoreDoc::new(DocId(doc), matches.score(doc)));
        if heap.len() < n {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
}
