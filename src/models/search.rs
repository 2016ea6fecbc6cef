use std::cmp::Ordering;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::segment::DocId;

/// A matching document with its relevance score
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreDoc {
    pub doc: DocId,
    pub score: f32,
}

impl ScoreDoc {
    pub fn new(doc: DocId, score: f32) -> Self {
        Self { doc, score }
    }

    /// Ranking order: higher score first, ties by ascending doc id
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc.cmp(&other.doc))
    }
}

/// Result page of a search
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TopDocs {
    /// Exact number of matching documents
    pub total_hits: u64,
    /// At most `n` best hits in ranking order
    pub score_docs: Vec<ScoreDoc>,
}

impl TopDocs {
    pub fn max_score(&self) -> Option<f32> {
        self.score_docs.first().map(|d| d.score)
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.score_docs.iter().map(|d| d.doc).collect()
    }
}

/// Full set of documents matching a query in one generation
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSet {
    generation: u64,
    docs: RoaringBitmap,
}

impl MatchSet {
    pub(crate) fn new(generation: u64, docs: RoaringBitmap) -> Self {
        Self { generation, docs }
    }

    /// Generation number the matches were computed against
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn docs(&self) -> &RoaringBitmap {
        &self.docs
    }

    pub fn len(&self) -> u64 {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, doc: DocId) -> bool {
        self.docs.contains(doc.as_u32())
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.docs.iter().map(DocId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_order() {
        let mut docs = vec![
            ScoreDoc::new(DocId(3), 1.0),
            ScoreDoc::new(DocId(1), 2.0),
            ScoreDoc::new(DocId(0), 1.0),
        ];
        docs.sort_by(ScoreDoc::ranking_cmp);

        let ids: Vec<u32> = docs.iter().map(|d| d.doc.as_u32()).collect();
        assert_eq!(ids, vec![1, 0, 3]);
    }

    #[test]
    fn test_match_set() {
        let bitmap: RoaringBitmap = [0u32, 2, 5].into_iter().collect();
        let set = MatchSet::new(4, bitmap);

        assert_eq!(set.generation(), 4);
        assert_eq!(set.len(), 3);
        assert!(set.contains(DocId(2)));
        assert!(!set.contains(DocId(1)));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![DocId(0), DocId(2), DocId(5)]);
    }
}
