//! Result grouping by stored field value
//!
//! Every match of a query is assigned to the group of its stored `field`
//! value. Totals always cover all matches; `offset` and `limit` only select
//! which groups are returned.

use std::cmp::Ordering;
use std::collections::HashMap;

use roaring::RoaringBitmap;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::index::searcher::top_n;
use crate::index::IndexSearcher;
use crate::models::ScoreDoc;
use crate::query::Query;
use crate::segment::DocId;

/// One group of hits sharing a field value
#[derive(Clone, Debug, Serialize)]
pub struct GroupDocs {
    /// `None` for documents without the field
    pub group_value: Option<String>,
    pub total_hits: u64,
    pub max_score: f32,
    /// Best hits of the group in ranking order
    pub score_docs: Vec<ScoreDoc>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TopGroups {
    pub total_hit_count: u64,
    pub total_group_count: usize,
    pub groups: Vec<GroupDocs>,
}

/// Groups search results by the stored value of one field
#[derive(Clone, Debug)]
pub struct GroupingSearch {
    field: String,
    docs_per_group: usize,
}

impl GroupingSearch {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            docs_per_group: 1,
        }
    }

    pub fn with_docs_per_group(mut self, n: usize) -> Self {
        self.docs_per_group = n;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn search(
        &self,
        searcher: &IndexSearcher,
        query: &Query,
        offset: usize,
        limit: usize,
    ) -> Result<TopGroups> {
        let (generation, matches) = searcher.evaluate(query)?;

        let mut members: HashMap<Option<String>, RoaringBitmap> = HashMap::new();
        for doc in matches.docs.iter() {
            let value = generation
                .stored(DocId(doc))
                .and_then(|stored| stored.get(&self.field))
                .map(str::to_string);
            members.entry(value).or_default().insert(doc);
        }

        let mut groups: Vec<GroupDocs> = members
            .into_iter()
            .map(|(group_value, docs)| {
                let max_score = docs
                    .iter()
                    .map(|doc| matches.score(doc))
                    .fold(f32::NEG_INFINITY, f32::max);
                GroupDocs {
                    group_value,
                    total_hits: docs.len(),
                    max_score,
                    score_docs: top_n(&docs, &matches, self.docs_per_group),
                }
            })
            .collect();
        groups.sort_by(group_order);

        let total_group_count = groups.len();
        debug!(
            "grouped {} hits on '{}' into {} groups",
            matches.docs.len(),
            self.field,
            total_group_count
        );

        Ok(TopGroups {
            total_hit_count: matches.docs.len(),
            total_group_count,
            groups: groups.into_iter().skip(offset).take(limit).collect(),
        })
    }
}

/// Most hits first, then best score, then value with `None` last
fn group_order(a: &GroupDocs, b: &GroupDocs) -> Ordering {
    b.total_hits
        .cmp(&a.total_hits)
        .then_with(|| b.max_score.total_cmp(&a.max_score))
        .then_with(|| match (&a.group_value, &b.group_value) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use crate::models::Document;
    use crate::segment::IndexStore;

    fn searcher(docs: Vec<Document>) -> IndexSearcher {
        let store = IndexStore::in_memory(IndexSettings::default());
        let writer = store.writer().unwrap();
        writer.add_documents(docs).unwrap();
        writer.commit().unwrap();
        IndexSearcher::new(store.reader().unwrap())
    }

    fn doc(body: &str, group: Option<&str>) -> Document {
        let doc = Document::new().with_text("body", body);
        match group {
            Some(value) => doc.with_stored("group", value),
            None => doc,
        }
    }

    fn values(top: &TopGroups) -> Vec<Option<&str>> {
        top.groups.iter().map(|g| g.group_value.as_deref()).collect()
    }

    #[test]
    fn test_groups_by_value() {
        let searcher = searcher(vec![
            doc("random text", Some("v1")),
            doc("random words", Some("v1")),
            doc("random stuff", Some("v2")),
        ]);
        let top = GroupingSearch::new("group")
            .search(&searcher, &Query::term("body", "random"), 0, 10)
            .unwrap();

        assert_eq!(top.total_hit_count, 3);
        assert_eq!(top.total_group_count, 2);
        assert_eq!(values(&top), vec![Some("v1"), Some("v2")]);
        assert_eq!(top.groups[0].total_hits, 2);
        assert_eq!(top.groups[0].score_docs.len(), 1);
    }

    #[test]
    fn test_offset_limit_do_not_change_totals() {
        let searcher = searcher(vec![
            doc("a", Some("x")),
            doc("a", Some("y")),
            doc("a", Some("y")),
            doc("a", None),
        ]);
        let top = GroupingSearch::new("group")
            .with_docs_per_group(5)
            .search(&searcher, &Query::match_all(), 1, 1)
            .unwrap();

        assert_eq!(top.total_hit_count, 4);
        assert_eq!(top.total_group_count, 3);
        // y (2 hits), x, None
        assert_eq!(values(&top), vec![Some("x")]);

        let all = GroupingSearch::new("group")
            .with_docs_per_group(5)
            .search(&searcher, &Query::match_all(), 0, 10)
            .unwrap();
        assert_eq!(values(&all), vec![Some("y"), Some("x"), None]);
        assert_eq!(all.groups[0].score_docs.len(), 2);
    }

    #[test]
    fn test_no_matches() {
        let searcher = searcher(vec![doc("a", Some("x"))]);
        let top = GroupingSearch::new("group")
            .search(&searcher, &Query::term("body", "zzz"), 0, 10)
            .unwrap();

        assert_eq!(top.total_hit_count, 0);
        assert!(top.groups.is_empty());
    }

    #[test]
    fn test_unbounded_docs_per_group() {
        let searcher = searcher(vec![
            doc("a", Some("x")),
            doc("a b", Some("x")),
            doc("b", None),
        ]);
        let top = GroupingSearch::new("group")
            .with_docs_per_group(usize::MAX)
            .search(&searcher, &Query::match_all(), 0, usize::MAX)
            .unwrap();

        assert_eq!(top.total_group_count, 2);
        assert_eq!(top.groups[0].score_docs.len(), 2);
        assert_eq!(top.groups[1].score_docs.len(), 1);
    }
}
