//! Facet counting over a match set

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use super::path::FacetPath;
use super::taxonomy::{TaxonomyReader, ROOT_ORDINAL};
use crate::error::{Result, SifterError};
use crate::index::IndexSearcher;
use crate::models::MatchSet;
use crate::query::Query;
use crate::segment::Ordinal;

/// A child label and its document count
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelAndValue {
    pub label: String,
    pub value: u32,
}

/// Counts of the children of one facet path
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FacetResult {
    pub dim: String,
    pub path: Vec<String>,
    /// Matching documents carrying the path itself
    pub value: u32,
    /// Distinct children with a non-zero count
    pub child_count: usize,
    /// Top children by count, ties by label
    pub label_values: Vec<LabelAndValue>,
}

/// Per-ordinal document counts of one match set
#[derive(Debug)]
pub struct FacetCounts {
    taxonomy: TaxonomyReader,
    counts: Vec<u32>,
}

impl FacetCounts {
    /// Count facet ordinals of every document in `matches`
    ///
    /// `matches` must have been collected from the searcher's generation.
    pub fn new(
        taxonomy: &TaxonomyReader,
        searcher: &IndexSearcher,
        matches: &MatchSet,
    ) -> Result<Self> {
        let generation = searcher.reader().generation()?;
        if generation.number() != matches.generation() {
            return Err(SifterError::GenerationMismatch {
                expected: generation.number(),
                actual: matches.generation(),
            });
        }

        let mut counts = vec![0u32; taxonomy.size()];
        for doc in matches.iter() {
            for &ordinal in generation.facet_ordinals(doc) {
                let index = ordinal as usize;
                if index >= counts.len() {
                    counts.resize(index + 1, 0);
                }
                counts[index] += 1;
            }
        }

        Ok(Self {
            taxonomy: taxonomy.clone(),
            counts,
        })
    }

    /// Run `query` and count the children of `dim`
    pub fn search(
        searcher: &IndexSearcher,
        taxonomy: &TaxonomyReader,
        query: &Query,
        dim: &str,
        top_n: usize,
    ) -> Result<Option<FacetResult>> {
        let matches = searcher.collect(query)?;
        let counts = Self::new(taxonomy, searcher, &matches)?;
        Ok(counts.top_children(top_n, dim, &[]))
    }

    fn count(&self, ordinal: Ordinal) -> u32 {
        self.counts.get(ordinal as usize).copied().unwrap_or(0)
    }

    /// Count of documents carrying `path`, 0 for unknown labels
    pub fn specific_value(&self, path: &FacetPath) -> u32 {
        self.taxonomy
            .ordinal(path)
            .map(|ordinal| self.count(ordinal))
            .unwrap_or(0)
    }

    /// Top `top_n` children of `dim/path`; `None` when nothing under it matched
    pub fn top_children(&self, top_n: usize, dim: &str, path: &[&str]) -> Option<FacetResult> {
        let parent = FacetPath::new(dim, path.iter().copied());
        let ordinal = self.taxonomy.ordinal(&parent)?;

        let mut children: Vec<LabelAndValue> = self
            .taxonomy
            .children(ordinal)
            .iter()
            .filter_map(|&child| {
                let value = self.count(child);
                let label = self.taxonomy.path(child)?.label().to_string();
                (value > 0).then_some(LabelAndValue { label, value })
            })
            .collect();

        let value = self.count(ordinal);
        if value == 0 && children.is_empty() {
            return None;
        }

        children.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
        let child_count = children.len();
        children.truncate(top_n);

        debug!(
            "facet {} has {} children with counts",
            parent, child_count
        );

        Some(FacetResult {
            dim: dim.to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
            value,
            child_count,
            label_values: children,
        })
    }

    /// Top children of every dimension with counts, largest dimension first
    pub fn all_dims(&self, top_n: usize) -> Vec<FacetResult> {
        let mut results: Vec<FacetResult> = self
            .taxonomy
            .children(ROOT_ORDINAL)
            .iter()
            .filter_map(|&dim| self.taxonomy.path(dim))
            .filter_map(|dim| self.top_children(top_n, dim.dimension(), &[]))
            .collect();
        results.sort_by(|a, b| match b.value.cmp(&a.value) {
            Ordering::Equal => a.dim.cmp(&b.dim),
            other => other,
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use crate::facet::{FacetsConfig, TaxonomyWriter};
    use crate::models::Document;
    use crate::segment::IndexStore;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<IndexStore>,
        taxonomy: TaxonomyWriter,
    }

    fn fixture(labels: &[(&str, &[&str])]) -> Fixture {
        let store = IndexStore::in_memory(IndexSettings::default());
        let taxonomy = TaxonomyWriter::in_memory();
        let mut config = FacetsConfig::new();
        config.set_hierarchical("category", true);

        let writer = store.writer().unwrap();
        for (body, path) in labels {
            let doc = Document::new()
                .with_text("body", *body)
                .with_facet("category", path.iter().copied());
            writer.add_document(config.build(&taxonomy, doc).unwrap()).unwrap();
        }
        writer.commit().unwrap();
        taxonomy.commit().unwrap();
        Fixture { store, taxonomy }
    }

    fn counts(f: &Fixture, query: &Query) -> FacetCounts {
        let searcher = IndexSearcher::new(f.store.reader().unwrap());
        let matches = searcher.collect(query).unwrap();
        FacetCounts::new(&TaxonomyReader::open(&f.taxonomy), &searcher, &matches).unwrap()
    }

    fn label_values(result: &FacetResult) -> Vec<(&str, u32)> {
        result
            .label_values
            .iter()
            .map(|lv| (lv.label.as_str(), lv.value))
            .collect()
    }

    #[test]
    fn test_counts_children() {
        let f = fixture(&[("a", &["c2"]), ("a", &["c2"]), ("a", &["c1"])]);
        let counts = counts(&f, &Query::match_all());

        let result = counts.top_children(10, "category", &[]).unwrap();
        assert_eq!(result.value, 3);
        assert_eq!(result.child_count, 2);
        assert_eq!(label_values(&result), vec![("c2", 2), ("c1", 1)]);

        let top1 = counts.top_children(1, "category", &[]).unwrap();
        assert_eq!(top1.child_count, 2);
        assert_eq!(label_values(&top1), vec![("c2", 2)]);
    }

    #[test]
    fn test_ties_by_label_and_query_filter() {
        let f = fixture(&[("x", &["b"]), ("x", &["a"]), ("y", &["c"])]);
        let counts = counts(&f, &Query::term("body", "x"));

        let result = counts.top_children(10, "category", &[]).unwrap();
        assert_eq!(label_values(&result), vec![("a", 1), ("b", 1)]);
        assert_eq!(counts.specific_value(&FacetPath::new("category", ["c"])), 0);
        assert_eq!(counts.specific_value(&FacetPath::new("category", ["a"])), 1);
    }

    #[test]
    fn test_hierarchy() {
        let f = fixture(&[
            ("a", &["books", "rust"]),
            ("a", &["books", "go"]),
            ("a", &["music"]),
        ]);
        let counts = counts(&f, &Query::match_all());

        let top = counts.top_children(10, "category", &[]).unwrap();
        assert_eq!(label_values(&top), vec![("books", 2), ("music", 1)]);

        let books = counts.top_children(10, "category", &["books"]).unwrap();
        assert_eq!(books.value, 2);
        assert_eq!(label_values(&books), vec![("go", 1), ("rust", 1)]);

        assert!(counts.top_children(10, "missing", &[]).is_none());
        assert_eq!(counts.all_dims(10).len(), 1);
    }

    #[test]
    fn test_stale_match_set_rejected() {
        let f = fixture(&[("a", &["c1"])]);
        let old = IndexSearcher::new(f.store.reader().unwrap());
        let matches = old.collect(&Query::match_all()).unwrap();

        let writer = f.store.writer().unwrap();
        writer.add_document(Document::new().with_text("body", "b")).unwrap();
        writer.commit().unwrap();

        let new = IndexSearcher::new(f.store.reader().unwrap());
        let err = FacetCounts::new(&TaxonomyReader::open(&f.taxonomy), &new, &matches).unwrap_err();
        assert!(matches!(err, SifterError::GenerationMismatch { .. }));
    }

    #[test]
    fn test_search_convenience() {
        let f = fixture(&[("a", &["c2"]), ("a", &["c2"]), ("b", &["c1"])]);
        let searcher = IndexSearcher::new(f.store.reader().unwrap());
        let taxonomy = TaxonomyReader::open(&f.taxonomy);

        let result = FacetCounts::search(&searcher, &taxonomy, &Query::term("body", "a"), "category", 5)
            .unwrap()
            .unwrap();
        assert_eq!(label_values(&result), vec![("c2", 2)]);
    }
}
