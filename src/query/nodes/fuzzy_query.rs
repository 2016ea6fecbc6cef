//! Fuzzy query - matches terms within an edit distance
//!
//! Candidate terms come from each segment's FST through a Levenshtein
//! automaton; the closest `max_fuzzy_expansions` of them are scored as if
//! they were alternative term queries, weighted by similarity.
//!
//! # Example
//!
//! ```rust
//! use sifter::query::nodes::FuzzyQuery;
//!
//! // Terms within edit distance 1 of "box" (matches "fox")
//! let query = FuzzyQuery::new("body", "box").with_max_edits(1);
//! ```

use std::collections::BTreeSet;

use crate::query::ast::{Matches, QueryNode};
use crate::query::context::QueryContext;
use crate::Result;

/// Largest supported edit distance
pub const MAX_EDITS: u8 = 2;

/// Query that matches terms within an edit distance of the query term
///
/// The edit distance is the Levenshtein distance, counting:
/// - Insertions
/// - Deletions
/// - Substitutions
///
/// A transposition of two adjacent characters counts as two edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuzzyQuery {
    /// Field to search in
    pub field: String,
    /// Term to match approximately
    pub term: String,
    /// Maximum edit distance (default: 1)
    pub max_edits: u8,
}

/// A dictionary term accepted by a fuzzy query
#[derive(Clone, Debug, PartialEq)]
pub struct FuzzyExpansion {
    pub term: String,
    pub distance: u32,
    /// Score multiplier, `1 - distance / len`
    pub weight: f32,
}

impl FuzzyQuery {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            max_edits: 1,
        }
    }

    /// Set the maximum edit distance, clamped to [`MAX_EDITS`]
    pub fn with_max_edits(mut self, max_edits: u8) -> Self {
        self.max_edits = max_edits.min(MAX_EDITS);
        self
    }

    /// Terms of the field within `max_edits`, closest first then lexical
    pub fn expand(&self, ctx: &QueryContext) -> Vec<FuzzyExpansion> {
        let max_edits = self.max_edits as u32;
        let mut candidates: BTreeSet<String> = BTreeSet::new();

        for segment in ctx.generation().segments() {
            let Some(index) = segment.field(&self.field) else {
                continue;
            };
            match index.terms().fuzzy_terms(&self.term, max_edits) {
                Some(terms) => candidates.extend(terms.into_iter().map(|(t, _)| t)),
                // Automaton too large: scan the dictionary instead
                None => candidates.extend(
                    index
                        .terms()
                        .iter_terms()
                        .into_iter()
                        .map(|(t, _)| t)
                        .filter(|t| levenshtein_distance(&self.term, t) <= max_edits as usize),
                ),
            }
        }

        let query_len = self.term.chars().count();
        let mut expansions: Vec<FuzzyExpansion> = candidates
            .into_iter()
            .filter_map(|term| {
                let distance = levenshtein_distance(&self.term, &term) as u32;
                if distance > max_edits {
                    return None;
                }
                let len = query_len.min(term.chars().count()).max(1) as f32;
                let weight = (1.0 - distance as f32 / len).max(0.0);
                Some(FuzzyExpansion {
                    term,
                    distance,
                    weight,
                })
            })
            .collect();

        expansions.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.term.cmp(&b.term)));
        expansions.truncate(ctx.settings().max_fuzzy_expansions);
        expansions
    }
}

impl QueryNode for FuzzyQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<Matches> {
        let mut matches = Matches::empty();
        for expansion in self.expand(ctx) {
            let postings = ctx.postings(&self.field, &expansion.term)?;
            let doc_frequency = postings.len() as u32;
            for posting in &postings {
                let doc = posting.doc.as_u32();
                matches.docs.insert(doc);
                matches.add_score(doc, expansion.weight * ctx.bm25(&self.field, posting, doc_frequency));
            }
        }
        Ok(matches)
    }

    fn query_type(&self) -> &'static str {
        "fuzzy"
    }
}

/// Calculate Levenshtein distance between two strings
///
/// Uses dynamic programming with O(m*n) time and O(min(m,n)) space.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    // Use smaller string for columns to minimize space
    let (shorter, longer) = if len1 <= len2 {
        (&s1_chars, &s2_chars)
    } else {
        (&s2_chars, &s1_chars)
    };

    let mut prev_row: Vec<usize> = (0..=shorter.len()).collect();
    let mut curr_row = vec![0; shorter.len() + 1];

    for (i, long_ch) in longer.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, short_ch) in shorter.iter().enumerate() {
            let cost = usize::from(long_ch != short_ch);
            curr_row[j + 1] = (prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1) // insertion
                .min(prev_row[j] + cost); // substitution
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[shorter.len()]
}
