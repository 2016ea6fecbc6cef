//! Abstract Syntax Tree for query representation
//!
//! `Query` is the tagged tree handed to searchers. Each variant wraps a node
//! type that implements [`QueryNode`], the execution interface shared by all
//! query types.

use std::collections::HashMap;
use std::fmt::{self, Debug};

use roaring::RoaringBitmap;

use super::context::QueryContext;
use super::nodes::{BoolQuery, FuzzyQuery, MatchAllQuery, TermQuery};
use crate::error::Result;

/// Documents matched by a query node with their scores
#[derive(Clone, Debug, Default)]
pub struct Matches {
    pub docs: RoaringBitmap,
    /// Score per matching doc id; absent means 0
    pub scores: HashMap<u32, f32>,
}

impl Matches {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn score(&self, doc: u32) -> f32 {
        self.scores.get(&doc).copied().unwrap_or(0.0)
    }

    pub(crate) fn add_score(&mut self, doc: u32, score: f32) {
        *self.scores.entry(doc).or_insert(0.0) += score;
    }

    /// Keep only scores of docs still in `docs`
    pub(crate) fn prune_scores(&mut self) {
        let docs = &self.docs;
        self.scores.retain(|doc, _| docs.contains(*doc));
    }
}

/// Core trait for all query nodes in the AST
///
/// A node executes against a `QueryContext` and produces the matching doc
/// ids of the context's generation together with their scores.
pub trait QueryNode: Send + Sync + Debug {
    fn execute(&self, ctx: &QueryContext) -> Result<Matches>;

    /// Get the query type name for debugging and logging
    fn query_type(&self) -> &'static str;
}

/// A parsed or programmatically built query
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// Every document, `*:*`
    MatchAll(MatchAllQuery),
    /// Exact term in a field, `field:term`
    Term(TermQuery),
    /// Terms within an edit distance, `field:term~N`
    Fuzzy(FuzzyQuery),
    Bool(BoolQuery),
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll(MatchAllQuery)
    }

    pub fn term(field: impl Into<String>, term: impl Into<String>) -> Self {
        Query::Term(TermQuery::new(field, term))
    }

    pub fn fuzzy(field: impl Into<String>, term: impl Into<String>, max_edits: u8) -> Self {
        Query::Fuzzy(FuzzyQuery::new(field, term).with_max_edits(max_edits))
    }

    /// Parse query syntax; bare terms need `default_field`
    pub fn parse(input: &str, default_field: Option<&str>) -> Result<Self> {
        let mut parser = super::QueryParser::new();
        if let Some(field) = default_field {
            parser = parser.with_default_field(field);
        }
        parser.parse(input)
    }

    fn node(&self) -> &dyn QueryNode {
        match self {
            Query::MatchAll(q) => q,
            Query::Term(q) => q,
            Query::Fuzzy(q) => q,
            Query::Bool(q) => q,
        }
    }
}

impl QueryNode for Query {
    fn execute(&self, ctx: &QueryContext) -> Result<Matches> {
        self.node().execute(ctx)
    }

    fn query_type(&self) -> &'static str {
        self.node().query_type()
    }
}

impl From<TermQuery> for Query {
    fn from(q: TermQuery) -> Self {
        Query::Term(q)
    }
}

impl From<FuzzyQuery> for Query {
    fn from(q: FuzzyQuery) -> Self {
        Query::Fuzzy(q)
    }
}

impl From<BoolQuery> for Query {
    fn from(q: BoolQuery) -> Self {
        Query::Bool(q)
    }
}

/// Escape query syntax characters in a term
pub(crate) fn escape_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for (i, ch) in term.chars().enumerate() {
        let special = matches!(ch, ':' | '(' | ')' | '~' | '\\')
            || (i == 0 && matches!(ch, '-' | '+'))
            || ch.is_whitespace();
        if special {
            out.push('\\');
        }
        out.push(ch);
    }
    if matches!(term, "AND" | "OR" | "NOT") {
        out.insert(0, '\\');
    }
    out
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::MatchAll(_) => write!(f, "*:*"),
            Query::Term(q) => write!(f, "{}:{}", escape_term(&q.field), escape_term(&q.term)),
            Query::Fuzzy(q) => write!(
                f,
                "{}:{}~{}",
                escape_term(&q.field),
                escape_term(&q.term),
                q.max_edits
            ),
            Query::Bool(q) => {
                let mut parts: Vec<String> = q.must.iter().map(|c| format!("+{}", c)).collect();
                match q.should.len() {
                    0 => {}
                    1 if q.must.is_empty() => parts.push(q.should[0].to_string()),
                    _ => {
                        let alternatives: Vec<String> = q.should.iter().map(|c| c.to_string()).collect();
                        parts.push(format!("({})", alternatives.join(" OR ")));
                    }
                }
                parts.extend(q.must_not.iter().map(|c| format!("-{}", c)));
                write!(f, "({})", parts.join(" "))
            }
        }
    }
}
