//! All documents query - matches every document in the generation

use crate::query::ast::{Matches, QueryNode};
use crate::query::context::QueryContext;
use crate::Result;

/// Query that matches all documents, each with score 1.0
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchAllQuery;

impl QueryNode for MatchAllQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<Matches> {
        let docs = ctx.all_docs();
        let scores = docs.iter().map(|doc| (doc, 1.0)).collect();
        Ok(Matches { docs, scores })
    }

    fn query_type(&self) -> &'static str {
        "match_all"
    }
}
