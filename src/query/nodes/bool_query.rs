//! Boolean query - combines multiple clauses with AND, OR, NOT semantics

use crate::query::ast::{Matches, Query, QueryNode};
use crate::query::context::QueryContext;
use crate::Result;

/// Boolean query combining multiple clauses
///
/// - `must`: All clauses must match (AND). Scores are summed.
/// - `should`: When there is no `must` clause, at least one should clause
///   must match (OR). Otherwise should clauses only add to the score of
///   documents already matched.
/// - `must_not`: No clause must match (NOT). Does not contribute to score.
///
/// A query without positive clauses matches nothing, so `-field:term` on
/// its own returns no hits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub should: Vec<Query>,
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: impl Into<Query>) -> Self {
        self.must.push(query.into());
        self
    }

    pub fn should(mut self, query: impl Into<Query>) -> Self {
        self.should.push(query.into());
        self
    }

    pub fn must_not(mut self, query: impl Into<Query>) -> Self {
        self.must_not.push(query.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len()
    }
}

impl QueryNode for BoolQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<Matches> {
        let mut result: Option<Matches> = None;

        for query in &self.must {
            let matches = query.execute(ctx)?;
            result = Some(match result {
                None => matches,
                Some(mut acc) => {
                    acc.docs &= &matches.docs;
                    for (doc, score) in matches.scores {
                        acc.add_score(doc, score);
                    }
                    acc
                }
            });

            // Early exit if no matches
            if result.as_ref().is_some_and(|r| r.docs.is_empty()) {
                return Ok(Matches::empty());
            }
        }

        if !self.should.is_empty() {
            let required = result.is_none();
            let mut acc = result.unwrap_or_default();
            for query in &self.should {
                let matches = query.execute(ctx)?;
                if required {
                    acc.docs |= &matches.docs;
                }
                for (doc, score) in matches.scores {
                    acc.add_score(doc, score);
                }
            }
            result = Some(acc);
        }

        // Only negative clauses: nothing to subtract from
        let Some(mut result) = result else {
            return Ok(Matches::empty());
        };

        for query in &self.must_not {
            let excluded = query.execute(ctx)?;
            result.docs -= &excluded.docs;
        }

        result.prune_scores();
        Ok(result)
    }

    fn query_type(&self) -> &'static str {
        "bool"
    }
}
