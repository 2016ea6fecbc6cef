//! Query model, parser and evaluation
//!
//! Queries are trees of term, fuzzy, match-all and boolean nodes. They are
//! built programmatically or parsed from Lucene-style query strings and
//! evaluated against one generation of the index.
//!
//! # Example
//!
//! ```rust
//! use sifter::query::{Query, QueryParser};
//!
//! let query = QueryParser::new()
//!     .with_default_field("body")
//!     .parse("quick box~ -dog")
//!     .unwrap();
//! assert!(matches!(query, Query::Bool(_)));
//! ```

pub mod ast;
pub mod context;
pub mod nodes;
pub mod query_string;

pub use ast::{Matches, Query, QueryNode};
pub use context::QueryContext;
pub use nodes::{levenshtein_distance, BoolQuery, FuzzyQuery, MatchAllQuery, TermQuery};
pub use query_string::{QueryParser, QueryStringParser};
