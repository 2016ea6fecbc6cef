//! Lucene-style query string parser
//!
//! Supports syntax like:
//! - `title:rust AND body:tutorial`
//! - `body:fox -body:dog`
//! - `body:box~` and `body:box~2`
//! - `(a:x OR a:y) b:z`
//! - `*:*`
//!
//! Adjacent clauses are combined with AND. Characters with a meaning in the
//! syntax can be escaped with a backslash.
//!
//! # Example
//!
//! ```rust
//! use sifter::query::query_string::QueryStringParser;
//!
//! let mut parser = QueryStringParser::new("title:rust AND status:published").unwrap();
//! let query = parser.parse().unwrap();
//! ```

pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Spanned, Token};
pub use parser::QueryStringParser;

use crate::query::ast::Query;
use crate::Result;

/// Reusable query parser configuration
#[derive(Clone, Debug, Default)]
pub struct QueryParser {
    default_field: Option<String>,
}

impl QueryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field for terms written without `field:`
    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn default_field(&self) -> Option<&str> {
        self.default_field.as_deref()
    }

    pub fn parse(&self, input: &str) -> Result<Query> {
        let mut parser = QueryStringParser::new(input)?;
        if let Some(field) = &self.default_field {
            parser = parser.with_default_field(field.clone());
        }
        parser.parse()
    }
}
