//! Recursive descent parser for query strings
//!
//! # Grammar
//!
//! ```text
//! query    := or_expr EOF
//! or_expr  := and_expr (OR and_expr)*
//! and_expr := unary (AND? unary)*
//! unary    := ('-' | '+' | NOT)? primary
//! primary  := '(' or_expr ')' | '*:*' | (TERM ':')? TERM ('~' DIGITS?)?
//! ```

use super::lexer::{Lexer, Spanned, Token};
use crate::error::SifterError;
use crate::query::ast::Query;
use crate::query::nodes::{BoolQuery, FuzzyQuery, MatchAllQuery, TermQuery, MAX_EDITS};
use crate::Result;

/// Whether a clause is required or excluded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Occur {
    Must,
    MustNot,
}

/// Parser for one query string
pub struct QueryStringParser {
    lexer: Lexer,
    current: Spanned,
    /// Field for terms written without `field:`
    default_field: Option<String>,
}

impl QueryStringParser {
    /// Create a new parser for the given query string
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;

        Ok(Self {
            lexer,
            current,
            default_field: None,
        })
    }

    /// Set the default field for unqualified terms
    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    /// Parse the query string into a query tree
    pub fn parse(&mut self) -> Result<Query> {
        if self.current.token == Token::Eof {
            return Err(SifterError::syntax(self.current.position, "empty query"));
        }

        let query = self.parse_or_expr()?;

        match &self.current.token {
            Token::Eof => Ok(query),
            Token::RightParen => Err(self.error("unbalanced ')'")),
            other => Err(self.error(format!("unexpected {}", other.describe()))),
        }
    }

    /// Parse: or_expr := and_expr (OR and_expr)*
    fn parse_or_expr(&mut self) -> Result<Query> {
        let mut clauses = vec![self.parse_and_expr()?];

        while self.current.token == Token::Or {
            self.advance()?;
            if !self.is_start_of_unary() {
                return Err(self.error("expected a clause after OR"));
            }
            clauses.push(self.parse_and_expr()?);
        }

        if clauses.len() == 1 {
            return Ok(clauses.remove(0));
        }
        Ok(Query::Bool(BoolQuery {
            should: clauses,
            ..BoolQuery::default()
        }))
    }

    /// Parse: and_expr := unary (AND? unary)*
    ///
    /// Adjacent clauses are combined with AND.
    fn parse_and_expr(&mut self) -> Result<Query> {
        let mut clauses = vec![self.parse_unary()?];

        loop {
            if self.current.token == Token::And {
                self.advance()?;
                if !self.is_start_of_unary() {
                    return Err(self.error("expected a clause after AND"));
                }
                clauses.push(self.parse_unary()?);
            } else if self.is_start_of_unary() {
                clauses.push(self.parse_unary()?);
            } else {
                break;
            }
        }

        if let [(Occur::Must, _)] = clauses.as_slice() {
            return Ok(clauses.remove(0).1);
        }

        let mut query = BoolQuery::new();
        for (occur, clause) in clauses {
            match occur {
                Occur::Must => query.must.push(clause),
                Occur::MustNot => query.must_not.push(clause),
            }
        }
        Ok(Query::Bool(query))
    }

    /// Parse: unary := ('-' | '+' | NOT)? primary
    fn parse_unary(&mut self) -> Result<(Occur, Query)> {
        let occur = match self.current.token {
            Token::Minus | Token::Not => Occur::MustNot,
            _ => Occur::Must,
        };
        if matches!(self.current.token, Token::Minus | Token::Not | Token::Plus) {
            let operator = self.current.token.describe();
            self.advance()?;
            if !self.is_start_of_primary() {
                return Err(self.error(format!("expected a clause after {}", operator)));
            }
        }
        Ok((occur, self.parse_primary()?))
    }

    /// Parse: primary := '(' or_expr ')' | '*:*' | (TERM ':')? TERM ('~' DIGITS?)?
    fn parse_primary(&mut self) -> Result<Query> {
        match self.current.token.clone() {
            Token::LeftParen => {
                let open = self.current.position;
                self.advance()?;
                if self.current.token == Token::RightParen {
                    return Err(self.error("empty group"));
                }
                let query = self.parse_or_expr()?;
                if self.current.token != Token::RightParen {
                    return Err(SifterError::syntax(open, "unbalanced '('"));
                }
                self.advance()?;
                Ok(query)
            }
            Token::Term(first) => {
                let first_position = self.current.position;
                self.advance()?;

                let (field, term) = if self.current.token == Token::Colon {
                    self.advance()?;
                    match self.current.token.clone() {
                        Token::Term(term) => {
                            self.advance()?;
                            (first, term)
                        }
                        _ => {
                            return Err(self.error(format!("missing term after '{}:'", first)));
                        }
                    }
                } else {
                    match &self.default_field {
                        Some(field) => (field.clone(), first),
                        None => {
                            return Err(SifterError::syntax(
                                first_position,
                                format!("missing field for term '{}'", first),
                            ));
                        }
                    }
                };

                if field == "*" && term == "*" {
                    return Ok(Query::MatchAll(MatchAllQuery));
                }

                if let Token::Tilde(distance) = self.current.token {
                    let position = self.current.position;
                    let max_edits = distance.unwrap_or(1);
                    if max_edits > MAX_EDITS as u32 {
                        return Err(SifterError::syntax(
                            position,
                            format!("edit distance {} exceeds maximum of {}", max_edits, MAX_EDITS),
                        ));
                    }
                    self.advance()?;
                    return Ok(Query::Fuzzy(
                        FuzzyQuery::new(field, term).with_max_edits(max_edits as u8),
                    ));
                }

                Ok(Query::Term(TermQuery::new(field, term)))
            }
            Token::Eof => Err(self.error("unexpected end of query")),
            Token::RightParen => Err(self.error("unbalanced ')'")),
            other => Err(self.error(format!("unexpected {}", other.describe()))),
        }
    }

    fn is_start_of_primary(&self) -> bool {
        matches!(self.current.token, Token::Term(_) | Token::LeftParen)
    }

    fn is_start_of_unary(&self) -> bool {
        self.is_start_of_primary()
            || matches!(self.current.token, Token::Minus | Token::Plus | Token::Not)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> SifterError {
        SifterError::syntax(self.current.position, message)
    }
}
