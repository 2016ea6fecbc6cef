//! Lexer for query string syntax
//!
//! Tokenizes query strings into a stream of tokens, each tagged with the
//! character position it starts at.

use crate::error::SifterError;
use crate::Result;

/// Token types for query string parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A term or field name, escapes already resolved
    Term(String),

    /// AND operator
    And,
    /// OR operator
    Or,
    /// NOT operator
    Not,
    /// Colon separator (field:value)
    Colon,

    /// Tilde with optional edit distance
    Tilde(Option<u32>),

    /// Left parenthesis (grouping)
    LeftParen,
    /// Right parenthesis (grouping)
    RightParen,

    /// Plus sign (required clause)
    Plus,
    /// Minus sign (excluded clause, equivalent to NOT)
    Minus,

    /// End of input
    Eof,
}

impl Token {
    /// Human readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Term(t) => format!("term '{}'", t),
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::Not => "NOT".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Tilde(_) => "'~'".to_string(),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Eof => "end of query".to_string(),
        }
    }
}

/// A token and the character position it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Lexer for tokenizing query strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace();
        let start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok(Spanned {
                token: Token::Eof,
                position: start,
            });
        };

        let token = match ch {
            ':' => {
                self.advance();
                Token::Colon
            }
            '~' => {
                self.advance();
                Token::Tilde(self.read_unsigned_int(start)?)
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                self.advance();
                Token::Minus
            }
            _ => self.read_term()?,
        };

        Ok(Spanned {
            token,
            position: start,
        })
    }

    /// Check if the lexer has reached the end of input
    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn read_term(&mut self) -> Result<Token> {
        let mut term = String::new();
        let mut escaped_any = false;

        while let Some(ch) = self.current_char() {
            if ch == '\\' {
                let at = self.position;
                self.advance();
                let escaped = self
                    .current_char()
                    .ok_or_else(|| SifterError::syntax(at, "dangling escape character"))?;
                term.push(escaped);
                escaped_any = true;
                self.advance();
            } else if Self::is_term_char(ch) {
                term.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Keywords are case-sensitive; an escaped keyword is a plain term
        if escaped_any {
            return Ok(Token::Term(term));
        }
        Ok(match term.as_str() {
            "AND" | "&&" => Token::And,
            "OR" | "||" => Token::Or,
            "NOT" => Token::Not,
            _ => Token::Term(term),
        })
    }

    fn read_unsigned_int(&mut self, start: usize) -> Result<Option<u32>> {
        let mut num_str = String::new();

        while let Some(ch) = self.current_char().filter(|c| c.is_ascii_digit()) {
            num_str.push(ch);
            self.advance();
        }

        if num_str.is_empty() {
            return Ok(None);
        }
        num_str
            .parse()
            .map(Some)
            .map_err(|_| SifterError::syntax(start, format!("invalid edit distance '{}'", num_str)))
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    /// Check if a character can be part of a term
    ///
    /// `+` and `-` are operators only at the start of a term.
    fn is_term_char(ch: char) -> bool {
        !ch.is_whitespace() && !matches!(ch, ':' | '(' | ')' | '~' | '\\')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let spanned = lexer.next_token().unwrap();
            let done = spanned.token == Token::Eof;
            out.push(spanned.token);
            if done {
                return out;
            }
        }
    }

    fn term(s: &str) -> Token {
        Token::Term(s.to_string())
    }

    #[test]
    fn test_simple_term() {
        assert_eq!(tokens("hello"), vec![term("hello"), Token::Eof]);
    }

    #[test]
    fn test_field_value() {
        assert_eq!(
            tokens("title:rust"),
            vec![term("title"), Token::Colon, term("rust"), Token::Eof]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("a AND b OR NOT c and"),
            vec![
                term("a"),
                Token::And,
                term("b"),
                Token::Or,
                Token::Not,
                term("c"),
                term("and"),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_prefix_operators_and_inner_dash() {
        assert_eq!(
            tokens("-f:over +e-mail"),
            vec![
                Token::Minus,
                term("f"),
                Token::Colon,
                term("over"),
                Token::Plus,
                term("e-mail"),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_fuzzy_suffix() {
        assert_eq!(
            tokens("box~ box~2"),
            vec![
                term("box"),
                Token::Tilde(None),
                term("box"),
                Token::Tilde(Some(2)),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_match_all_and_grouping() {
        assert_eq!(
            tokens("*:* (a)"),
            vec![
                term("*"),
                Token::Colon,
                term("*"),
                Token::LeftParen,
                term("a"),
                Token::RightParen,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(tokens(r"a\:b \AND"), vec![term("a:b"), term("AND"), Token::Eof]);

        let err = Lexer::new(r"abc\").next_token().unwrap_err();
        assert!(matches!(err, SifterError::QuerySyntax { position: 3, .. }));
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new("  f:x");
        assert_eq!(lexer.next_token().unwrap().position, 2);
        assert_eq!(lexer.next_token().unwrap().position, 3);
        assert_eq!(lexer.next_token().unwrap().position, 4);
        assert_eq!(lexer.next_token().unwrap().position, 5);
        assert!(lexer.is_eof());
    }
}
