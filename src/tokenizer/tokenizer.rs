use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{AnalyzerKind, TokenizerConfig};

/// Text analyzer turning raw field values into terms
///
/// The default configuration splits on whitespace only and keeps every token
/// verbatim, so `"The"` and `"the"` are distinct terms and `"dog."` keeps its
/// trailing period.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Whitespace tokenizer with no normalization
    pub fn whitespace() -> Self {
        Self::new(&TokenizerConfig::default())
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize text into a vector of terms, in order, duplicates included
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match self.config.kind {
            AnalyzerKind::Whitespace => self.normalize_all(text.split_whitespace()),
            AnalyzerKind::Standard => self.normalize_all(text.unicode_words()),
        }
    }

    fn normalize_all<'a>(&self, words: impl Iterator<Item = &'a str>) -> Vec<String> {
        words
            .filter(|word| word.chars().count() <= self.config.max_token_length)
            .map(|word| {
                if self.config.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                }
            })
            .collect()
    }

    /// Compute term frequencies for a tokenized field value
    pub fn compute_term_frequencies(&self, text: &str) -> HashMap<String, u32> {
        let mut freq = HashMap::new();
        for token in self.tokenize(text) {
            *freq.entry(token).or_insert(0) += 1;
        }
        freq
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::whitespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_keeps_case_and_duplicates() {
        let tokenizer = Tokenizer::whitespace();
        let tokens = tokenizer.tokenize("The quick brown fox jumped over the lazy dog");

        assert_eq!(tokens.len(), 9);
        assert_eq!(tokens[0], "The");
        assert_eq!(tokens[6], "the");
    }

    #[test]
    fn test_whitespace_keeps_punctuation() {
        let tokenizer = Tokenizer::whitespace();
        let tokens = tokenizer.tokenize("  hello,\tworld!\n hello ");

        assert_eq!(tokens, vec!["hello,", "world!", "hello"]);
    }

    #[test]
    fn test_standard_analyzer() {
        let tokenizer = Tokenizer::new(&TokenizerConfig::standard());
        let tokens = tokenizer.tokenize("Hello, World! It's fine.");

        assert_eq!(tokens, vec!["hello", "world", "it's", "fine"]);
    }

    #[test]
    fn test_max_token_length() {
        let config = TokenizerConfig {
            max_token_length: 3,
            ..Default::default()
        };
        let tokenizer = Tokenizer::new(&config);
        let tokens = tokenizer.tokenize("a abc abcd");
        assert_eq!(tokens, vec!["a", "abc"]);

        // Measured in characters, not bytes
        let tokens = tokenizer.tokenize("été naïve");
        assert_eq!(tokens, vec!["été"]);
    }

    #[test]
    fn test_term_frequencies() {
        let tokenizer = Tokenizer::whitespace();

        let freq = tokenizer.compute_term_frequencies("apple apple banana Apple");
        assert_eq!(freq.get("apple"), Some(&2));
        assert_eq!(freq.get("banana"), Some(&1));
        assert_eq!(freq.get("Apple"), Some(&1));
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = Tokenizer::whitespace();
        assert!(tokenizer.tokenize("   \n\t").is_empty());
    }
}
