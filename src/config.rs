use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// How raw text is split into terms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// One term per whitespace-delimited token, kept verbatim
    Whitespace,
    /// Unicode word boundaries (punctuation is dropped)
    Standard,
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub kind: AnalyzerKind,
    pub lowercase: bool,
    /// Longer tokens, counted in characters, are dropped
    pub max_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: AnalyzerKind::Whitespace,
            lowercase: false,
            max_token_length: 255,
        }
    }
}

impl TokenizerConfig {
    pub fn standard() -> Self {
        Self {
            kind: AnalyzerKind::Standard,
            lowercase: true,
            ..Default::default()
        }
    }
}

/// BM25 parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation parameter
    pub k1: f32,
    /// Length normalization parameter
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Index settings configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub tokenizer_config: TokenizerConfig,
    pub bm25: Bm25Params,
    /// Upper bound on the number of terms a fuzzy clause expands to
    pub max_fuzzy_expansions: usize,
    /// fsync segment and manifest files on commit
    pub sync_on_commit: bool,
    /// Merge every segment into one once a commit leaves more than this many
    pub merge_segment_threshold: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            tokenizer_config: TokenizerConfig::default(),
            bm25: Bm25Params::default(),
            max_fuzzy_expansions: 50,
            sync_on_commit: true,
            merge_segment_threshold: 16,
        }
    }
}

impl IndexSettings {
    /// Load settings from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn with_tokenizer(mut self, config: TokenizerConfig) -> Self {
        self.tokenizer_config = config;
        self
    }

    pub fn with_bm25(mut self, params: Bm25Params) -> Self {
        self.bm25 = params;
        self
    }

    pub fn with_max_fuzzy_expansions(mut self, max: usize) -> Self {
        self.max_fuzzy_expansions = max;
        self
    }

    pub fn with_sync_on_commit(mut self, sync: bool) -> Self {
        self.sync_on_commit = sync;
        self
    }

    pub fn with_merge_segment_threshold(mut self, threshold: usize) -> Self {
        self.merge_segment_threshold = threshold;
        self
    }
}
