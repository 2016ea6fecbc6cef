pub mod document;
pub mod search;

pub use document::{Document, Field, StoredDocument};
pub use search::{MatchSet, ScoreDoc, TopDocs};
