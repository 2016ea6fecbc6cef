pub mod config;
pub mod error;
pub mod facet;
pub mod grouping;
pub mod index;
pub mod models;
pub mod query;
pub mod segment;
pub mod testing;
pub mod tokenizer;
pub mod version;

pub use config::{AnalyzerKind, Bm25Params, IndexSettings, TokenizerConfig};
pub use error::{Result, SifterError};
pub use facet::{FacetCounts, FacetPath, FacetsConfig, TaxonomyReader, TaxonomyWriter};
pub use grouping::{GroupDocs, GroupingSearch, TopGroups};
pub use index::{IndexReader, IndexSearcher, IndexWriter};
pub use models::*;
pub use query::{BoolQuery, FuzzyQuery, MatchAllQuery, Query, QueryParser, TermQuery};
pub use segment::{DocId, Generation, IndexStore, TermInfo};
pub use tokenizer::Tokenizer;
pub use version::{EngineVersion, INDEX_FORMAT_VERSION, VERSION};
