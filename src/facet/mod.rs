//! Hierarchical facets
//!
//! Facet labels such as `category/books/rust` live in a taxonomy kept next
//! to the index. [`FacetsConfig::build`] resolves a document's labels into
//! taxonomy ordinals before it is handed to the writer, and
//! [`FacetCounts`] counts those ordinals over a match set.
//!
//! ```rust
//! use sifter::facet::{FacetCounts, FacetsConfig, TaxonomyReader, TaxonomyWriter};
//! use sifter::{Document, IndexSearcher, IndexSettings, IndexStore, Query};
//!
//! let store = IndexStore::in_memory(IndexSettings::default());
//! let taxonomy = TaxonomyWriter::in_memory();
//! let config = FacetsConfig::new();
//!
//! let writer = store.writer().unwrap();
//! for label in ["c2", "c2", "c1"] {
//!     let doc = Document::new().with_text("body", "text").with_facet("category", [label]);
//!     writer.add_document(config.build(&taxonomy, doc).unwrap()).unwrap();
//! }
//! writer.commit().unwrap();
//! taxonomy.commit().unwrap();
//!
//! let searcher = IndexSearcher::new(store.reader().unwrap());
//! let result = FacetCounts::search(
//!     &searcher,
//!     &TaxonomyReader::open(&taxonomy),
//!     &Query::match_all(),
//!     "category",
//!     10,
//! )
//! .unwrap()
//! .unwrap();
//! assert_eq!(result.child_count, 2);
//! ```

mod config;
mod counts;
mod path;
mod taxonomy;

pub use config::{DimConfig, FacetsConfig};
pub use counts::{FacetCounts, FacetResult, LabelAndValue};
pub use path::FacetPath;
pub use taxonomy::{TaxonomyReader, TaxonomyWriter, ROOT_ORDINAL, TAXONOMY_FILE};
