//! Writer, reader and searcher handles over an [`IndexStore`](crate::segment::IndexStore)

mod reader;
pub(crate) mod searcher;
mod writer;

pub use reader::IndexReader;
pub use searcher::IndexSearcher;
pub use writer::IndexWriter;
