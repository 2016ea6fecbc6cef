//! Segment-based inverted index
//!
//! The index is append-only. Each commit turns the writer's mutable buffer
//! into an immutable segment and publishes a new generation: an immutable
//! list of segments covering doc ids `0..max_doc` without gaps.
//!
//! # Architecture
//!
//! - `MutableBuffer`: In-memory buffer for uncommitted writes
//! - `Segment`: Immutable FST term dictionaries, postings, norms and stored fields
//! - `Generation`: Point-in-time view over a list of segments
//! - `SegmentManifest`: Tracks live segments, persisted atomically
//! - `IndexStore`: Publishes generations and hands out readers and the writer

mod types;
mod statistics;
mod buffer;
mod postings;
mod term_dict;
mod reader;
mod writer;
mod generation;
mod manifest;
mod store;
mod merge;
mod index;

pub use types::*;
pub use statistics::*;
pub use buffer::*;
pub use postings::*;
pub use term_dict::*;
pub use reader::*;
pub use writer::*;
pub use generation::*;
pub use manifest::*;
pub use store::*;
pub use merge::*;
pub use index::*;

pub(crate) use store::write_atomic;
