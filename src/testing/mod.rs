//! Structural invariant checks for published generations
//!
//! # Quick Start
//!
//! ```rust
//! use sifter::testing::check_generation;
//! use sifter::{Document, IndexSettings, IndexStore};
//!
//! let store = IndexStore::in_memory(IndexSettings::default());
//! let writer = store.writer().unwrap();
//! writer.add_document(Document::new().with_text("body", "hello world")).unwrap();
//! writer.commit().unwrap();
//!
//! let violations = check_generation(&store.current());
//! assert!(violations.is_empty());
//! ```
//!
//! # Invariants
//!
//! - **ContiguousSegments**: segment doc ranges start at 0 and leave no gaps
//! - **PostingsWithinSegment**: posting doc ids fall inside their segment
//! - **PostingsStrictlyIncreasing**: posting lists are sorted without duplicates
//! - **FacetOrdinalsSorted**: per-document facet ordinals are sorted and unique

pub mod invariants;

pub use invariants::{check_all_invariants, check_generation, default_invariants, Invariant, Violation};
