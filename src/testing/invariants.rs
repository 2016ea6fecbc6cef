//! Invariant checking framework for index generations

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::segment::{Generation, Segment};

/// A violation of an invariant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub invariant: String,
    pub description: String,
    pub context: HashMap<String, String>,
}

impl Violation {
    fn new(invariant: &str, description: impl Into<String>) -> Self {
        Self {
            invariant: invariant.to_string(),
            description: description.into(),
            context: HashMap::new(),
        }
    }

    fn with_context(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INVARIANT VIOLATION: {}", self.invariant)?;
        writeln!(f, "  Description: {}", self.description)?;
        if !self.context.is_empty() {
            writeln!(f, "  Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Trait for invariant checkers
pub trait Invariant: Send + Sync {
    /// Name of the invariant
    fn name(&self) -> &str;

    /// Check the invariant against one generation
    fn check(&self, generation: &Generation) -> Result<(), Violation>;

    /// Human-readable description
    fn description(&self) -> &str {
        "No description provided"
    }
}

/// Check all invariants and return violations
pub fn check_all_invariants(
    generation: &Generation,
    invariants: &[Box<dyn Invariant>],
) -> Vec<Violation> {
    invariants
        .iter()
        .filter_map(|invariant| invariant.check(generation).err())
        .collect()
}

pub fn default_invariants() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(ContiguousSegments),
        Box::new(PostingsWithinSegment),
        Box::new(PostingsStrictlyIncreasing),
        Box::new(FacetOrdinalsSorted),
    ]
}

/// Run [`default_invariants`] against `generation`
pub fn check_generation(generation: &Generation) -> Vec<Violation> {
    check_all_invariants(generation, &default_invariants())
}

/// Invariant: segments cover `0..max_doc` in order without gaps or overlap
pub struct ContiguousSegments;

impl Invariant for ContiguousSegments {
    fn name(&self) -> &str {
        "ContiguousSegments"
    }

    fn description(&self) -> &str {
        "Segment doc ranges start at 0, are ordered, and leave no gaps"
    }

    fn check(&self, generation: &Generation) -> Result<(), Violation> {
        let mut expected = 0u32;
        for segment in generation.segments() {
            if segment.base_doc() != expected {
                return Err(Violation::new(self.name(), "segment doc range is not contiguous")
                    .with_context("segment", segment.id())
                    .with_context("expected_base", expected)
                    .with_context("actual_base", segment.base_doc()));
            }
            expected = segment.meta().end_doc();
        }
        if expected != generation.max_doc() {
            return Err(Violation::new(self.name(), "max_doc does not match segment ranges")
                .with_context("max_doc", generation.max_doc())
                .with_context("covered", expected));
        }
        Ok(())
    }
}

/// Invariant: every posting references a doc inside its own segment
pub struct PostingsWithinSegment;

impl Invariant for PostingsWithinSegment {
    fn name(&self) -> &str {
        "PostingsWithinSegment"
    }

    fn description(&self) -> &str {
        "Posting doc ids fall inside the doc range of their segment"
    }

    fn check(&self, generation: &Generation) -> Result<(), Violation> {
        for_each_posting_list(self.name(), generation, |segment, field, term, postings| {
            match postings.iter().find(|p| !segment.contains(p.doc)) {
                Some(posting) => Err(Violation::new(self.name(), "posting outside its segment")
                    .with_context("segment", segment.id())
                    .with_context("field", field)
                    .with_context("term", term)
                    .with_context("doc", posting.doc)),
                None => Ok(()),
            }
        })
    }
}

/// Invariant: posting lists are strictly increasing and match their doc frequency
pub struct PostingsStrictlyIncreasing;

impl Invariant for PostingsStrictlyIncreasing {
    fn name(&self) -> &str {
        "PostingsStrictlyIncreasing"
    }

    fn description(&self) -> &str {
        "Posting lists are sorted by doc id without duplicates"
    }

    fn check(&self, generation: &Generation) -> Result<(), Violation> {
        for_each_posting_list(self.name(), generation, |segment, field, term, postings| {
            if let Some(pair) = postings.windows(2).find(|w| w[0].doc >= w[1].doc) {
                return Err(Violation::new(self.name(), "posting list not strictly increasing")
                    .with_context("segment", segment.id())
                    .with_context("field", field)
                    .with_context("term", term)
                    .with_context("docs", format!("{} >= {}", pair[0].doc, pair[1].doc)));
            }
            let doc_freq = segment.doc_freq(field, term) as usize;
            if doc_freq != postings.len() {
                return Err(Violation::new(self.name(), "doc frequency differs from posting count")
                    .with_context("segment", segment.id())
                    .with_context("field", field)
                    .with_context("term", term)
                    .with_context("doc_freq", doc_freq)
                    .with_context("postings", postings.len()));
            }
            Ok(())
        })
    }
}

/// Invariant: per-document facet ordinals are sorted and deduplicated
pub struct FacetOrdinalsSorted;

impl Invariant for FacetOrdinalsSorted {
    fn name(&self) -> &str {
        "FacetOrdinalsSorted"
    }

    fn check(&self, generation: &Generation) -> Result<(), Violation> {
        for segment in generation.segments() {
            for (offset, ordinals) in segment.all_facet_ordinals().iter().enumerate() {
                if ordinals.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(Violation::new(self.name(), "facet ordinals not sorted and unique")
                        .with_context("doc", segment.base_doc() + offset as u32)
                        .with_context("ordinals", format!("{:?}", ordinals)));
                }
            }
        }
        Ok(())
    }
}

fn for_each_posting_list<F>(name: &str, generation: &Generation, mut check: F) -> Result<(), Violation>
where
    F: FnMut(&Segment, &str, &str, &[crate::segment::Posting]) -> Result<(), Violation>,
{
    for segment in generation.segments() {
        for field in segment.field_names() {
            for (term, _) in segment.terms(field) {
                let postings = segment.postings(field, &term).map_err(|e| {
                    Violation::new(name, "unreadable posting list")
                        .with_context("segment", segment.id())
                        .with_context("field", field)
                        .with_context("term", &term)
                        .with_context("error", e)
                })?;
                check(segment, field, &term, &postings)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use crate::facet::{FacetsConfig, TaxonomyWriter};
    use crate::models::Document;
    use crate::segment::IndexStore;

    #[test]
    fn test_empty_generation_is_valid() {
        assert!(check_generation(&Generation::empty()).is_empty());
    }

    #[test]
    fn test_committed_and_merged_generations_are_valid() {
        let settings = IndexSettings::default().with_merge_segment_threshold(2);
        let store = IndexStore::in_memory(settings);
        let taxonomy = TaxonomyWriter::in_memory();
        let mut config = FacetsConfig::new();
        config.set_multi_valued("tag", true);

        let writer = store.writer().unwrap();
        for batch in 0..4 {
            for i in 0..3 {
                let doc = Document::new()
                    .with_text("body", format!("word{} shared batch{}", i, batch))
                    .with_facet("tag", [format!("t{}", i)])
                    .with_facet("tag", ["all"]);
                writer.add_document(config.build(&taxonomy, doc).unwrap()).unwrap();
            }
            writer.commit().unwrap();

            let violations = check_generation(&store.current());
            assert!(violations.is_empty(), "{:?}", violations);
        }
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::new("Example", "broken").with_context("doc", 3);
        let text = violation.to_string();
        assert!(text.contains("INVARIANT VIOLATION: Example"));
        assert!(text.contains("doc: 3"));
    }
}
