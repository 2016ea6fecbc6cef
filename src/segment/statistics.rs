//! Field statistics for BM25 scoring
//!
//! Each segment keeps per-document field lengths; a generation sums them
//! into index-wide statistics when a query is scored.

use serde::{Deserialize, Serialize};

use crate::config::Bm25Params;

/// Index-wide statistics for one field
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    /// Number of documents with at least one token in the field
    pub doc_count: u32,
    /// Sum of all field lengths
    pub total_length: u64,
}

impl FieldStatistics {
    pub fn merge(&mut self, other: &FieldStatistics) {
        self.doc_count += other.doc_count;
        self.total_length += other.total_length;
    }

    /// Average field length, zero when no document has the field
    pub fn avg_length(&self) -> f32 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.total_length as f32 / self.doc_count as f32
        }
    }
}

/// Per-document lengths of one field within a segment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldNorms {
    /// Length by segment-local position, zero when the document lacks the field
    lengths: Vec<u32>,
    stats: FieldStatistics,
}

impl FieldNorms {
    pub fn with_doc_count(doc_count: usize) -> Self {
        Self {
            lengths: vec![0; doc_count],
            stats: FieldStatistics::default(),
        }
    }

    pub(crate) fn from_lengths(lengths: Vec<u32>) -> Self {
        let stats = FieldStatistics {
            doc_count: lengths.iter().filter(|&&l| l > 0).count() as u32,
            total_length: lengths.iter().map(|&l| l as u64).sum(),
        };
        Self { lengths, stats }
    }

    pub fn set(&mut self, local: usize, length: u32) {
        if let Some(slot) = self.lengths.get_mut(local) {
            if *slot == 0 && length > 0 {
                self.stats.doc_count += 1;
            }
            self.stats.total_length = self.stats.total_length - *slot as u64 + length as u64;
            *slot = length;
        }
    }

    pub fn get(&self, local: usize) -> u32 {
        self.lengths.get(local).copied().unwrap_or(0)
    }

    pub fn lengths(&self) -> &[u32] {
        &self.lengths
    }

    pub fn stats(&self) -> &FieldStatistics {
        &self.stats
    }
}

/// BM25 score of one term occurrence
///
/// Uses the Robertson-Sparck-Jones IDF shifted by one so scores stay
/// positive even for terms present in every document.
pub fn bm25_score(
    tf: u32,
    doc_frequency: u32,
    total_docs: u32,
    field_length: u32,
    avg_length: f32,
    params: &Bm25Params,
) -> f32 {
    if total_docs == 0 || tf == 0 {
        return 0.0;
    }

    let n = total_docs as f32;
    let df = doc_frequency as f32;
    let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

    let norm = if avg_length > 0.0 {
        1.0 - params.b + params.b * (field_length as f32 / avg_length)
    } else {
        1.0
    };

    let tf = tf as f32;
    idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_norms() {
        let mut norms = FieldNorms::with_doc_count(3);
        norms.set(0, 4);
        norms.set(2, 2);

        assert_eq!(norms.get(1), 0);
        assert_eq!(norms.stats().doc_count, 2);
        assert_eq!(norms.stats().total_length, 6);
        assert_eq!(norms.stats().avg_length(), 3.0);

        let rebuilt = FieldNorms::from_lengths(norms.lengths().to_vec());
        assert_eq!(rebuilt.stats(), norms.stats());
    }

    #[test]
    fn test_bm25_prefers_higher_tf() {
        let params = Bm25Params::default();
        let low = bm25_score(1, 2, 10, 5, 5.0, &params);
        let high = bm25_score(3, 2, 10, 5, 5.0, &params);
        assert!(high > low);
    }

    #[test]
    fn test_bm25_prefers_rarer_terms() {
        let params = Bm25Params::default();
        let common = bm25_score(1, 9, 10, 5, 5.0, &params);
        let rare = bm25_score(1, 1, 10, 5, 5.0, &params);
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_bm25_empty_index() {
        assert_eq!(bm25_score(1, 0, 0, 1, 0.0, &Bm25Params::default()), 0.0);
    }
}
