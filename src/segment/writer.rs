//! Segment writer for creating new immutable segments
//!
//! On commit the pending buffer is written as one segment:
//! postings + term dictionary per field, field norms, stored fields
//! and facet ordinals.

use std::collections::BTreeMap;

use super::buffer::MutableBuffer;
use super::postings::PostingsWriter;
use super::reader::{FieldIndex, Segment, SegmentMeta};
use super::statistics::FieldNorms;
use super::term_dict::TermDictionaryBuilder;
use super::types::{Posting, SegmentId};
use crate::error::Result;

/// Writer for creating new segments from a mutable buffer
pub struct SegmentWriter {
    segment_id: SegmentId,
}

impl SegmentWriter {
    pub fn new(segment_id: SegmentId) -> Self {
        Self { segment_id }
    }

    /// Write a segment from a mutable buffer
    pub fn write_from_buffer(&self, buffer: &MutableBuffer) -> Result<Segment> {
        let doc_count = buffer.doc_count();
        let mut fields = BTreeMap::new();

        for (field, postings) in buffer.all_postings() {
            let mut terms: Vec<(&String, &Vec<Posting>)> = postings.iter().collect();
            terms.sort_by(|a, b| a.0.cmp(b.0));

            let mut norms = FieldNorms::with_doc_count(doc_count as usize);
            for &(local, length) in buffer.field_lengths(field) {
                norms.set(local, length);
            }

            fields.insert(field.clone(), build_field(terms, norms)?);
        }

        let meta = SegmentMeta {
            id: self.segment_id,
            base_doc: buffer.base_doc(),
            doc_count,
        };
        Segment::from_parts(
            meta,
            fields,
            buffer.stored().to_vec(),
            buffer.facet_ordinals().to_vec(),
        )
    }
}

/// Encode sorted `(term, postings)` pairs into a field index
pub(crate) fn build_field<T, P>(terms: Vec<(T, P)>, norms: FieldNorms) -> Result<FieldIndex>
where
    T: AsRef<str>,
    P: AsRef<[Posting]>,
{
    let mut postings_writer = PostingsWriter::new();
    let mut term_builder = TermDictionaryBuilder::with_capacity(terms.len());

    for (term, postings) in &terms {
        let postings = postings.as_ref();
        if postings.is_empty() {
            continue;
        }
        let meta = postings_writer.write_posting_list(postings);
        term_builder.add(term.as_ref().to_string(), meta);
    }

    Ok(FieldIndex::new(
        term_builder.build()?,
        postings_writer.into_inner(),
        norms,
    ))
}
