//! Postings format
//!
//! A field's posting lists live back to back in one blob. Each list is a
//! vbyte count followed by `(doc delta, term frequency)` vbyte pairs; the
//! first delta is relative to zero so lists decode without segment context.

use crate::error::{Result, SifterError};

use super::types::{DocId, Posting, PostingListMeta};

/// Variable-byte encoding for integers (commonly used in search engines)
pub fn encode_vbyte(value: u32, output: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            output.push(byte | 0x80); // Set high bit to indicate last byte
            break;
        } else {
            output.push(byte);
        }
    }
}

/// Decode a variable-byte encoded integer
pub fn decode_vbyte(input: &[u8], pos: &mut usize) -> Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        let byte = *input
            .get(*pos)
            .ok_or_else(|| SifterError::Corrupted("unexpected end of vbyte".to_string()))?;
        *pos += 1;

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 != 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 28 {
            return Err(SifterError::Corrupted("vbyte value too large".to_string()));
        }
    }
}

/// Writer for the posting lists of one field
#[derive(Debug, Default)]
pub struct PostingsWriter {
    data: Vec<u8>,
}

impl PostingsWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Append a posting list; postings must be sorted by doc id
    pub fn write_posting_list(&mut self, postings: &[Posting]) -> PostingListMeta {
        let offset = self.data.len() as u64;
        let mut previous = 0u32;
        let mut total_term_frequency = 0u64;

        encode_vbyte(postings.len() as u32, &mut self.data);
        for posting in postings {
            encode_vbyte(posting.doc.as_u32() - previous, &mut self.data);
            encode_vbyte(posting.term_frequency, &mut self.data);
            previous = posting.doc.as_u32();
            total_term_frequency += posting.term_frequency as u64;
        }

        PostingListMeta {
            offset,
            length: self.data.len() as u64 - offset,
            doc_frequency: postings.len() as u32,
            total_term_frequency,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// Decode the posting list described by `meta` out of a field blob
pub fn read_posting_list(data: &[u8], meta: &PostingListMeta) -> Result<Vec<Posting>> {
    let start = meta.offset as usize;
    let end = start + meta.length as usize;
    let slice = data.get(start..end).ok_or_else(|| {
        SifterError::Corrupted(format!(
            "posting list {}..{} out of bounds ({} bytes)",
            start,
            end,
            data.len()
        ))
    })?;

    let mut pos = 0;
    let count = decode_vbyte(slice, &mut pos)?;
    if count != meta.doc_frequency {
        return Err(SifterError::Corrupted(format!(
            "posting list holds {} entries, dictionary says {}",
            count, meta.doc_frequency
        )));
    }

    let mut postings = Vec::with_capacity(count as usize);
    let mut doc = 0u32;
    for i in 0..count {
        let delta = decode_vbyte(slice, &mut pos)?;
        if i > 0 && delta == 0 {
            return Err(SifterError::Corrupted(
                "posting list doc ids not strictly increasing".to_string(),
            ));
        }
        doc = doc
            .checked_add(delta)
            .ok_or_else(|| SifterError::Corrupted("doc id overflow".to_string()))?;
        let term_frequency = decode_vbyte(slice, &mut pos)?;
        postings.push(Posting::new(DocId(doc), term_frequency));
    }

    Ok(postings)
}
