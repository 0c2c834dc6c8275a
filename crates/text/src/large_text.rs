// Chunk: docs/chunks/large_text - Chunked storage for large texts

//! Chunked storage for texts too large for one contiguous allocation.
//!
//! Characters live in fixed-size chunks (only the last may be shorter) with a
//! parallel array of chunk start offsets. Looking up a position is a binary
//! search over the offsets.

use crate::source_text::TextStorage;
use crate::span::TextSpan;

/// Number of characters per chunk.
pub const CHUNK_SIZE: usize = 40 * 1024;

#[derive(Debug)]
pub(crate) struct LargeText {
    chunks: Box<[Box<[char]>]>,
    /// `chunk_starts[i]` is the text position of `chunks[i][0]`.
    chunk_starts: Box<[usize]>,
    length: usize,
}

impl LargeText {
    /// Builds the text from non-empty chunks.
    pub(crate) fn new(chunks: Vec<Box<[char]>>) -> Self {
        let mut chunk_starts = Vec::with_capacity(chunks.len());
        let mut length = 0;
        for chunk in &chunks {
            debug_assert!(!chunk.is_empty(), "LargeText chunks must not be empty");
            chunk_starts.push(length);
            length += chunk.len();
        }
        Self {
            chunks: chunks.into_boxed_slice(),
            chunk_starts: chunk_starts.into_boxed_slice(),
            length,
        }
    }

    /// The pieces of the stored chunks covered by `span`, in order.
    pub(crate) fn chunks_in(&self, span: TextSpan) -> impl Iterator<Item = &[char]> + '_ {
        let first = if span.is_empty() {
            self.chunks.len()
        } else {
            self.chunk_index(span.start)
        };
        self.chunks[first..]
            .iter()
            .zip(&self.chunk_starts[first..])
            .take_while(move |&(_, &start)| start < span.end())
            .map(move |(chunk, &start)| {
                let from = span.start.saturating_sub(start);
                let to = (span.end() - start).min(chunk.len());
                &chunk[from..to]
            })
    }

    /// Index of the chunk holding `position`.
    fn chunk_index(&self, position: usize) -> usize {
        match self.chunk_starts.binary_search(&position) {
            Ok(index) => index,
            Err(index) => index - 1,
        }
    }
}

impl TextStorage for LargeText {
    fn len(&self) -> usize {
        self.length
    }

    fn char_at(&self, position: usize) -> char {
        let index = self.chunk_index(position);
        self.chunks[index][position - self.chunk_starts[index]]
    }

    fn copy_to(&self, source_index: usize, destination: &mut [char]) {
        if destination.is_empty() {
            return;
        }
        let mut index = self.chunk_index(source_index);
        let mut offset = source_index - self.chunk_starts[index];
        let mut written = 0;
        while written < destination.len() {
            let chunk = &self.chunks[index];
            let count = (chunk.len() - offset).min(destination.len() - written);
            destination[written..written + count].copy_from_slice(&chunk[offset..offset + count]);
            written += count;
            index += 1;
            offset = 0;
        }
    }
}
