// Chunk: docs/chunks/large_text - Chunked storage for large texts

//! Accumulates characters into a fresh leaf text.
//!
//! Small results become a [`StringText`](crate::string_text::StringText);
//! anything past the large-object threshold is kept as fixed-size chunks in a
//! [`LargeText`](crate::large_text::LargeText), so no single allocation ever
//! holds the whole text.

use crate::checksum::SourceHashAlgorithm;
use crate::encoding::Encoding;
use crate::large_text::{LargeText, CHUNK_SIZE};
use crate::source_text::{Repr, SourceText};
use crate::string_text::StringText;

/// Texts up to this many characters are stored contiguously.
pub const LARGE_OBJECT_THRESHOLD: usize = 40 * 1024;

#[derive(Debug, Default)]
pub(crate) struct SourceTextWriter {
    chunks: Vec<Box<[char]>>,
    current: Vec<char>,
    length: usize,
}

impl SourceTextWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes the first chunk for an expected total length.
    pub(crate) fn with_length_hint(length: usize) -> Self {
        Self {
            chunks: Vec::new(),
            current: Vec::with_capacity(length.min(CHUNK_SIZE)),
            length: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.length
    }

    pub(crate) fn write(&mut self, mut chars: &[char]) {
        self.length += chars.len();
        while !chars.is_empty() {
            if self.current.len() == CHUNK_SIZE {
                self.flush_chunk();
            }
            let room = CHUNK_SIZE - self.current.len();
            let take = room.min(chars.len());
            self.current.extend_from_slice(&chars[..take]);
            chars = &chars[take..];
        }
    }

    pub(crate) fn write_char(&mut self, ch: char) {
        if self.current.len() == CHUNK_SIZE {
            self.flush_chunk();
        }
        self.current.push(ch);
        self.length += 1;
    }

    fn flush_chunk(&mut self) {
        let full = std::mem::replace(&mut self.current, Vec::with_capacity(CHUNK_SIZE));
        self.chunks.push(full.into_boxed_slice());
    }

    pub(crate) fn into_source_text(
        self,
        encoding: Option<Encoding>,
        algorithm: SourceHashAlgorithm,
    ) -> SourceText {
        SourceText::from_repr(self.into_repr(), encoding, algorithm)
    }

    /// Finishes the storage. The last chunk is trimmed to the characters it holds.
    pub(crate) fn into_repr(mut self) -> Repr {
        if self.length <= LARGE_OBJECT_THRESHOLD && self.chunks.len() <= 1 {
            let mut chars = Vec::with_capacity(self.length);
            for chunk in &self.chunks {
                chars.extend_from_slice(chunk);
            }
            chars.extend_from_slice(&self.current);
            Repr::String(StringText::new(chars.into_boxed_slice()))
        } else {
            if !self.current.is_empty() {
                let last = std::mem::take(&mut self.current);
                self.chunks.push(last.into_boxed_slice());
            }
            tracing::trace!(
                length = self.length,
                chunks = self.chunks.len(),
                "built chunked text"
            );
            Repr::Large(LargeText::new(self.chunks))
        }
    }
}
