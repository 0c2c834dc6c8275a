// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! A window onto part of another text, without copying.

use crate::source_text::{SourceText, TextStorage};
use crate::span::TextSpan;

/// A view of `span` within `underlying`. The underlying text is always a
/// leaf (contiguous or chunked); views of views are resolved on creation.
#[derive(Debug)]
pub(crate) struct SubText {
    underlying: SourceText,
    span: TextSpan,
}

impl SubText {
    pub(crate) fn new(underlying: SourceText, span: TextSpan) -> Self {
        debug_assert!(underlying.is_leaf(), "SubText must wrap a leaf text");
        debug_assert!(span.end() <= underlying.len());
        Self { underlying, span }
    }

    pub(crate) fn underlying(&self) -> &SourceText {
        &self.underlying
    }

    pub(crate) fn span(&self) -> TextSpan {
        self.span
    }
}

impl TextStorage for SubText {
    fn len(&self) -> usize {
        self.span.length
    }

    fn char_at(&self, position: usize) -> char {
        self.underlying.char_unchecked(self.span.start + position)
    }

    fn copy_to(&self, source_index: usize, destination: &mut [char]) {
        self.underlying
            .copy_unchecked(self.span.start + source_index, destination);
    }
}
