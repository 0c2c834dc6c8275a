// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! Contiguous storage for texts below the large-object threshold.

use crate::source_text::TextStorage;

/// A text held in one contiguous character array.
#[derive(Debug)]
pub(crate) struct StringText {
    chars: Box<[char]>,
}

impl StringText {
    pub(crate) fn new(chars: Box<[char]>) -> Self {
        Self { chars }
    }

    pub(crate) fn chars(&self) -> &[char] {
        &self.chars
    }
}

impl TextStorage for StringText {
    fn len(&self) -> usize {
        self.chars.len()
    }

    fn char_at(&self, position: usize) -> char {
        self.chars[position]
    }

    fn copy_to(&self, source_index: usize, destination: &mut [char]) {
        let end = source_index + destination.len();
        destination.copy_from_slice(&self.chars[source_index..end]);
    }
}
