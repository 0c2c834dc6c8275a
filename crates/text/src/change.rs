// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! Descriptions of edits: with literal text ([`TextChange`]) and without
//! ([`TextChangeRange`]).

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::span::TextSpan;

/// An edit described only by the replaced span and the length of its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextChangeRange {
    /// The span of the old text that was replaced.
    pub span: TextSpan,
    /// Length of the text that replaced it.
    pub new_length: usize,
}

impl TextChangeRange {
    pub const fn new(span: TextSpan, new_length: usize) -> Self {
        Self { span, new_length }
    }

    /// A range that changes nothing.
    pub const fn unchanged() -> Self {
        Self::new(TextSpan::new(0, 0), 0)
    }

    /// True if this range neither removes nor inserts anything.
    pub const fn is_unchanged(&self) -> bool {
        self.span.length == 0 && self.new_length == 0
    }

    /// End of the replacement, in the coordinates of the new text.
    pub const fn new_end(&self) -> usize {
        self.span.start + self.new_length
    }

    /// Net change in text length caused by this range.
    pub fn delta(&self) -> isize {
        self.new_length as isize - self.span.length as isize
    }

    /// Collapses an ordered list of ranges into the single range covering all of them.
    ///
    /// Returns [`TextChangeRange::unchanged`] for an empty list.
    pub fn collapse(changes: &[TextChangeRange]) -> TextChangeRange {
        let (first, last) = match (changes.first(), changes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return TextChangeRange::unchanged(),
        };

        let start = first.span.start;
        let end = last.span.end();
        let delta: isize = changes.iter().map(TextChangeRange::delta).sum();
        let old_length = end - start;
        let new_length = (old_length as isize + delta) as usize;

        TextChangeRange::new(TextSpan::new(start, old_length), new_length)
    }
}

impl fmt::Display for TextChangeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.span, self.new_length)
    }
}

/// An edit described by the replaced span and the literal replacement text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextChange {
    pub span: TextSpan,
    pub new_text: String,
}

impl TextChange {
    pub fn new(span: TextSpan, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    /// Number of characters in the replacement text.
    pub fn new_length(&self) -> usize {
        self.new_text.chars().count()
    }

    /// True if this change neither removes nor inserts anything.
    pub fn is_no_op(&self) -> bool {
        self.span.is_empty() && self.new_text.is_empty()
    }

    /// Drops the literal text, keeping only the shape of the edit.
    pub fn to_change_range(&self) -> TextChangeRange {
        TextChangeRange::new(self.span, self.new_length())
    }
}

impl From<&TextChange> for TextChangeRange {
    fn from(change: &TextChange) -> Self {
        change.to_change_range()
    }
}

impl fmt::Display for TextChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {:?}", self.span, self.new_text)
    }
}
