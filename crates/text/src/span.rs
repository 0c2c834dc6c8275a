// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! Half-open character ranges.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TextError};

/// A half-open range `[start, start + length)` of character positions.
///
/// Both fields are unsigned, so the span is non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

impl TextSpan {
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Creates a span covering `[start, end)`.
    ///
    /// Fails with [`TextError::InvalidBounds`] if `end < start`.
    pub fn from_bounds(start: usize, end: usize) -> Result<Self> {
        if end < start {
            return Err(TextError::InvalidBounds { start, end });
        }
        Ok(Self::new(start, end - start))
    }

    /// The first position after the span, saturating at `usize::MAX`.
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    /// The first position after the span, or `None` if it does not fit in
    /// a `usize`.
    pub const fn checked_end(&self) -> Option<usize> {
        self.start.checked_add(self.length)
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns true if `position` lies inside the span. The end is exclusive.
    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end()
    }

    /// Returns true if `other` lies entirely inside this span.
    pub fn contains_span(&self, other: TextSpan) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    /// Returns true if the spans share at least one position.
    ///
    /// Empty spans never overlap anything.
    pub fn overlaps_with(&self, other: TextSpan) -> bool {
        self.start.max(other.start) < self.end().min(other.end())
    }

    /// The non-empty overlap of the two spans, if any.
    pub fn overlap(&self, other: TextSpan) -> Option<TextSpan> {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        (start < end).then(|| TextSpan::new(start, end - start))
    }

    /// Like [`overlaps_with`](Self::overlaps_with), but touching spans and
    /// empty spans at a shared boundary also count.
    pub fn intersects_with(&self, other: TextSpan) -> bool {
        other.start <= self.end() && other.end() >= self.start
    }

    /// The intersection of the two spans, which may be empty.
    pub fn intersection(&self, other: TextSpan) -> Option<TextSpan> {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        (start <= end).then(|| TextSpan::new(start, end - start))
    }
}

impl PartialOrd for TextSpan {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextSpan {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Start first, then length
        match self.start.cmp(&other.start) {
            std::cmp::Ordering::Equal => self.length.cmp(&other.length),
            ord => ord,
        }
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end())
    }
}
