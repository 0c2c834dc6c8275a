// Chunk: docs/chunks/line_index - Line boundaries of a source text

//! Line index for a [`SourceText`].
//!
//! The index is an array of line start offsets: `starts[0] == 0`, the array is
//! strictly increasing, and its length is the number of line breaks plus one.
//! Lookups of the line containing a position are a binary search.
//!
//! Line breaks are `\r\n`, `\r`, `\n`, U+0085, U+2028 and U+2029. A `\r\n`
//! pair is one break even when it straddles two storage chunks.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TextError};
use crate::source_text::SourceText;
use crate::span::TextSpan;

/// Returns true for characters that end a line on their own.
pub fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// Returns true if a line starts at `position`, i.e. the characters just
/// before it form a complete line break.
pub(crate) fn starts_line_at(text: &SourceText, position: usize) -> bool {
    if position == 0 || position > text.len() {
        return false;
    }
    match text.char_unchecked(position - 1) {
        '\r' => position == text.len() || text.char_unchecked(position) != '\n',
        ch => is_line_break(ch),
    }
}

// ==================== Scanning ====================

/// Collects line starts from a text fed in consecutive chunks.
#[derive(Debug)]
pub(crate) struct LineStartScanner {
    starts: Vec<usize>,
    position: usize,
    /// The previous chunk ended in `\r`; its line start waits on the next char.
    pending_cr: bool,
}

impl LineStartScanner {
    pub(crate) fn new() -> Self {
        Self {
            starts: vec![0],
            position: 0,
            pending_cr: false,
        }
    }

    pub(crate) fn feed(&mut self, chunk: &[char]) {
        for &ch in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if ch != '\n' {
                    self.starts.push(self.position);
                }
            }
            self.position += 1;
            match ch {
                '\r' => self.pending_cr = true,
                ch if is_line_break(ch) => self.starts.push(self.position),
                _ => {}
            }
        }
    }

    pub(crate) fn finish(mut self) -> Arc<[usize]> {
        if self.pending_cr {
            self.starts.push(self.position);
        }
        self.starts.into()
    }
}

// ==================== Positions ====================

/// A zero-based line and character offset within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinePosition {
    pub line: usize,
    pub character: usize,
}

impl LinePosition {
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line, self.character)
    }
}

/// A range between two line positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinePositionSpan {
    start: LinePosition,
    end: LinePosition,
}

impl LinePositionSpan {
    /// Fails if `end` is before `start`.
    pub fn new(start: LinePosition, end: LinePosition) -> Result<Self> {
        if end < start {
            return Err(TextError::InvalidLinePositionSpan { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> LinePosition {
        self.start
    }

    pub fn end(&self) -> LinePosition {
        self.end
    }
}

impl fmt::Display for LinePositionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-({})", self.start, self.end)
    }
}

// ==================== Lines ====================

/// One line of a text.
#[derive(Debug, Clone, Copy)]
pub struct TextLine<'a> {
    text: &'a SourceText,
    line_number: usize,
    start: usize,
    end: usize,
    end_including_line_break: usize,
}

impl<'a> TextLine<'a> {
    pub fn text(&self) -> &'a SourceText {
        self.text
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// End of the line's content, before any line break.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn end_including_line_break(&self) -> usize {
        self.end_including_line_break
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.start, self.end - self.start)
    }

    pub fn span_including_line_break(&self) -> TextSpan {
        TextSpan::new(self.start, self.end_including_line_break - self.start)
    }

    /// 0 for the last line, 2 for `\r\n`, otherwise 1.
    pub fn line_break_length(&self) -> usize {
        self.end_including_line_break - self.end
    }
}

impl fmt::Display for TextLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text.write_to(f, self.span()).map_err(|_| fmt::Error)
    }
}

/// The lines of a text, backed by its line start index.
#[derive(Debug, Clone)]
pub struct TextLineCollection<'a> {
    text: &'a SourceText,
    starts: Arc<[usize]>,
}

impl<'a> TextLineCollection<'a> {
    pub(crate) fn new(text: &'a SourceText, starts: Arc<[usize]>) -> Self {
        Self { text, starts }
    }

    /// Number of lines. Always at least 1.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Start offset of every line, in order.
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    pub fn get(&self, index: usize) -> Option<TextLine<'a>> {
        let start = *self.starts.get(index)?;
        let is_last = index + 1 == self.starts.len();
        let end_including_line_break = if is_last {
            self.text.len()
        } else {
            self.starts[index + 1]
        };
        let end = if is_last {
            end_including_line_break
        } else {
            end_including_line_break - self.break_length(start, end_including_line_break)
        };
        Some(TextLine {
            text: self.text,
            line_number: index,
            start,
            end,
            end_including_line_break,
        })
    }

    /// Length of the break that ends just before `next_start`.
    fn break_length(&self, start: usize, next_start: usize) -> usize {
        if next_start >= start + 2
            && self.text.char_unchecked(next_start - 1) == '\n'
            && self.text.char_unchecked(next_start - 2) == '\r'
        {
            2
        } else {
            1
        }
    }

    pub fn line(&self, index: usize) -> Result<TextLine<'a>> {
        self.get(index).ok_or(TextError::LineOutOfRange {
            line: index,
            line_count: self.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TextLine<'a>> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Index of the line containing `position`. The end of the text belongs
    /// to the last line.
    pub fn index_of(&self, position: usize) -> Result<usize> {
        let length = self.text.len();
        if position > length {
            return Err(TextError::PositionOutOfRange { position, length });
        }
        Ok(match self.starts.binary_search(&position) {
            Ok(line) => line,
            Err(line) => line - 1,
        })
    }

    pub fn line_from_position(&self, position: usize) -> Result<TextLine<'a>> {
        self.line(self.index_of(position)?)
    }

    pub fn line_position(&self, position: usize) -> Result<LinePosition> {
        let line = self.index_of(position)?;
        Ok(LinePosition::new(line, position - self.starts[line]))
    }

    /// Text position of a line position.
    pub fn position_of(&self, position: LinePosition) -> Result<usize> {
        let line = self.line(position.line)?;
        let offset = line.start() + position.character;
        let length = self.text.len();
        if offset > length {
            return Err(TextError::PositionOutOfRange {
                position: offset,
                length,
            });
        }
        Ok(offset)
    }

    pub fn line_position_span(&self, span: TextSpan) -> Result<LinePositionSpan> {
        LinePositionSpan::new(
            self.line_position(span.start)?,
            self.line_position(span.end())?,
        )
    }

    pub fn text_span(&self, span: LinePositionSpan) -> Result<TextSpan> {
        TextSpan::from_bounds(self.position_of(span.start)?, self.position_of(span.end)?)
    }
}
