// Chunk: docs/chunks/sliding_window - Lexer-facing cursor over source text

//! Sliding character window over a [`SourceText`].
//!
//! The lexer reads characters through a buffered window instead of indexing
//! the text directly. Positions come in two flavors:
//!
//! - **absolute**: a position in the text (`position`, `lexeme_start_position`)
//! - **relative**: an offset into the window buffer (`offset`)
//!
//! `basis` is the absolute position of the window's first character, so
//! `position == basis + offset`. The characters of the lexeme being scanned
//! (from `lexeme_start` to `offset`) always stay buffered: when the window
//! runs out it first slides the live region to the front, then grows.

use std::sync::{Arc, OnceLock};

use source_text::pool::{Pool, Pooled};
use source_text::{Result, SourceText, TextSpan};

use crate::intern::{Interner, StringTable};

/// Returned by the peek methods past the end of the text.
///
/// The character can also occur in the text itself; check
/// [`SlidingTextWindow::is_really_at_end`] to tell the two apart.
pub const INVALID_CHARACTER: char = '\u{FFFF}';

/// Initial capacity of a window buffer, in characters.
pub const DEFAULT_WINDOW_LENGTH: usize = 2048;

static WINDOWS: Pool<Vec<char>> = Pool::new(8, new_window, reset_window);

fn new_window() -> Vec<char> {
    vec!['\0'; DEFAULT_WINDOW_LENGTH]
}

fn reset_window(window: &mut Vec<char>) {
    window.truncate(DEFAULT_WINDOW_LENGTH);
    window.shrink_to(DEFAULT_WINDOW_LENGTH);
    window.resize(DEFAULT_WINDOW_LENGTH, '\0');
}

/// Short lexemes handed out without touching the intern table.
fn well_known(chars: &[char]) -> Option<Arc<str>> {
    static WELL_KNOWN: OnceLock<[Arc<str>; 4]> = OnceLock::new();
    let strings = WELL_KNOWN.get_or_init(|| [" ".into(), "\n".into(), "\r\n".into(), "//".into()]);
    let index = match chars {
        [' '] => 0,
        ['\n'] => 1,
        ['\r', '\n'] => 2,
        ['/', '/'] => 3,
        _ => return None,
    };
    Some(Arc::clone(&strings[index]))
}

fn make_text<I: Interner>(strings: &mut I, chars: &[char], intern: bool) -> Arc<str> {
    if let Some(shared) = well_known(chars) {
        shared
    } else if intern {
        strings.intern(chars)
    } else {
        Arc::from(chars.iter().collect::<String>().as_str())
    }
}

/// A lexer cursor over a source text.
///
/// Not thread-safe; one lexer owns one window. The buffer and intern table
/// are returned to their pools when the window is dropped.
pub struct SlidingTextWindow<I: Interner = Pooled<StringTable>> {
    text: SourceText,
    /// Absolute end of the text.
    text_end: usize,
    /// Absolute position of `character_window[0]`.
    basis: usize,
    /// Cursor, relative to `basis`.
    offset: usize,
    character_window: Pooled<Vec<char>>,
    /// Number of valid characters in `character_window`.
    character_window_count: usize,
    /// Start of the current lexeme, relative to `basis`.
    lexeme_start: usize,
    strings: I,
}

impl SlidingTextWindow {
    /// Creates a window at the start of `text`, interning into a pooled table.
    pub fn new(text: SourceText) -> Self {
        Self::with_interner(text, StringTable::pooled())
    }
}

impl<I: Interner> SlidingTextWindow<I> {
    pub fn with_interner(text: SourceText, strings: I) -> Self {
        let text_end = text.len();
        Self {
            text,
            text_end,
            basis: 0,
            offset: 0,
            character_window: WINDOWS.acquire(),
            character_window_count: 0,
            lexeme_start: 0,
            strings,
        }
    }

    // ==================== Accessors ====================

    pub fn text(&self) -> &SourceText {
        &self.text
    }

    /// Absolute position of the cursor.
    pub fn position(&self) -> usize {
        self.basis + self.offset
    }

    /// Cursor position relative to the window buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The buffered characters.
    pub fn character_window(&self) -> &[char] {
        &self.character_window[..self.character_window_count]
    }

    pub fn character_window_count(&self) -> usize {
        self.character_window_count
    }

    /// Absolute position where the current lexeme starts.
    pub fn lexeme_start_position(&self) -> usize {
        self.basis + self.lexeme_start
    }

    /// Number of characters consumed since [`start`](Self::start).
    pub fn width(&self) -> usize {
        self.offset - self.lexeme_start
    }

    /// True when the cursor is past the last character of the text.
    pub fn is_really_at_end(&self) -> bool {
        self.offset >= self.character_window_count && self.position() >= self.text_end
    }

    // ==================== Cursor ====================

    /// Marks the cursor as the start of the next lexeme.
    pub fn start(&mut self) {
        self.lexeme_start = self.offset;
    }

    /// Moves the cursor to an absolute position.
    ///
    /// A position inside the buffered window just moves the cursor; anything
    /// else discards the window and refills it from `position`.
    pub fn reset(&mut self, position: usize) {
        if position >= self.basis && position - self.basis <= self.character_window_count {
            self.offset = position - self.basis;
            self.lexeme_start = self.lexeme_start.min(self.offset);
            return;
        }

        let capacity = self.character_window.len();
        let amount = self
            .text_end
            .min(position.saturating_add(capacity))
            .saturating_sub(position);
        self.fill(position, 0, amount);
        self.basis = position;
        self.offset = 0;
        self.lexeme_start = 0;
        self.character_window_count = amount;
    }

    /// Buffers more of the text. Returns false once the text is exhausted.
    pub fn more_chars(&mut self) -> bool {
        if self.offset < self.character_window_count {
            return true;
        }
        if self.position() >= self.text_end {
            return false;
        }

        // Drop characters behind the lexeme once they are a quarter of the window
        if self.lexeme_start > self.character_window_count / 4 {
            let shift = self.lexeme_start;
            self.character_window
                .copy_within(shift..self.character_window_count, 0);
            self.character_window_count -= shift;
            self.offset -= shift;
            self.basis += shift;
            self.lexeme_start = 0;
            tracing::trace!(basis = self.basis, shift, "refocused text window");
        }

        if self.character_window_count >= self.character_window.len() {
            let grown = self.character_window.len() * 2;
            self.character_window.resize(grown, '\0');
            tracing::debug!(
                capacity = grown,
                lexeme_start = self.lexeme_start_position(),
                "grew text window"
            );
        }

        let read_from = self.basis + self.character_window_count;
        let amount = (self.text_end - read_from)
            .min(self.character_window.len() - self.character_window_count);
        self.fill(read_from, self.character_window_count, amount);
        self.character_window_count += amount;
        amount > 0
    }

    /// Copies `amount` characters starting at absolute `from` into the
    /// window at `at`.
    fn fill(&mut self, from: usize, at: usize, amount: usize) {
        if amount == 0 {
            return;
        }
        let destination = &mut self.character_window[at..at + amount];
        if let Err(err) = self.text.copy_to(from, destination) {
            // The range is computed from the text's own length
            debug_assert!(false, "window refill out of range: {err}");
        }
    }

    /// Consumes one character.
    pub fn advance_char(&mut self) {
        self.offset += 1;
    }

    /// Consumes `n` characters.
    pub fn advance_char_by(&mut self, n: usize) {
        self.offset += n;
    }

    /// The character at the cursor, or [`INVALID_CHARACTER`] at the end.
    pub fn peek_char(&mut self) -> char {
        while self.offset >= self.character_window_count {
            if !self.more_chars() {
                return INVALID_CHARACTER;
            }
        }
        self.character_window[self.offset]
    }

    /// The character `delta` positions past the cursor, without moving it.
    pub fn peek_char_at(&mut self, delta: usize) -> char {
        let position = self.position();
        self.advance_char_by(delta);
        let ch = self.peek_char();
        self.reset(position);
        ch
    }

    /// Consumes and returns the character at the cursor.
    ///
    /// At the end of the text returns [`INVALID_CHARACTER`] and stays put.
    pub fn next_char(&mut self) -> char {
        let ch = self.peek_char();
        if ch != INVALID_CHARACTER || !self.is_really_at_end() {
            self.advance_char();
        }
        ch
    }

    // ==================== Lexeme Text ====================

    /// Text of the current lexeme.
    ///
    /// Fails only if the cursor was advanced past the end of the text.
    pub fn lexeme_text(&mut self, intern: bool) -> Result<Arc<str>> {
        self.text_at(self.lexeme_start_position(), self.width(), intern)
    }

    /// Interned text of the current lexeme.
    pub fn interned_text(&mut self) -> Result<Arc<str>> {
        self.lexeme_text(true)
    }

    /// Text of `length` characters at absolute `position`.
    ///
    /// Common short lexemes (`" "`, `"\n"`, `"\r\n"`, `"//"`) are shared
    /// without interning. A range outside the text is an error.
    pub fn text_at(&mut self, position: usize, length: usize, intern: bool) -> Result<Arc<str>> {
        let buffered = position
            .checked_sub(self.basis)
            .and_then(|start| start.checked_add(length))
            .is_some_and(|end| end <= self.character_window_count);
        if !buffered {
            let text = self.text.to_string_span(TextSpan::new(position, length))?;
            let chars: Vec<char> = text.chars().collect();
            return Ok(make_text(&mut self.strings, &chars, intern));
        }

        let start = position - self.basis;
        Ok(make_text(
            &mut self.strings,
            &self.character_window[start..start + length],
            intern,
        ))
    }

    /// The intern table in use.
    pub fn strings(&mut self) -> &mut I {
        &mut self.strings
    }
}

impl<I: Interner> std::fmt::Debug for SlidingTextWindow<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingTextWindow")
            .field("basis", &self.basis)
            .field("offset", &self.offset)
            .field("lexeme_start", &self.lexeme_start)
            .field("character_window_count", &self.character_window_count)
            .field("capacity", &self.character_window.len())
            .finish()
    }
}
