// Chunk: docs/chunks/sliding_window - Lexer-facing cursor over source text

//! Sliding text window for lexers.
//!
//! [`SlidingTextWindow`] buffers characters from a [`source_text::SourceText`]
//! so a lexer can peek, consume and backtrack without touching the text's
//! storage on every character. Lexeme text is produced through an
//! [`Interner`] so repeated identifiers share one allocation.
//!
//! ```
//! use source_text::SourceText;
//! use source_text_window::{SlidingTextWindow, INVALID_CHARACTER};
//!
//! let mut window = SlidingTextWindow::new(SourceText::from_str("let x"));
//! window.start();
//! while window.peek_char().is_ascii_alphabetic() {
//!     window.advance_char();
//! }
//! assert_eq!(&*window.lexeme_text(true)?, "let");
//! assert_eq!(window.next_char(), ' ');
//! assert_eq!(window.next_char(), 'x');
//! assert_eq!(window.next_char(), INVALID_CHARACTER);
//! assert!(window.is_really_at_end());
//! # Ok::<(), source_text::TextError>(())
//! ```

mod intern;
mod window;

pub use intern::{Interner, StringTable};
pub use window::{SlidingTextWindow, DEFAULT_WINDOW_LENGTH, INVALID_CHARACTER};
