// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end
// Chunk: docs/chunks/range_merge - Merging change ranges across generations

//! source-text: the text layer beneath a compiler front end.
//!
//! This crate provides an immutable, versioned buffer of source characters.
//! Snapshots are cheap to clone and share; editing one produces a new snapshot
//! that remembers what changed, so incremental consumers can ask for the diff
//! between any two related versions.
//!
//! # Overview
//!
//! The main type is [`SourceText`], which provides:
//! - Construction from strings, character iterators and byte streams (with
//!   byte-order-mark detection)
//! - Indexed and bulk character access, and views onto sub-spans without copying
//! - Edits via [`SourceText::with_changes`], returning a new snapshot
//! - Change ranges between snapshots via [`SourceText::change_ranges`]
//! - A lazily built line index via [`SourceText::lines`]
//! - A lazily computed content checksum via [`SourceText::checksum`]
//!
//! Texts above [`LARGE_OBJECT_THRESHOLD`] characters are stored in
//! [`CHUNK_SIZE`] chunks, so no single allocation holds a huge file.
//!
//! # Example
//!
//! ```
//! use source_text::{SourceText, TextChange, TextChangeRange, TextSpan};
//!
//! let v0 = SourceText::from_str("fn main() {}\n");
//! let v1 = v0
//!     .with_changes(&[TextChange::new(TextSpan::new(3, 4), "start")])
//!     .unwrap();
//! assert_eq!(v1.to_string(), "fn start() {}\n");
//!
//! // Edits build on each other; ranges are always in the older text's terms
//! let v2 = v1.replace(TextSpan::new(11, 2), "{ }").unwrap();
//! assert_eq!(
//!     v2.change_ranges(&v0),
//!     vec![
//!         TextChangeRange::new(TextSpan::new(3, 4), 5),
//!         TextChangeRange::new(TextSpan::new(10, 2), 3),
//!     ]
//! );
//!
//! assert_eq!(v2.lines().len(), 2);
//! ```
//!
//! # Change History
//!
//! An edited snapshot links back to its predecessor weakly: holding the newest
//! snapshot never keeps older ones alive. While the intermediate snapshots are
//! alive, [`SourceText::change_ranges`] merges the ranges of every generation
//! into one exact diff (see [`merge`]). Once they are gone, it answers
//! conservatively with a single range replacing the whole old text.

mod change;
mod changed;
mod checksum;
mod composite;
mod encoding;
mod error;
mod large_text;
mod lines;
mod merge;
mod options;
pub mod pool;
mod source_text;
mod span;
mod string_text;
mod sub_text;
mod writer;

pub use change::{TextChange, TextChangeRange};
pub use checksum::SourceHashAlgorithm;
pub use composite::{
    INITIAL_SEGMENT_SIZE_FOR_COMBINING, MAXIMUM_SEGMENT_COUNT_BEFORE_REDUCTION,
    MAXIMUM_SEGMENT_SIZE_FOR_COMBINING, TARGET_SEGMENT_COUNT_AFTER_REDUCTION,
};
pub use encoding::{Decoder, Encoding};
pub use error::{ErrorKind, Result, TextError};
pub use large_text::CHUNK_SIZE;
pub use lines::{is_line_break, LinePosition, LinePositionSpan, TextLine, TextLineCollection};
pub use merge::{merge, merge_all};
pub use options::{TextOptions, DEFAULT_MAX_LENGTH};
pub use source_text::{Chars, SourceText, TextKind};
pub use span::TextSpan;
pub use writer::LARGE_OBJECT_THRESHOLD;
