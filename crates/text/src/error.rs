// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! Error type shared by every fallible text operation.
//!
//! Failures fall into three buckets (see [`ErrorKind`]): bad caller input,
//! resource limits / stream failures, and malformed content. All of them are
//! raised at the call that caused them and carry only plain values, so the
//! same input always produces the same error.

use std::{fmt, io};

use thiserror::Error;

use crate::checksum::SourceHashAlgorithm;
use crate::lines::LinePosition;

/// Coarse classification of a [`TextError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A span, position, edit list or checksum supplied by the caller is invalid.
    InvalidArgument,
    /// The text could not be read, or is larger than the configured maximum.
    Io,
    /// The input is not text in the requested form (binary or malformed bytes).
    DataFormat,
}

/// Errors produced by source text construction and queries.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("position {position} is out of range for text of length {length}")]
    PositionOutOfRange { position: usize, length: usize },

    #[error("span [{start}..{end}) is out of range for text of length {length}")]
    SpanOutOfRange {
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("span end {end} is before its start {start}")]
    InvalidBounds { start: usize, end: usize },

    #[error("changes must be ordered by start position and must not overlap")]
    OverlappingChanges,

    #[error("changes must be within the bounds of the text (change ends at {end}, length {length})")]
    ChangeOutOfRange { end: usize, length: usize },

    #[error("line position span end {end} is before its start {start}")]
    InvalidLinePositionSpan { start: LinePosition, end: LinePosition },

    #[error("line {line} is out of range for text with {line_count} lines")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("checksum for {algorithm:?} must be {expected} bytes, got {actual}")]
    ChecksumLength {
        algorithm: SourceHashAlgorithm,
        expected: usize,
        actual: usize,
    },

    #[error("text of {length} characters exceeds the maximum of {max}")]
    TooLarge { length: usize, max: usize },

    #[error("stream appears to contain binary data")]
    BinaryContent,

    #[error("invalid {encoding} byte sequence at offset {offset}")]
    MalformedInput {
        encoding: &'static str,
        offset: usize,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("writer failed: {0}")]
    Write(#[from] fmt::Error),
}

impl TextError {
    /// Returns which part of the error taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TextError::PositionOutOfRange { .. }
            | TextError::SpanOutOfRange { .. }
            | TextError::InvalidBounds { .. }
            | TextError::OverlappingChanges
            | TextError::ChangeOutOfRange { .. }
            | TextError::InvalidLinePositionSpan { .. }
            | TextError::LineOutOfRange { .. }
            | TextError::ChecksumLength { .. } => ErrorKind::InvalidArgument,
            TextError::TooLarge { .. } | TextError::Io(_) | TextError::Write(_) => ErrorKind::Io,
            TextError::BinaryContent | TextError::MalformedInput { .. } => ErrorKind::DataFormat,
        }
    }
}

pub type Result<T, E = TextError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            TextError::InvalidBounds { start: 3, end: 1 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            TextError::TooLarge { length: 10, max: 5 }.kind(),
            ErrorKind::Io
        );
        assert_eq!(TextError::BinaryContent.kind(), ErrorKind::DataFormat);
        let io_err: TextError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(io_err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_messages_are_deterministic() {
        let err = TextError::SpanOutOfRange {
            start: 2,
            end: 9,
            length: 4,
        };
        assert_eq!(
            err.to_string(),
            "span [2..9) is out of range for text of length 4"
        );
        assert_eq!(err.to_string(), err.to_string());
    }
}
