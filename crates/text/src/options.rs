// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! Construction options for [`SourceText`](crate::SourceText).

use crate::checksum::SourceHashAlgorithm;
use crate::encoding::Encoding;
use crate::error::{Result, TextError};

/// Default upper bound on text length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = i32::MAX as usize;

/// Options controlling how a source text is constructed.
///
/// ```
/// use source_text::{Encoding, SourceHashAlgorithm, TextOptions};
///
/// let options = TextOptions::default()
///     .with_encoding(Encoding::Utf16Le)
///     .with_checksum_algorithm(SourceHashAlgorithm::Sha256)
///     .reject_binary(true);
/// assert_eq!(options.encoding, Some(Encoding::Utf16Le));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOptions {
    /// Encoding of the text. For streams this is the fallback used when no
    /// byte-order mark is found.
    pub encoding: Option<Encoding>,
    pub checksum_algorithm: SourceHashAlgorithm,
    /// A precomputed checksum. Must match the algorithm's digest length.
    pub checksum: Option<Vec<u8>>,
    /// Fail with a data-format error if the content looks binary.
    pub reject_binary: bool,
    /// Decode strictly and mark the text as suitable for embedding.
    pub can_be_embedded: bool,
    /// Texts longer than this many characters are rejected.
    pub max_length: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            checksum_algorithm: SourceHashAlgorithm::default(),
            checksum: None,
            reject_binary: false,
            can_be_embedded: false,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl TextOptions {
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_checksum_algorithm(mut self, algorithm: SourceHashAlgorithm) -> Self {
        self.checksum_algorithm = algorithm;
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<Vec<u8>>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn reject_binary(mut self, reject: bool) -> Self {
        self.reject_binary = reject;
        self
    }

    pub fn can_be_embedded(mut self, embedded: bool) -> Self {
        self.can_be_embedded = embedded;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Validates the options that can be checked before reading any text.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(checksum) = &self.checksum {
            self.checksum_algorithm.validate(checksum)?;
        }
        Ok(())
    }

    pub(crate) fn check_length(&self, length: usize) -> Result<()> {
        if length > self.max_length {
            return Err(TextError::TooLarge {
                length,
                max: self.max_length,
            });
        }
        Ok(())
    }
}
