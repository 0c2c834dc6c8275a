// Chunk: docs/chunks/text_checksum - Content checksums

//! Content checksums.
//!
//! The digest is taken over the text's characters encoded with the text's
//! encoding (UTF-8 when it has none), streamed through a pooled buffer. It
//! therefore depends only on content, encoding and algorithm, never on how the
//! text happens to be stored.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::encoding::Encoding;
use crate::error::{Result, TextError};
use crate::source_text::SourceText;

/// Hash algorithm used for a text's checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourceHashAlgorithm {
    None,
    #[default]
    Sha1,
    Sha256,
}

impl SourceHashAlgorithm {
    /// Length in bytes of a digest produced by this algorithm.
    pub fn digest_len(&self) -> usize {
        match self {
            SourceHashAlgorithm::None => 0,
            SourceHashAlgorithm::Sha1 => 20,
            SourceHashAlgorithm::Sha256 => 32,
        }
    }

    /// Checks that a precomputed checksum could have come from this algorithm.
    pub fn validate(&self, checksum: &[u8]) -> Result<()> {
        if checksum.len() != self.digest_len() {
            return Err(TextError::ChecksumLength {
                algorithm: *self,
                expected: self.digest_len(),
                actual: checksum.len(),
            });
        }
        Ok(())
    }
}

enum Hasher {
    None,
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Hasher {
    fn new(algorithm: SourceHashAlgorithm) -> Self {
        match algorithm {
            SourceHashAlgorithm::None => Hasher::None,
            SourceHashAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            SourceHashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Hasher::None => {}
            Hasher::Sha1(hasher) => hasher.update(bytes),
            Hasher::Sha256(hasher) => hasher.update(bytes),
        }
    }

    fn finalize(self) -> Box<[u8]> {
        match self {
            Hasher::None => Box::default(),
            Hasher::Sha1(hasher) => hasher.finalize().to_vec().into_boxed_slice(),
            Hasher::Sha256(hasher) => hasher.finalize().to_vec().into_boxed_slice(),
        }
    }
}

/// Computes the checksum of `text` from scratch.
pub(crate) fn compute(text: &SourceText) -> Box<[u8]> {
    let algorithm = text.checksum_algorithm();
    if algorithm == SourceHashAlgorithm::None {
        return Box::default();
    }

    let encoding = text.encoding().unwrap_or(Encoding::Utf8);
    let mut hasher = Hasher::new(algorithm);
    let mut bytes = Vec::new();
    text.for_each_chunk(text.full_span(), |chunk| {
        bytes.clear();
        encoding.encode_into(chunk, &mut bytes);
        hasher.update(&bytes);
    });
    hasher.finalize()
}
