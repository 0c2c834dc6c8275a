// Chunk: docs/chunks/text_decoding - Stream decoding with BOM sniffing

//! Text encodings understood by the stream constructors.
//!
//! Only byte-order-mark sniffing is done here; when no BOM is present the
//! caller's encoding (UTF-8 if none) is used. Decoding is incremental so a
//! stream can be turned into chunks without ever holding all of its bytes.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TextError};

const REPLACEMENT: char = '\u{FFFD}';

/// An encoding for the bytes backing a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
        }
    }

    /// The byte-order mark written before text in this encoding.
    pub fn preamble(&self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf16Be => &[0xFE, 0xFF],
        }
    }

    /// Looks for a byte-order mark at the start of `bytes`.
    ///
    /// Returns the encoding it announces and the length of the mark.
    pub fn detect_bom(bytes: &[u8]) -> Option<(Encoding, usize)> {
        [Encoding::Utf8, Encoding::Utf16Le, Encoding::Utf16Be]
            .into_iter()
            .find(|encoding| bytes.starts_with(encoding.preamble()))
            .map(|encoding| (encoding, encoding.preamble().len()))
    }

    /// Appends the encoded form of `chars` to `out` (no preamble).
    pub fn encode_into(&self, chars: &[char], out: &mut Vec<u8>) {
        match self {
            Encoding::Utf8 => {
                let mut buf = [0u8; 4];
                for ch in chars {
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
            }
            Encoding::Utf16Le | Encoding::Utf16Be => {
                let mut buf = [0u16; 2];
                for ch in chars {
                    for unit in ch.encode_utf16(&mut buf) {
                        let bytes = if *self == Encoding::Utf16Le {
                            unit.to_le_bytes()
                        } else {
                            unit.to_be_bytes()
                        };
                        out.extend_from_slice(&bytes);
                    }
                }
            }
        }
    }

    /// Creates an incremental decoder.
    ///
    /// A `strict` decoder fails on malformed input; otherwise malformed
    /// sequences decode to U+FFFD.
    pub fn decoder(&self, strict: bool) -> Decoder {
        Decoder {
            encoding: *self,
            strict,
            pending: Vec::with_capacity(4),
            high_surrogate: None,
            offset: 0,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental decoder; carries partial sequences between calls to [`decode`](Self::decode).
#[derive(Debug)]
pub struct Decoder {
    encoding: Encoding,
    strict: bool,
    /// Bytes of an incomplete sequence from the previous block.
    pending: Vec<u8>,
    /// UTF-16 high surrogate waiting for its low half.
    high_surrogate: Option<u16>,
    /// Bytes consumed so far, for error offsets.
    offset: usize,
}

impl Decoder {
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decodes one block of bytes, appending the characters to `out`.
    pub fn decode(&mut self, bytes: &[u8], out: &mut Vec<char>) -> Result<()> {
        if self.pending.is_empty() {
            return self.decode_block(bytes, out);
        }
        let mut joined = std::mem::take(&mut self.pending);
        joined.extend_from_slice(bytes);
        self.decode_block(&joined, out)
    }

    fn decode_block(&mut self, input: &[u8], out: &mut Vec<char>) -> Result<()> {
        match self.encoding {
            Encoding::Utf8 => self.decode_utf8(input, out),
            Encoding::Utf16Le | Encoding::Utf16Be => self.decode_utf16(input, out),
        }
    }

    /// Flushes any incomplete trailing sequence.
    pub fn finish(&mut self, out: &mut Vec<char>) -> Result<()> {
        if self.pending.is_empty() && self.high_surrogate.is_none() {
            return Ok(());
        }
        self.pending.clear();
        self.high_surrogate = None;
        self.malformed(self.offset, out)
    }

    fn malformed(&self, offset: usize, out: &mut Vec<char>) -> Result<()> {
        if self.strict {
            return Err(TextError::MalformedInput {
                encoding: self.encoding.name(),
                offset,
            });
        }
        out.push(REPLACEMENT);
        Ok(())
    }

    fn decode_utf8(&mut self, mut input: &[u8], out: &mut Vec<char>) -> Result<()> {
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    out.extend(valid.chars());
                    self.offset += input.len();
                    return Ok(());
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&input[..valid_up_to]) {
                        out.extend(valid.chars());
                    }
                    match err.error_len() {
                        // Incomplete sequence at the end of the block
                        None => {
                            self.offset += valid_up_to;
                            self.pending.extend_from_slice(&input[valid_up_to..]);
                            return Ok(());
                        }
                        Some(bad) => {
                            self.malformed(self.offset + valid_up_to, out)?;
                            self.offset += valid_up_to + bad;
                            input = &input[valid_up_to + bad..];
                        }
                    }
                }
            }
        }
    }

    fn decode_utf16(&mut self, input: &[u8], out: &mut Vec<char>) -> Result<()> {
        let mut pairs = input.chunks_exact(2);
        for pair in &mut pairs {
            let bytes = [pair[0], pair[1]];
            let unit = if self.encoding == Encoding::Utf16Le {
                u16::from_le_bytes(bytes)
            } else {
                u16::from_be_bytes(bytes)
            };
            self.push_utf16_unit(unit, out)?;
            self.offset += 2;
        }
        self.pending.extend_from_slice(pairs.remainder());
        Ok(())
    }

    fn push_utf16_unit(&mut self, unit: u16, out: &mut Vec<char>) -> Result<()> {
        if let Some(high) = self.high_surrogate.take() {
            if (0xDC00..0xE000).contains(&unit) {
                let scalar = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                out.push(char::from_u32(scalar).unwrap_or(REPLACEMENT));
                return Ok(());
            }
            // Unpaired high surrogate; the current unit is decoded on its own below.
            self.malformed(self.offset.saturating_sub(2), out)?;
        }

        match unit {
            0xD800..=0xDBFF => self.high_surrogate = Some(unit),
            0xDC00..=0xDFFF => self.malformed(self.offset, out)?,
            _ => out.push(char::from_u32(u32::from(unit)).unwrap_or(REPLACEMENT)),
        }
        Ok(())
    }
}
