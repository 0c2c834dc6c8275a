// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! The [`SourceText`] handle.
//!
//! A `SourceText` is an immutable, cheaply clonable handle to one of five
//! representations:
//!
//! - contiguous characters (below the large-object threshold),
//! - fixed-size chunks (above it),
//! - a view onto part of another text,
//! - a composite of segments produced by edits,
//! - a changed text, which wraps the edited content together with the ranges
//!   that changed since its predecessor.
//!
//! Every edit produces a new handle; nothing ever mutates content after
//! construction. Checksums and line indexes are computed on first use and
//! published at most once per text.

use std::convert::Infallible;
use std::fmt;
use std::io::{self, Read};
use std::sync::{Arc, OnceLock, Weak};

use crate::change::{TextChange, TextChangeRange};
use crate::changed::{ChangeInfo, ChangedText};
use crate::checksum::{self, SourceHashAlgorithm};
use crate::composite::{self, CompositeText};
use crate::encoding::Encoding;
use crate::error::{Result, TextError};
use crate::large_text::LargeText;
use crate::lines::{LineStartScanner, TextLineCollection};
use crate::options::TextOptions;
use crate::pool::{self, Pooled};
use crate::span::TextSpan;
use crate::string_text::StringText;
use crate::sub_text::SubText;
use crate::writer::SourceTextWriter;

/// Bytes pulled from a reader per decode step.
const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Character access shared by every representation.
///
/// Callers have already range-checked `position` and `source_index`.
pub(crate) trait TextStorage {
    fn len(&self) -> usize;

    fn char_at(&self, position: usize) -> char;

    /// Fills `destination` with the characters starting at `source_index`.
    fn copy_to(&self, source_index: usize, destination: &mut [char]);
}

pub(crate) enum Repr {
    String(StringText),
    Large(LargeText),
    Sub(SubText),
    Composite(CompositeText),
    Changed(ChangedText),
}

/// Which representation backs a [`SourceText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// One contiguous character array.
    String,
    /// Fixed-size character chunks.
    Large,
    /// A view onto part of another text.
    Sub,
    /// Segments assembled by an edit.
    Composite,
    /// The result of an edit, linked back to its predecessor.
    Changed,
}

pub(crate) struct TextInner {
    repr: Repr,
    encoding: Option<Encoding>,
    checksum_algorithm: SourceHashAlgorithm,
    can_be_embedded: bool,
    checksum: OnceLock<Box<[u8]>>,
    line_starts: OnceLock<Arc<[usize]>>,
}

/// An immutable snapshot of source characters.
///
/// Cloning is cheap and yields a handle to the same snapshot.
///
/// ```
/// use source_text::{SourceText, TextSpan};
///
/// let text = SourceText::from_str("let x = 1;");
/// let edited = text.replace(TextSpan::new(4, 1), "value").unwrap();
/// assert_eq!(edited.to_string(), "let value = 1;");
/// assert_eq!(text.to_string(), "let x = 1;");
/// ```
#[derive(Clone)]
pub struct SourceText {
    inner: Arc<TextInner>,
}

impl SourceText {
    pub(crate) fn from_repr(
        repr: Repr,
        encoding: Option<Encoding>,
        checksum_algorithm: SourceHashAlgorithm,
    ) -> Self {
        Self {
            inner: Arc::new(TextInner {
                repr,
                encoding,
                checksum_algorithm,
                can_be_embedded: false,
                checksum: OnceLock::new(),
                line_starts: OnceLock::new(),
            }),
        }
    }

    fn from_options(repr: Repr, encoding: Option<Encoding>, options: &TextOptions) -> Self {
        let checksum = OnceLock::new();
        if let Some(precomputed) = &options.checksum {
            let _ = checksum.set(precomputed.clone().into_boxed_slice());
        }
        Self {
            inner: Arc::new(TextInner {
                repr,
                encoding,
                checksum_algorithm: options.checksum_algorithm,
                can_be_embedded: options.can_be_embedded,
                checksum,
                line_starts: OnceLock::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<TextInner>) -> Self {
        Self { inner }
    }

    /// Creates a text from a string with default options.
    ///
    /// Note: We don't implement `FromStr` because it requires returning `Result`,
    /// but building a text from a string cannot fail.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::leaf_from_str(text, None, SourceHashAlgorithm::default())
    }

    /// Creates a text from a string.
    ///
    /// Fails if the options carry a checksum of the wrong length or the text
    /// is longer than `options.max_length`.
    pub fn from_str_with(text: &str, options: &TextOptions) -> Result<Self> {
        options.validate()?;
        let mut writer = SourceTextWriter::with_length_hint(text.len());
        for ch in text.chars() {
            writer.write_char(ch);
        }
        options.check_length(writer.len())?;
        Ok(Self::from_options(writer.into_repr(), options.encoding, options))
    }

    /// Creates a text from a character source of (approximately) `length`
    /// characters.
    pub fn from_chars<I>(chars: I, length: usize, options: &TextOptions) -> Result<Self>
    where
        I: IntoIterator<Item = char>,
    {
        options.validate()?;
        options.check_length(length)?;
        let mut writer = SourceTextWriter::with_length_hint(length);
        for ch in chars {
            writer.write_char(ch);
            options.check_length(writer.len())?;
        }
        Ok(Self::from_options(writer.into_repr(), options.encoding, options))
    }

    /// Decodes a text from a byte stream.
    ///
    /// A byte-order mark selects UTF-8 or UTF-16 and is not part of the text;
    /// without one, `options.encoding` (UTF-8 if unset) is used. Decoding is
    /// strict when `options.can_be_embedded` is set, otherwise malformed
    /// sequences become U+FFFD.
    pub fn from_reader<R: Read>(mut reader: R, options: &TextOptions) -> Result<Self> {
        options.validate()?;

        let mut bytes = vec![0u8; READ_BUFFER_SIZE];
        let mut filled = fill_buffer(&mut reader, &mut bytes)?;
        let (encoding, bom_length) = Encoding::detect_bom(&bytes[..filled])
            .unwrap_or((options.encoding.unwrap_or_default(), 0));

        let mut decoder = encoding.decoder(options.can_be_embedded);
        let mut writer = SourceTextWriter::new();
        let mut decoded = Vec::with_capacity(READ_BUFFER_SIZE);
        let mut binary = BinaryScan::default();
        let mut start = bom_length;
        loop {
            decoded.clear();
            if filled == 0 {
                decoder.finish(&mut decoded)?;
            } else {
                decoder.decode(&bytes[start..filled], &mut decoded)?;
            }
            if options.reject_binary && binary.scan(&decoded) {
                return Err(TextError::BinaryContent);
            }
            writer.write(&decoded);
            options.check_length(writer.len())?;
            if filled == 0 {
                break;
            }
            start = 0;
            filled = fill_buffer(&mut reader, &mut bytes)?;
        }

        tracing::debug!(
            encoding = %encoding,
            bom = bom_length > 0,
            length = writer.len(),
            "decoded text stream"
        );
        Ok(Self::from_options(writer.into_repr(), Some(encoding), options))
    }

    /// An empty text with no encoding.
    pub fn empty() -> Self {
        Self::from_repr(
            Repr::String(StringText::new(Box::default())),
            None,
            SourceHashAlgorithm::default(),
        )
    }

    /// An empty text carrying `template`'s encoding and checksum algorithm.
    pub(crate) fn empty_like(template: &SourceText) -> Self {
        Self::from_repr(
            Repr::String(StringText::new(Box::default())),
            template.encoding(),
            template.checksum_algorithm(),
        )
    }

    pub(crate) fn leaf_from_str(
        text: &str,
        encoding: Option<Encoding>,
        algorithm: SourceHashAlgorithm,
    ) -> Self {
        let mut writer = SourceTextWriter::with_length_hint(text.len());
        for ch in text.chars() {
            writer.write_char(ch);
        }
        writer.into_source_text(encoding, algorithm)
    }

    fn changed(old: &SourceText, current: SourceText, ranges: Vec<TextChangeRange>) -> Self {
        Self::from_repr(
            Repr::Changed(ChangedText::new(old, current, ranges)),
            old.encoding(),
            old.checksum_algorithm(),
        )
    }

    // ==================== Accessors ====================

    /// Number of characters in the text.
    pub fn len(&self) -> usize {
        self.storage().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> TextKind {
        match &self.inner.repr {
            Repr::String(_) => TextKind::String,
            Repr::Large(_) => TextKind::Large,
            Repr::Sub(_) => TextKind::Sub,
            Repr::Composite(_) => TextKind::Composite,
            Repr::Changed(_) => TextKind::Changed,
        }
    }

    /// The encoding the text was decoded from, or will be written with.
    pub fn encoding(&self) -> Option<Encoding> {
        self.inner.encoding
    }

    pub fn checksum_algorithm(&self) -> SourceHashAlgorithm {
        self.inner.checksum_algorithm
    }

    /// True when the text was decoded strictly and may be embedded verbatim.
    pub fn can_be_embedded(&self) -> bool {
        self.inner.can_be_embedded
    }

    /// The segments making up an edited text. A text that is not composite is
    /// its own single segment.
    pub fn segments(&self) -> &[SourceText] {
        match &self.inner.repr {
            Repr::Composite(composite) => composite.segments(),
            Repr::Changed(changed) => changed.current().segments(),
            _ => std::slice::from_ref(self),
        }
    }

    /// Returns true if both handles refer to the same snapshot.
    pub fn ptr_eq(a: &SourceText, b: &SourceText) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn inner(&self) -> &Arc<TextInner> {
        &self.inner
    }

    pub(crate) fn downgrade(&self) -> Weak<TextInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn change_info(&self) -> Option<&Arc<ChangeInfo>> {
        match &self.inner.repr {
            Repr::Changed(changed) => Some(changed.info()),
            _ => None,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.inner.repr, Repr::String(_) | Repr::Large(_))
    }

    /// Identity and size of the storage a segment keeps alive.
    pub(crate) fn storage_key(&self) -> (usize, usize) {
        match &self.inner.repr {
            Repr::Sub(sub) => sub.underlying().storage_key(),
            Repr::Changed(changed) => changed.current().storage_key(),
            _ => (Arc::as_ptr(&self.inner) as usize, self.len()),
        }
    }

    fn storage(&self) -> &dyn TextStorage {
        match &self.inner.repr {
            Repr::String(text) => text,
            Repr::Large(text) => text,
            Repr::Sub(text) => text,
            Repr::Composite(text) => text,
            Repr::Changed(text) => text,
        }
    }

    // ==================== Character Access ====================

    /// The character at `position`.
    pub fn char_at(&self, position: usize) -> Result<char> {
        let length = self.len();
        if position >= length {
            return Err(TextError::PositionOutOfRange { position, length });
        }
        Ok(self.storage().char_at(position))
    }

    /// The character at `position`, or `None` past the end.
    pub fn get(&self, position: usize) -> Option<char> {
        (position < self.len()).then(|| self.storage().char_at(position))
    }

    pub(crate) fn char_unchecked(&self, position: usize) -> char {
        self.storage().char_at(position)
    }

    /// Copies `destination.len()` characters starting at `source_index`.
    pub fn copy_to(&self, source_index: usize, destination: &mut [char]) -> Result<()> {
        self.check_span(TextSpan::new(source_index, destination.len()))?;
        self.copy_unchecked(source_index, destination);
        Ok(())
    }

    pub(crate) fn copy_unchecked(&self, source_index: usize, destination: &mut [char]) {
        if !destination.is_empty() {
            self.storage().copy_to(source_index, destination);
        }
    }

    /// Iterates the characters of the text.
    pub fn chars(&self) -> Chars<'_> {
        Chars {
            text: self,
            buffer: pool::char_buffer(),
            position: 0,
            buffered_start: 0,
            buffered_len: 0,
        }
    }

    // ==================== Spans ====================

    pub fn full_span(&self) -> TextSpan {
        TextSpan::new(0, self.len())
    }

    fn check_span(&self, span: TextSpan) -> Result<()> {
        let length = self.len();
        match span.checked_end() {
            Some(end) if end <= length => Ok(()),
            _ => Err(TextError::SpanOutOfRange {
                start: span.start,
                end: span.end(),
                length,
            }),
        }
    }

    /// The text within `span`.
    ///
    /// The full span returns this same snapshot; an empty span returns an
    /// empty text. Anything else is a view that shares storage with `self`.
    pub fn sub_text(&self, span: TextSpan) -> Result<SourceText> {
        self.check_span(span)?;
        Ok(self.sub_text_unchecked(span))
    }

    /// The text from `start` to the end.
    pub fn sub_text_from(&self, start: usize) -> Result<SourceText> {
        let length = self.len();
        if start > length {
            return Err(TextError::PositionOutOfRange {
                position: start,
                length,
            });
        }
        Ok(self.sub_text_unchecked(TextSpan::new(start, length - start)))
    }

    pub(crate) fn sub_text_unchecked(&self, span: TextSpan) -> SourceText {
        if span.start == 0 && span.length == self.len() {
            return self.clone();
        }
        if span.is_empty() {
            return SourceText::empty_like(self);
        }
        match &self.inner.repr {
            Repr::Sub(sub) => SourceText::from_repr(
                Repr::Sub(SubText::new(
                    sub.underlying().clone(),
                    TextSpan::new(sub.span().start + span.start, span.length),
                )),
                self.encoding(),
                self.checksum_algorithm(),
            ),
            Repr::Composite(composite) => composite.sub_text(self, span),
            Repr::Changed(changed) => changed.current().sub_text_unchecked(span),
            Repr::String(_) | Repr::Large(_) => SourceText::from_repr(
                Repr::Sub(SubText::new(self.clone(), span)),
                self.encoding(),
                self.checksum_algorithm(),
            ),
        }
    }

    // ==================== Streaming ====================

    /// Hands the characters within `span` to `visit` as a series of slices,
    /// borrowing storage directly where it is contiguous.
    pub(crate) fn visit_chunks<E>(
        &self,
        span: TextSpan,
        visit: &mut dyn FnMut(&[char]) -> Result<(), E>,
    ) -> Result<(), E> {
        if span.is_empty() {
            return Ok(());
        }
        match &self.inner.repr {
            Repr::String(text) => visit(&text.chars()[span.start..span.end()]),
            Repr::Large(text) => {
                for chunk in text.chunks_in(span) {
                    visit(chunk)?;
                }
                Ok(())
            }
            Repr::Sub(sub) => sub.underlying().visit_chunks(
                TextSpan::new(sub.span().start + span.start, span.length),
                visit,
            ),
            Repr::Composite(composite) => composite.visit_chunks(span, visit),
            Repr::Changed(changed) => changed.current().visit_chunks(span, visit),
        }
    }

    pub(crate) fn for_each_chunk(&self, span: TextSpan, mut visit: impl FnMut(&[char])) {
        self.visit_chunks(span, &mut |chunk| {
            visit(chunk);
            Ok::<(), Infallible>(())
        })
        .unwrap_or_else(|never| match never {});
    }

    /// Writes the characters within `span` to `writer`.
    pub fn write_to<W: fmt::Write + ?Sized>(&self, writer: &mut W, span: TextSpan) -> Result<()> {
        self.check_span(span)?;
        self.visit_chunks(span, &mut |chunk| {
            for &ch in chunk {
                writer.write_char(ch)?;
            }
            Ok::<(), fmt::Error>(())
        })?;
        Ok(())
    }

    /// The characters within `span` as a `String`.
    pub fn to_string_span(&self, span: TextSpan) -> Result<String> {
        self.check_span(span)?;
        let mut out = String::with_capacity(span.length);
        self.for_each_chunk(span, |chunk| out.extend(chunk));
        Ok(out)
    }

    // ==================== Derived Data ====================

    /// The checksum of the text, computed on first use.
    ///
    /// Empty when the algorithm is [`SourceHashAlgorithm::None`].
    pub fn checksum(&self) -> &[u8] {
        if let Some(cached) = self.inner.checksum.get() {
            return cached;
        }
        // Concurrent callers may both compute; the first to publish wins.
        let computed = checksum::compute(self);
        self.inner.checksum.get_or_init(move || computed)
    }

    /// The line index of the text, computed on first use.
    pub fn lines(&self) -> TextLineCollection<'_> {
        TextLineCollection::new(self, self.line_starts())
    }

    pub(crate) fn line_starts(&self) -> Arc<[usize]> {
        if let Some(cached) = self.inner.line_starts.get() {
            return Arc::clone(cached);
        }
        let computed = match &self.inner.repr {
            Repr::Changed(changed) => changed
                .patched_line_starts(self)
                .unwrap_or_else(|| self.scan_line_starts()),
            _ => self.scan_line_starts(),
        };
        Arc::clone(self.inner.line_starts.get_or_init(move || computed))
    }

    /// Line starts if they have already been computed.
    pub(crate) fn cached_line_starts(&self) -> Option<Arc<[usize]>> {
        self.inner.line_starts.get().cloned()
    }

    pub(crate) fn scan_line_starts(&self) -> Arc<[usize]> {
        let mut scanner = LineStartScanner::new();
        self.for_each_chunk(self.full_span(), |chunk| scanner.feed(chunk));
        scanner.finish()
    }

    // ==================== Comparison ====================

    /// Returns true if both texts hold the same characters.
    ///
    /// When both checksums are already known (with the same encoding and a
    /// real algorithm) they decide; otherwise the characters are compared.
    pub fn content_equals(&self, other: &SourceText) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        if let (Some(left), Some(right)) = (self.inner.checksum.get(), other.inner.checksum.get()) {
            if self.encoding() == other.encoding()
                && self.checksum_algorithm() == other.checksum_algorithm()
                && self.checksum_algorithm() != SourceHashAlgorithm::None
            {
                return left == right;
            }
        }

        let length = self.len();
        if length != other.len() {
            return false;
        }
        let mut left = pool::char_buffer();
        let mut right = pool::char_buffer();
        let mut position = 0;
        while position < length {
            let count = (length - position).min(left.len());
            self.copy_unchecked(position, &mut left[..count]);
            other.copy_unchecked(position, &mut right[..count]);
            if left[..count] != right[..count] {
                return false;
            }
            position += count;
        }
        true
    }

    /// The ranges that changed between `old` and this text, in `old`'s
    /// coordinates.
    ///
    /// Empty if `old` is this snapshot. When `old` is not a known predecessor
    /// (unrelated, or its history has been released) the answer is a single
    /// range replacing all of `old` with all of `self`.
    pub fn change_ranges(&self, old: &SourceText) -> Vec<TextChangeRange> {
        if Self::ptr_eq(self, old) {
            return Vec::new();
        }
        if let Repr::Changed(changed) = &self.inner.repr {
            if let Some(ranges) = changed.ranges_from(old) {
                return ranges;
            }
        }
        vec![TextChangeRange::new(old.full_span(), self.len())]
    }

    /// Like [`change_ranges`](Self::change_ranges), with the replacement text
    /// of each range taken from this text.
    pub fn text_changes(&self, old: &SourceText) -> Vec<TextChange> {
        let mut delta: isize = 0;
        self.change_ranges(old)
            .into_iter()
            .map(|range| {
                let start = range.span.start.saturating_add_signed(delta);
                let mut new_text = String::with_capacity(range.new_length);
                self.for_each_chunk(TextSpan::new(start, range.new_length), |chunk| {
                    new_text.extend(chunk)
                });
                delta += range.delta();
                TextChange::new(range.span, new_text)
            })
            .collect()
    }

    // ==================== Editing ====================

    /// Applies `changes` and returns the edited snapshot.
    ///
    /// Changes are in this text's coordinates and must be ordered by start
    /// and non-overlapping; insertions at the same position apply in order.
    /// If nothing changes, this same snapshot is returned.
    pub fn with_changes(&self, changes: &[TextChange]) -> Result<SourceText> {
        let length = self.len();
        let mut segments = Vec::new();
        let mut ranges: Vec<TextChangeRange> = Vec::new();
        let mut position = 0;

        for change in changes {
            let span = change.span;
            if span.checked_end().map_or(true, |end| end > length) {
                return Err(TextError::ChangeOutOfRange {
                    end: span.end(),
                    length,
                });
            }
            if span.start < position {
                return Err(TextError::OverlappingChanges);
            }
            if change.is_no_op() {
                continue;
            }

            if span.start > position {
                composite::add_segments(
                    &mut segments,
                    self.sub_text_unchecked(TextSpan::new(position, span.start - position)),
                );
            }
            if !change.new_text.is_empty() {
                composite::add_segments(
                    &mut segments,
                    SourceText::leaf_from_str(
                        &change.new_text,
                        self.encoding(),
                        self.checksum_algorithm(),
                    ),
                );
            }

            let range = change.to_change_range();
            match ranges.last_mut() {
                Some(last) if last.span.end() == span.start => {
                    *last = TextChangeRange::new(
                        TextSpan::new(last.span.start, last.span.length + span.length),
                        last.new_length + range.new_length,
                    );
                }
                _ => ranges.push(range),
            }
            position = span.end();
        }

        if ranges.is_empty() {
            return Ok(self.clone());
        }
        if position < length {
            composite::add_segments(
                &mut segments,
                self.sub_text_unchecked(TextSpan::new(position, length - position)),
            );
        }

        let current = composite::compose(segments, self, true);
        Ok(SourceText::changed(self, current, ranges))
    }

    /// Replaces the characters in `span` with `new_text`.
    pub fn replace(&self, span: TextSpan, new_text: &str) -> Result<SourceText> {
        self.with_changes(&[TextChange::new(span, new_text)])
    }
}

/// Reads until `buffer` is full or the reader is exhausted.
fn fill_buffer<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}

/// Looks for two consecutive NUL characters, including across blocks.
#[derive(Default)]
struct BinaryScan {
    last_was_nul: bool,
}

impl BinaryScan {
    fn scan(&mut self, chars: &[char]) -> bool {
        for &ch in chars {
            if ch == '\0' {
                if self.last_was_nul {
                    return true;
                }
                self.last_was_nul = true;
            } else {
                self.last_was_nul = false;
            }
        }
        false
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        SourceText::from_str(text)
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, self.full_span()).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceText")
            .field("kind", &self.kind())
            .field("len", &self.len())
            .field("encoding", &self.encoding())
            .finish()
    }
}

/// Iterator over the characters of a [`SourceText`], refilled through a
/// pooled scratch buffer.
pub struct Chars<'a> {
    text: &'a SourceText,
    buffer: Pooled<Vec<char>>,
    position: usize,
    buffered_start: usize,
    buffered_len: usize,
}

impl Iterator for Chars<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if self.position - self.buffered_start >= self.buffered_len {
            let count = (self.text.len() - self.position).min(self.buffer.len());
            if count == 0 {
                return None;
            }
            self.text
                .copy_unchecked(self.position, &mut self.buffer[..count]);
            self.buffered_start = self.position;
            self.buffered_len = count;
        }
        let ch = self.buffer[self.position - self.buffered_start];
        self.position += 1;
        Some(ch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.text.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chars<'_> {}

impl fmt::Debug for Chars<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chars")
            .field("position", &self.position)
            .field("len", &self.text.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::large_text::CHUNK_SIZE;
    use crate::ErrorKind;
    use std::sync::Barrier;
    use std::thread;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_from_str_basics() {
        let text = SourceText::from_str("hello");
        assert_eq!(text.len(), 5);
        assert_eq!(text.kind(), TextKind::String);
        assert_eq!(text.char_at(1).unwrap(), 'e');
        assert_eq!(text.get(5), None);
        assert_eq!(text.to_string(), "hello");
    }

    #[test]
    fn test_char_at_out_of_range() {
        let text = SourceText::from_str("abc");
        let err = text.char_at(3).unwrap_err();
        assert!(matches!(
            err,
            TextError::PositionOutOfRange {
                position: 3,
                length: 3
            }
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_large_text_from_str() {
        let source = "x".repeat(CHUNK_SIZE * 2 + 3);
        let text = SourceText::from_str(&source);
        assert_eq!(text.kind(), TextKind::Large);
        assert_eq!(text.len(), source.len());
        assert_eq!(text.to_string(), source);
    }

    #[test]
    fn test_sub_text_full_span_is_same_instance() {
        let text = SourceText::from_str("abcdef");
        let full = text.sub_text(text.full_span()).unwrap();
        assert!(SourceText::ptr_eq(&text, &full));
    }

    #[test]
    fn test_sub_text_empty_span() {
        let text = SourceText::from_str("abcdef");
        let empty = text.sub_text(TextSpan::new(3, 0)).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.checksum_algorithm(), text.checksum_algorithm());
    }

    #[test]
    fn test_sub_text_of_sub_text_points_at_leaf() {
        let text = SourceText::from_str("abcdefgh");
        let sub = text.sub_text(TextSpan::new(2, 5)).unwrap();
        assert_eq!(sub.kind(), TextKind::Sub);
        assert_eq!(sub.to_string(), "cdefg");
        let nested = sub.sub_text(TextSpan::new(1, 2)).unwrap();
        assert_eq!(nested.kind(), TextKind::Sub);
        assert_eq!(nested.to_string(), "de");
        assert!(sub.sub_text(TextSpan::new(4, 2)).is_err());
    }

    #[test]
    fn test_sub_text_from() {
        let text = SourceText::from_str("abcdef");
        assert_eq!(text.sub_text_from(4).unwrap().to_string(), "ef");
        assert!(text.sub_text_from(6).unwrap().is_empty());
        assert!(text.sub_text_from(7).is_err());
    }

    #[test]
    fn test_copy_to_checks_bounds() {
        let text = SourceText::from_str("abcdef");
        let mut dest = ['\0'; 3];
        text.copy_to(3, &mut dest).unwrap();
        assert_eq!(dest, ['d', 'e', 'f']);
        assert!(text.copy_to(4, &mut dest).is_err());
    }

    #[test]
    fn test_overflowing_spans_are_rejected() {
        let text = SourceText::from_str("abc");
        let err = text.sub_text(TextSpan::new(usize::MAX, 2)).unwrap_err();
        assert!(matches!(
            err,
            TextError::SpanOutOfRange {
                start: usize::MAX,
                end: usize::MAX,
                length: 3
            }
        ));
        assert!(text.to_string_span(TextSpan::new(1, usize::MAX)).is_err());
        let mut dest = ['\0'; 2];
        assert!(text.copy_to(usize::MAX, &mut dest).is_err());

        let err = text
            .with_changes(&[TextChange::new(TextSpan::new(1, usize::MAX), "x")])
            .unwrap_err();
        assert!(matches!(
            err,
            TextError::ChangeOutOfRange {
                end: usize::MAX,
                length: 3
            }
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(text.replace(TextSpan::new(usize::MAX, 1), "x").is_err());
        assert_eq!(text.to_string(), "abc");
    }

    #[test]
    fn test_with_no_changes_returns_same_instance() {
        let text = SourceText::from_str("abc");
        let same = text.with_changes(&[]).unwrap();
        assert!(SourceText::ptr_eq(&text, &same));

        let no_op = text
            .with_changes(&[TextChange::new(TextSpan::new(1, 0), "")])
            .unwrap();
        assert!(SourceText::ptr_eq(&text, &no_op));
    }

    #[test]
    fn test_with_changes_splices() {
        let text = SourceText::from_str("hello world");
        let edited = text
            .with_changes(&[
                TextChange::new(TextSpan::new(0, 5), "goodbye"),
                TextChange::new(TextSpan::new(6, 5), "moon"),
            ])
            .unwrap();
        assert_eq!(edited.kind(), TextKind::Changed);
        assert_eq!(edited.to_string(), "goodbye moon");
        assert_eq!(
            edited.change_ranges(&text),
            vec![
                TextChangeRange::new(TextSpan::new(0, 5), 7),
                TextChangeRange::new(TextSpan::new(6, 5), 4),
            ]
        );
    }

    #[test]
    fn test_adjacent_changes_share_a_range() {
        let text = SourceText::from_str("abcdef");
        let edited = text
            .with_changes(&[
                TextChange::new(TextSpan::new(1, 1), "X"),
                TextChange::new(TextSpan::new(2, 1), "YY"),
            ])
            .unwrap();
        assert_eq!(edited.to_string(), "aXYYdef");
        assert_eq!(
            edited.change_ranges(&text),
            vec![TextChangeRange::new(TextSpan::new(1, 2), 3)]
        );
    }

    #[test]
    fn test_unordered_changes_fail() {
        let text = SourceText::from_str("abcdef");
        let err = text
            .with_changes(&[
                TextChange::new(TextSpan::new(3, 1), "x"),
                TextChange::new(TextSpan::new(1, 1), "y"),
            ])
            .unwrap_err();
        assert!(matches!(err, TextError::OverlappingChanges));

        let err = text
            .with_changes(&[TextChange::new(TextSpan::new(5, 2), "z")])
            .unwrap_err();
        assert!(matches!(err, TextError::ChangeOutOfRange { end: 7, length: 6 }));
    }

    #[test]
    fn test_unrelated_texts_report_whole_replacement() {
        let a = SourceText::from_str("abc");
        let b = SourceText::from_str("defgh");
        assert_eq!(
            b.change_ranges(&a),
            vec![TextChangeRange::new(TextSpan::new(0, 3), 5)]
        );
        assert!(a.change_ranges(&a).is_empty());
    }

    #[test]
    fn test_text_changes_materialize_new_text() {
        let text = SourceText::from_str("one two three");
        let edited = text
            .with_changes(&[
                TextChange::new(TextSpan::new(0, 3), "1"),
                TextChange::new(TextSpan::new(8, 5), "3"),
            ])
            .unwrap();
        let changes = edited.text_changes(&text);
        assert_eq!(
            changes,
            vec![
                TextChange::new(TextSpan::new(0, 3), "1"),
                TextChange::new(TextSpan::new(8, 5), "3"),
            ]
        );
    }

    #[test]
    fn test_content_equals_across_representations() {
        let text = SourceText::from_str("abcdef");
        let edited = text.replace(TextSpan::new(2, 2), "cd").unwrap();
        assert!(!SourceText::ptr_eq(&text, &edited));
        assert!(text.content_equals(&edited));
        assert!(!text.content_equals(&SourceText::from_str("abcdeg")));
        assert!(!text.content_equals(&SourceText::from_str("abc")));
    }

    #[test]
    fn test_checksum_is_cached() {
        let text = SourceText::from_str("abc");
        let first = text.checksum().as_ptr();
        assert_eq!(first, text.checksum().as_ptr());
    }

    #[test]
    fn test_precomputed_checksum_is_used() {
        let options = TextOptions::default().with_checksum(vec![7u8; 20]);
        let text = SourceText::from_str_with("abc", &options).unwrap();
        assert_eq!(text.checksum(), &[7u8; 20][..]);
    }

    #[test]
    fn test_from_chars_enforces_max_length() {
        let options = TextOptions::default().with_max_length(3);
        let err = SourceText::from_chars("abcd".chars(), 0, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        let ok = SourceText::from_chars("abc".chars(), 3, &options).unwrap();
        assert_eq!(ok.to_string(), "abc");
    }

    #[test]
    fn test_chars_iterator() {
        let source = "ab".repeat(pool::CHAR_BUFFER_SIZE);
        let text = SourceText::from_str(&source);
        let chars = text.chars();
        assert_eq!(chars.len(), source.len());
        assert_eq!(chars.collect::<String>(), source);
    }

    #[test]
    fn test_to_string_span() {
        let text = SourceText::from_str("abcdef");
        assert_eq!(text.to_string_span(TextSpan::new(1, 3)).unwrap(), "bcd");
        assert!(text.to_string_span(TextSpan::new(5, 3)).is_err());
    }

    #[test]
    fn test_binary_scan_spans_blocks() {
        let mut scan = BinaryScan::default();
        assert!(!scan.scan(&['a', '\0']));
        assert!(scan.scan(&['\0', 'b']));

        let mut scan = BinaryScan::default();
        assert!(!scan.scan(&['\0', 'a', '\0']));
    }

    #[test]
    fn test_debug_does_not_dump_content() {
        let text = SourceText::from_str("secret");
        let debug = format!("{:?}", text);
        assert!(debug.contains("String"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_source_text_is_send_and_sync() {
        assert_send_sync::<SourceText>();
    }

    #[test]
    fn test_lazy_data_is_published_once_across_threads() {
        const THREADS: usize = 8;
        let large = SourceText::from_str(&"let x = 1;\r\n".repeat(CHUNK_SIZE / 4));
        assert_eq!(large.kind(), TextKind::Large);

        // The predecessor's index is cached, so the changed text patches it
        let base = SourceText::from_str(&"fn f() {}\n".repeat(CHUNK_SIZE / 8));
        base.lines();
        let changed = base.replace(TextSpan::new(3, 1), "g\r\nh").unwrap();

        for text in [&large, &changed] {
            let barrier = Barrier::new(THREADS);
            let results: Vec<(usize, Vec<u8>, Arc<[usize]>)> = thread::scope(|scope| {
                let handles: Vec<_> = (0..THREADS)
                    .map(|_| {
                        scope.spawn(|| {
                            barrier.wait();
                            let checksum = text.checksum();
                            let starts = text.line_starts();
                            (checksum.as_ptr() as usize, checksum.to_vec(), starts)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap())
                    .collect()
            });

            let (pointer, checksum, starts) = &results[0];
            for (other_pointer, other_checksum, other_starts) in &results[1..] {
                assert_eq!(other_pointer, pointer);
                assert_eq!(other_checksum, checksum);
                assert!(Arc::ptr_eq(other_starts, starts));
            }
            assert_eq!(checksum.len(), 20);
            assert_eq!(&starts[..], &text.scan_line_starts()[..]);
            assert_eq!(text.lines().len(), starts.len());
        }
    }
}
