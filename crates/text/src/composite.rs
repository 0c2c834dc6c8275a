// Chunk: docs/chunks/composite_text - Segment composition for edited texts

//! Texts assembled from segments.
//!
//! An edit produces a list of segments: views onto unchanged parts of the old
//! text plus fresh leaves for inserted text. [`compose`] turns that list into
//! a single text, and keeps two costs bounded while doing so:
//!
//! - **Retained storage.** Small views can pin a huge original buffer. When
//!   the storage kept alive exceeds twice the visible length, every segment
//!   is copied into one fresh leaf.
//! - **Segment count.** Past [`MAXIMUM_SEGMENT_COUNT_BEFORE_REDUCTION`]
//!   segments, runs of adjacent small segments are merged until the count is
//!   at most [`TARGET_SEGMENT_COUNT_AFTER_REDUCTION`].
//!
//! Segments are never composite themselves, so lookups are a single binary
//! search over segment start offsets.

use std::collections::HashSet;

use crate::source_text::{Repr, SourceText, TextKind, TextStorage};
use crate::span::TextSpan;
use crate::writer::SourceTextWriter;

/// Segment count above which adjacent small segments are combined.
pub const MAXIMUM_SEGMENT_COUNT_BEFORE_REDUCTION: usize = 64;

/// Segment count the combine pass aims for.
pub const TARGET_SEGMENT_COUNT_AFTER_REDUCTION: usize = 32;

/// Largest segment length considered "small" on the first combine attempt.
pub const INITIAL_SEGMENT_SIZE_FOR_COMBINING: usize = 32;

/// Upper bound for the "small" threshold, which doubles per attempt.
pub const MAXIMUM_SEGMENT_SIZE_FOR_COMBINING: usize = i32::MAX as usize / 16;

pub(crate) struct CompositeText {
    segments: Box<[SourceText]>,
    /// `segment_starts[i]` is the position of `segments[i]` within the composite.
    segment_starts: Box<[usize]>,
    length: usize,
}

impl CompositeText {
    /// Builds a composite from two or more non-empty, non-composite segments.
    fn new(segments: Vec<SourceText>) -> Self {
        let mut segment_starts = Vec::with_capacity(segments.len());
        let mut length = 0;
        for segment in &segments {
            debug_assert!(!segment.is_empty(), "composite segments must not be empty");
            debug_assert!(
                !matches!(segment.kind(), TextKind::Composite | TextKind::Changed),
                "composite segments must be flattened"
            );
            segment_starts.push(length);
            length += segment.len();
        }
        Self {
            segments: segments.into_boxed_slice(),
            segment_starts: segment_starts.into_boxed_slice(),
            length,
        }
    }

    pub(crate) fn segments(&self) -> &[SourceText] {
        &self.segments
    }

    /// Segment holding `position`, and the offset of `position` within it.
    fn index_and_offset(&self, position: usize) -> (usize, usize) {
        let index = match self.segment_starts.binary_search(&position) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        (index, position - self.segment_starts[index])
    }

    /// The segments covering a non-empty span, each clipped to the span.
    fn covered(&self, span: TextSpan) -> impl Iterator<Item = (&SourceText, TextSpan)> + '_ {
        let (first, offset) = self.index_and_offset(span.start);
        let mut remaining = span.length;
        let mut offset = offset;
        self.segments[first..].iter().map_while(move |segment| {
            if remaining == 0 {
                return None;
            }
            let count = remaining.min(segment.len() - offset);
            let clipped = TextSpan::new(offset, count);
            remaining -= count;
            offset = 0;
            Some((segment, clipped))
        })
    }

    /// The part of the composite within a span that is neither empty nor full.
    pub(crate) fn sub_text(&self, this: &SourceText, span: TextSpan) -> SourceText {
        let mut segments = Vec::new();
        for (segment, clipped) in self.covered(span) {
            add_segments(&mut segments, segment.sub_text_unchecked(clipped));
        }
        compose(segments, this, false)
    }

    pub(crate) fn visit_chunks<E>(
        &self,
        span: TextSpan,
        visit: &mut dyn FnMut(&[char]) -> Result<(), E>,
    ) -> Result<(), E> {
        for (segment, clipped) in self.covered(span) {
            segment.visit_chunks(clipped, visit)?;
        }
        Ok(())
    }
}

impl TextStorage for CompositeText {
    fn len(&self) -> usize {
        self.length
    }

    fn char_at(&self, position: usize) -> char {
        let (index, offset) = self.index_and_offset(position);
        self.segments[index].char_unchecked(offset)
    }

    fn copy_to(&self, source_index: usize, destination: &mut [char]) {
        let mut written = 0;
        for (segment, clipped) in self.covered(TextSpan::new(source_index, destination.len())) {
            let end = written + clipped.length;
            segment.copy_unchecked(clipped.start, &mut destination[written..end]);
            written = end;
        }
    }
}

/// Appends `text` to a segment list, flattening composites and dropping
/// empty texts.
pub(crate) fn add_segments(segments: &mut Vec<SourceText>, text: SourceText) {
    if text.is_empty() {
        return;
    }
    match text.kind() {
        TextKind::Composite | TextKind::Changed => {
            segments.extend(text.segments().iter().cloned());
        }
        _ => segments.push(text),
    }
}

/// Combines segments into one text.
///
/// With `adjust`, the storage-trimming and segment-combining passes run
/// first. Zero segments yield an empty text carrying `original`'s encoding;
/// a single segment is returned as is.
pub(crate) fn compose(
    mut segments: Vec<SourceText>,
    original: &SourceText,
    adjust: bool,
) -> SourceText {
    if adjust {
        trim_inaccessible_text(&mut segments, original);
        reduce_segment_count_if_necessary(&mut segments, original);
    }

    if segments.len() > 1 {
        let composite = CompositeText::new(segments);
        debug_assert_eq!(
            composite.length,
            composite.segments.iter().map(SourceText::len).sum::<usize>()
        );
        return SourceText::from_repr(
            Repr::Composite(composite),
            original.encoding(),
            original.checksum_algorithm(),
        );
    }
    segments
        .pop()
        .unwrap_or_else(|| SourceText::empty_like(original))
}

// ==================== Trim Pass ====================

fn trim_inaccessible_text(segments: &mut Vec<SourceText>, original: &SourceText) {
    let (length, storage) = length_and_storage_size(segments);
    if storage <= length.saturating_mul(2) {
        return;
    }
    tracing::debug!(
        length,
        storage,
        segments = segments.len(),
        "rewriting composite text to release retained storage"
    );
    let flattened = flatten(segments, original);
    segments.clear();
    segments.push(flattened);
}

/// Visible length, and total length of the distinct storage kept alive.
fn length_and_storage_size(segments: &[SourceText]) -> (usize, usize) {
    let mut seen = HashSet::new();
    let mut length = 0;
    let mut storage = 0;
    for segment in segments {
        length += segment.len();
        let (key, size) = segment.storage_key();
        if seen.insert(key) {
            storage += size;
        }
    }
    (length, storage)
}

/// Copies `segments` into one fresh leaf.
fn flatten(segments: &[SourceText], original: &SourceText) -> SourceText {
    let length = segments.iter().map(SourceText::len).sum();
    let mut writer = SourceTextWriter::with_length_hint(length);
    for segment in segments {
        segment.for_each_chunk(segment.full_span(), |chunk| writer.write(chunk));
    }
    writer.into_source_text(original.encoding(), original.checksum_algorithm())
}

// ==================== Combine Pass ====================

fn reduce_segment_count_if_necessary(segments: &mut Vec<SourceText>, original: &SourceText) {
    if segments.len() <= MAXIMUM_SEGMENT_COUNT_BEFORE_REDUCTION {
        return;
    }
    let before = segments.len();
    let size = minimal_segment_size_for_combining(segments);
    combine_segments(segments, size, original);
    tracing::debug!(
        before,
        after = segments.len(),
        segment_size = size,
        "combined small composite segments"
    );
}

/// Smallest "small segment" threshold that brings the count down to the target.
fn minimal_segment_size_for_combining(segments: &[SourceText]) -> usize {
    let mut size = INITIAL_SEGMENT_SIZE_FOR_COMBINING;
    while size <= MAXIMUM_SEGMENT_SIZE_FOR_COMBINING {
        if segment_count_if_combined(segments, size) <= TARGET_SEGMENT_COUNT_AFTER_REDUCTION {
            return size;
        }
        size *= 2;
    }
    MAXIMUM_SEGMENT_SIZE_FOR_COMBINING
}

fn segment_count_if_combined(segments: &[SourceText], size: usize) -> usize {
    let mut count = 0;
    let mut index = 0;
    while index < segments.len() {
        let run = small_run(&segments[index..], size);
        index += run.max(1);
        count += 1;
    }
    count
}

/// Length of the run of segments no longer than `size` at the front of `segments`.
fn small_run(segments: &[SourceText], size: usize) -> usize {
    segments
        .iter()
        .take_while(|segment| segment.len() <= size)
        .count()
}

fn combine_segments(segments: &mut Vec<SourceText>, size: usize, original: &SourceText) {
    let mut combined = Vec::with_capacity(TARGET_SEGMENT_COUNT_AFTER_REDUCTION);
    let mut index = 0;
    while index < segments.len() {
        let run = small_run(&segments[index..], size);
        if run > 1 {
            combined.push(flatten(&segments[index..index + run], original));
            index += run;
        } else {
            combined.push(segments[index].clone());
            index += 1;
        }
    }
    *segments = combined;
}
