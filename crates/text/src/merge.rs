// Chunk: docs/chunks/range_merge - Merging change ranges across generations

//! Merging successive generations of change ranges into one equivalent list.
//!
//! Given `older` (ranges over text `T0`, producing `T1`) and `newer` (ranges
//! over `T1`, producing `T2`), [`merge`] returns ranges over `T0` that describe
//! `T2` directly. Every character of `T0` outside the returned spans appears
//! unchanged in `T2`, shifted by the net delta of the ranges before it.
//!
//! Both cursors walk forward together. `old_delta` is the length delta of the
//! older ranges already emitted, so an older range's inserted text occupies
//! `[span.start + old_delta, span.start + old_delta + new_length)` in `T1`.

use crate::change::TextChangeRange;
use crate::span::TextSpan;

/// A newer change, still expressed in the intermediate text's coordinates.
#[derive(Debug, Clone, Copy)]
struct NewChange {
    start: isize,
    length: isize,
    new_length: isize,
}

impl NewChange {
    fn end(&self) -> isize {
        self.start + self.length
    }

    fn is_unchanged(&self) -> bool {
        self.length == 0 && self.new_length == 0
    }

    /// Maps the change back onto the original text.
    fn adjusted(&self, old_delta: isize) -> TextChangeRange {
        TextChangeRange::new(
            TextSpan::new((self.start - old_delta) as usize, self.length as usize),
            self.new_length as usize,
        )
    }
}

impl From<TextChangeRange> for NewChange {
    fn from(range: TextChangeRange) -> Self {
        Self {
            start: range.span.start as isize,
            length: range.span.length as isize,
            new_length: range.new_length as isize,
        }
    }
}

/// Accumulates merged output, dropping no-op ranges and coalescing ranges
/// whose spans touch.
#[derive(Debug, Default)]
struct RangeBuilder {
    ranges: Vec<TextChangeRange>,
}

impl RangeBuilder {
    fn push(&mut self, range: TextChangeRange) {
        if range.is_unchanged() {
            return;
        }
        if let Some(last) = self.ranges.last_mut() {
            if last.span.end() == range.span.start {
                last.span.length += range.span.length;
                last.new_length += range.new_length;
                return;
            }
        }
        self.ranges.push(range);
    }
}

/// Merges two generations of change ranges.
///
/// `older` must be ordered and non-overlapping over the original text;
/// `newer` must be ordered and non-overlapping over the text produced by `older`.
pub fn merge(older: &[TextChangeRange], newer: &[TextChangeRange]) -> Vec<TextChangeRange> {
    if newer.is_empty() {
        return older.to_vec();
    }
    if older.is_empty() {
        return newer.to_vec();
    }

    let mut builder = RangeBuilder::default();
    let mut olds = older.iter().copied();
    let mut news = newer.iter().copied().map(NewChange::from);
    let mut old = olds.next();
    let mut new = news.next();
    let mut old_delta: isize = 0;

    loop {
        let (o, n) = match (old, new) {
            (None, None) => break,
            (Some(o), None) => {
                builder.push(o);
                old = olds.next();
                continue;
            }
            (None, Some(n)) => {
                builder.push(n.adjusted(old_delta));
                new = news.next();
                continue;
            }
            (Some(o), Some(n)) => (o, n),
        };

        if o.is_unchanged() {
            old = olds.next();
            continue;
        }
        if n.is_unchanged() {
            new = news.next();
            continue;
        }

        // Where the older range's inserted text sits in the intermediate text.
        let old_start = o.span.start as isize + old_delta;
        let old_end = old_start + o.new_length as isize;

        if n.end() <= old_start {
            //                  [--old--]
            // [--new--]
            builder.push(n.adjusted(old_delta));
            new = news.next();
        } else if n.start >= old_end {
            // [--old--]
            //            [--new--]
            builder.push(o);
            old_delta += o.delta();
            old = olds.next();
        } else if n.start < old_start {
            // The newer change deletes original text before reaching the older
            // insertion: emit that leading deletion on its own.
            let leading = old_start - n.start;
            builder.push(
                NewChange {
                    start: n.start,
                    length: leading,
                    new_length: 0,
                }
                .adjusted(old_delta),
            );
            new = Some(NewChange {
                start: old_start,
                length: n.length - leading,
                new_length: n.new_length,
            });
        } else if n.start > old_start {
            // The head of the older insertion is untouched: emit it and keep
            // the tail as the current older range.
            let inserted = n.start - old_start;
            let deleted = (o.span.length as isize).min(inserted);
            builder.push(TextChangeRange::new(
                TextSpan::new(o.span.start, deleted as usize),
                inserted as usize,
            ));
            old_delta += inserted - deleted;
            old = Some(TextChangeRange::new(
                TextSpan::new(o.span.start + deleted as usize, o.span.length - deleted as usize),
                o.new_length - inserted as usize,
            ));
        } else if n.length <= o.new_length as isize {
            // Same start, and the newer change only replaces text the older
            // one inserted. Its replacement goes first; whatever it left of the
            // older insertion stays current.
            builder.push(TextChangeRange::new(
                TextSpan::new(o.span.start, 0),
                n.new_length as usize,
            ));
            old_delta += n.length;
            old = Some(TextChangeRange::new(
                o.span,
                o.new_length - n.length as usize,
            ));
            new = news.next();
        } else {
            // Same start, and the newer change removes the whole older
            // insertion and keeps deleting past it.
            builder.push(TextChangeRange::new(o.span, n.new_length as usize));
            old_delta += o.delta();
            new = Some(NewChange {
                start: old_end,
                length: n.length - o.new_length as isize,
                new_length: 0,
            });
            old = olds.next();
        }
    }

    builder.ranges
}

/// Merges any number of generations, oldest first.
pub fn merge_all<'a, I>(generations: I) -> Vec<TextChangeRange>
where
    I: IntoIterator<Item = &'a [TextChangeRange]>,
{
    let mut generations = generations.into_iter();
    let first = match generations.next() {
        Some(first) => first.to_vec(),
        None => return Vec::new(),
    };
    generations.fold(first, |acc, next| merge(&acc, next))
}
