// Chunk: docs/chunks/change_history - Versioned diff chain between text snapshots

//! Edited texts and their change history.
//!
//! A [`ChangedText`] holds the edited content plus a [`ChangeInfo`]: the
//! ranges that changed relative to the immediate predecessor, a weak handle
//! to that predecessor, and a link to the predecessor's own `ChangeInfo`.
//! Following the links answers "what changed since snapshot Y" across any
//! number of generations, as long as the snapshots involved are still alive.
//!
//! Older snapshots are never kept alive by the chain. When a link's snapshot
//! has been dropped, everything behind it becomes unreachable and the chain is
//! cut there the next time a newer text is built on top of it.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::change::TextChangeRange;
use crate::lines::starts_line_at;
use crate::merge::merge_all;
use crate::source_text::{SourceText, TextInner, TextKind, TextStorage};

/// Links examined for pruning when a changed text is built. Keeps building
/// a long retained history linear; deeper dead links are cut by
/// [`ChangedText::ranges_from`] when it reaches them.
const PRUNE_DEPTH: usize = 32;

pub(crate) struct ChangedText {
    /// The edited content. Never itself a changed text.
    current: SourceText,
    info: Arc<ChangeInfo>,
}

pub(crate) struct ChangeInfo {
    ranges: Vec<TextChangeRange>,
    old_text: Weak<TextInner>,
    previous: Mutex<Option<Arc<ChangeInfo>>>,
}

impl ChangedText {
    pub(crate) fn new(old: &SourceText, current: SourceText, ranges: Vec<TextChangeRange>) -> Self {
        debug_assert!(current.kind() != TextKind::Changed);
        let info = Arc::new(ChangeInfo {
            ranges,
            old_text: old.downgrade(),
            previous: Mutex::new(old.change_info().cloned()),
        });
        info.remove_broken_links();
        Self { current, info }
    }

    pub(crate) fn current(&self) -> &SourceText {
        &self.current
    }

    pub(crate) fn info(&self) -> &Arc<ChangeInfo> {
        &self.info
    }

    /// Ranges that changed between `old` and this text, if `old` is a
    /// predecessor still reachable through the chain.
    pub(crate) fn ranges_from(&self, old: &SourceText) -> Option<Vec<TextChangeRange>> {
        if self.info.is_from(old) {
            return Some(self.info.ranges.clone());
        }
        if self.info.is_collected() {
            self.info.set_previous(None);
            return None;
        }

        let mut generations = vec![Arc::clone(&self.info)];
        let mut parent = Arc::clone(&self.info);
        while let Some(info) = parent.previous() {
            // Dead links deeper than the construction-time walk are cut here
            if info.is_collected() {
                parent.set_previous(None);
                tracing::trace!("pruned change history behind a dropped snapshot");
                return None;
            }
            generations.push(Arc::clone(&info));
            if info.is_from(old) {
                generations.reverse();
                return Some(merge_all(
                    generations.iter().map(|info| info.ranges.as_slice()),
                ));
            }
            parent = info;
        }
        None
    }

    /// Line starts derived from the predecessor's index, if the predecessor is
    /// alive and has already built one.
    ///
    /// Starts inside unchanged regions are shifted; only the positions each
    /// change touches are re-examined.
    pub(crate) fn patched_line_starts(&self, this: &SourceText) -> Option<Arc<[usize]>> {
        let old = self.info.old_text()?;
        let old_starts = old.cached_line_starts()?;

        let mut starts = Vec::with_capacity(old_starts.len() + self.info.ranges.len());
        starts.push(0);
        let mut position = 0;
        let mut delta: isize = 0;
        for range in &self.info.ranges {
            copy_unchanged_starts(this, &old_starts, position, range.span.start, delta, &mut starts);
            let new_start = range.span.start.saturating_add_signed(delta);
            for candidate in new_start..=new_start + range.new_length {
                push_if_line_start(this, candidate, &mut starts);
            }
            position = range.span.end();
            delta += range.delta();
        }
        copy_unchanged_starts(
            this,
            &old_starts,
            position,
            old.len() + 1,
            delta,
            &mut starts,
        );

        tracing::trace!(
            changes = self.info.ranges.len(),
            lines = starts.len(),
            "patched line starts from predecessor"
        );
        #[cfg(debug_assertions)]
        assert_line_starts_consistent(this, &starts);
        Some(starts.into())
    }
}

/// Copies the old line starts strictly after `from` and before `to`, shifted
/// by `delta`, after re-checking the boundary at `from` itself.
fn copy_unchanged_starts(
    text: &SourceText,
    old_starts: &[usize],
    from: usize,
    to: usize,
    delta: isize,
    starts: &mut Vec<usize>,
) {
    push_if_line_start(text, from.saturating_add_signed(delta), starts);
    let first = old_starts.partition_point(|&start| start <= from);
    for &start in old_starts[first..].iter().take_while(|&&start| start < to) {
        starts.push(start.saturating_add_signed(delta));
    }
}

fn push_if_line_start(text: &SourceText, position: usize, starts: &mut Vec<usize>) {
    let last = starts.last().copied().unwrap_or(0);
    if position > last && starts_line_at(text, position) {
        starts.push(position);
    }
}

/// Compares a sample of patched indexes against a full rescan.
#[cfg(debug_assertions)]
fn assert_line_starts_consistent(text: &SourceText, patched: &[usize]) {
    use std::sync::atomic::{AtomicU64, Ordering};

    static PATCH_COUNT: AtomicU64 = AtomicU64::new(0);
    if PATCH_COUNT.fetch_add(1, Ordering::Relaxed) % 64 != 0 {
        return;
    }
    let scanned = text.scan_line_starts();
    assert_eq!(
        patched,
        &scanned[..],
        "patched line starts diverged from a full scan"
    );
}

impl TextStorage for ChangedText {
    fn len(&self) -> usize {
        self.current.len()
    }

    fn char_at(&self, position: usize) -> char {
        self.current.char_unchecked(position)
    }

    fn copy_to(&self, source_index: usize, destination: &mut [char]) {
        self.current.copy_unchecked(source_index, destination);
    }
}

impl ChangeInfo {
    fn previous(&self) -> Option<Arc<ChangeInfo>> {
        self.previous
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_previous(&self, previous: Option<Arc<ChangeInfo>>) {
        *self.previous.lock().unwrap_or_else(PoisonError::into_inner) = previous;
    }

    fn old_text(&self) -> Option<SourceText> {
        self.old_text.upgrade().map(SourceText::from_inner)
    }

    fn is_from(&self, old: &SourceText) -> bool {
        self.old_text
            .upgrade()
            .is_some_and(|inner| Arc::ptr_eq(&inner, old.inner()))
    }

    fn is_collected(&self) -> bool {
        self.old_text.strong_count() == 0
    }

    /// Cuts the chain at the first dead link within [`PRUNE_DEPTH`] links.
    fn remove_broken_links(self: &Arc<Self>) {
        let mut parent = Arc::clone(self);
        for _ in 0..PRUNE_DEPTH {
            let Some(node) = parent.previous() else {
                return;
            };
            if node.is_collected() {
                parent.set_previous(None);
                tracing::trace!("pruned change history behind a dropped snapshot");
                return;
            }
            parent = node;
        }
    }

    #[cfg(test)]
    fn chain_len(self: &Arc<Self>) -> usize {
        let mut count = 1;
        let mut node = self.previous();
        while let Some(info) = node {
            count += 1;
            node = info.previous();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::TextChange;
    use crate::span::TextSpan;

    fn insert(text: &SourceText, position: usize, new_text: &str) -> SourceText {
        text.with_changes(&[TextChange::new(TextSpan::new(position, 0), new_text)])
            .unwrap()
    }

    #[test]
    fn test_direct_predecessor_uses_stored_ranges() {
        let v0 = SourceText::from_str("abcdef");
        let v1 = insert(&v0, 3, "XYZ");
        assert_eq!(
            v1.change_ranges(&v0),
            vec![TextChangeRange::new(TextSpan::new(3, 0), 3)]
        );
    }

    #[test]
    fn test_multi_hop_ranges_are_merged() {
        let v0 = SourceText::from_str("abcdef");
        let v1 = insert(&v0, 1, "XYZ");
        let v2 = v1
            .with_changes(&[TextChange::new(TextSpan::new(2, 3), "")])
            .unwrap();
        assert_eq!(v2.to_string(), "aXcdef");
        assert_eq!(
            v2.change_ranges(&v0),
            vec![TextChangeRange::new(TextSpan::new(1, 1), 1)]
        );
        assert_eq!(
            v2.change_ranges(&v1),
            vec![TextChangeRange::new(TextSpan::new(2, 3), 0)]
        );
    }

    #[test]
    fn test_dropped_intermediate_prunes_chain() {
        let v0 = SourceText::from_str("abcdef");
        let v1 = insert(&v0, 0, "1");
        let v2 = insert(&v1, 0, "2");
        assert_eq!(v2.change_info().map(|info| info.chain_len()), Some(2));

        drop(v1);
        let v3 = insert(&v2, 0, "3");
        // v1 is gone, so the history behind v2 is unreachable
        assert_eq!(v3.change_info().map(|info| info.chain_len()), Some(1));
        assert_eq!(
            v3.change_ranges(&v2),
            vec![TextChangeRange::new(TextSpan::new(0, 0), 1)]
        );
        // v0 is no longer reachable: whole replacement
        assert_eq!(
            v3.change_ranges(&v0),
            vec![TextChangeRange::new(TextSpan::new(0, 6), 9)]
        );
    }

    #[test]
    fn test_deep_dead_link_is_cut_by_query() {
        let mut history = vec![SourceText::from_str("abcdef")];
        for i in 0..PRUNE_DEPTH + 8 {
            let next = insert(&history[i], 0, "x");
            history.push(next);
        }
        let newest = history.last().cloned().unwrap();
        let full_chain = PRUNE_DEPTH + 8;
        assert_eq!(newest.change_info().map(|info| info.chain_len()), Some(full_chain));

        // Too deep for the walk done at construction time
        history.remove(1);
        let newer = insert(&newest, 0, "y");
        assert_eq!(
            newer.change_info().map(|info| info.chain_len()),
            Some(full_chain + 1)
        );

        // v0 sits behind the dead link: whole replacement, and the chain is cut
        assert_eq!(
            newer.change_ranges(&history[0]),
            vec![TextChangeRange::new(TextSpan::new(0, 6), newer.len())]
        );
        assert_eq!(
            newer.change_info().map(|info| info.chain_len()),
            Some(full_chain - 1)
        );
        // history[1] is now v2, the oldest snapshot still reachable
        assert_eq!(
            newer.change_ranges(&history[1]),
            vec![TextChangeRange::new(TextSpan::new(0, 0), full_chain - 1)]
        );
    }

    #[test]
    fn test_current_is_never_changed() {
        let v0 = SourceText::from_str("abc");
        let v1 = insert(&v0, 1, "x");
        let v2 = insert(&v1, 1, "y");
        assert_eq!(v2.to_string(), "ayxbc");
        assert!(v2
            .segments()
            .iter()
            .all(|segment| !matches!(segment.kind(), TextKind::Changed | TextKind::Composite)));
    }

    #[test]
    fn test_line_starts_patched_from_predecessor() {
        let v0 = SourceText::from_str("one\ntwo\r\nthree\n");
        assert_eq!(v0.lines().len(), 4);

        // Splitting a CRLF pair changes where lines start
        let v1 = insert(&v0, 8, "\n");
        let patched = v1.line_starts();
        assert_eq!(&patched[..], &v1.scan_line_starts()[..]);
        assert_eq!(v1.lines().len(), 5);

        let v2 = v1
            .with_changes(&[TextChange::new(TextSpan::new(0, 4), "")])
            .unwrap();
        assert_eq!(v1.lines().len(), 5);
        assert_eq!(&v2.line_starts()[..], &v2.scan_line_starts()[..]);
    }

    #[test]
    fn test_line_starts_without_predecessor_index_are_scanned() {
        let v0 = SourceText::from_str("a\nb");
        let v1 = insert(&v0, 3, "\nc");
        assert!(v0.cached_line_starts().is_none());
        assert_eq!(&v1.line_starts()[..], &[0, 2, 4][..]);
    }
}
