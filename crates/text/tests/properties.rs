// Chunk: docs/chunks/range_merge - Merging change ranges across generations

//! Property tests for edits, change-range merging, line indexes and checksums.
//!
//! Each property compares the text layer against a naive model: a `Vec<char>`
//! spliced by hand.

use proptest::prelude::*;
use source_text::{merge, SourceText, TextChange, TextChangeRange, TextSpan};

// ==================== Model ====================

/// Raw edit shape: skip `gap` characters, delete `delete`, insert `insert`.
type RawEdit = (usize, usize, String);

fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[ab\r\n]{0,40}",
        2 => "[a-zé\u{2028} ]{0,60}",
        1 => "(ab\r\n){0,10}",
    ]
}

fn insert_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[xy]{0,4}",
        1 => "[\r\n]{1,3}",
        1 => Just(String::new()),
    ]
}

fn edits_strategy() -> impl Strategy<Value = Vec<RawEdit>> {
    prop::collection::vec((0usize..8, 0usize..8, insert_strategy()), 0..5)
}

/// Turns raw edit shapes into ordered, in-range changes over a text of `len`.
fn changes_for(len: usize, raw: &[RawEdit]) -> Vec<TextChange> {
    let mut changes = Vec::new();
    let mut position = 0;
    for (gap, delete, insert) in raw {
        let start = (position + gap).min(len);
        let length = (*delete).min(len - start);
        changes.push(TextChange::new(TextSpan::new(start, length), insert.as_str()));
        position = start + length;
    }
    changes
}

fn splice(text: &str, changes: &[TextChange]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut position = 0;
    for change in changes {
        out.extend(&chars[position..change.span.start]);
        out.push_str(&change.new_text);
        position = change.span.end();
    }
    out.extend(&chars[position..]);
    out
}

/// Rebuilds `new` from `old` using only the ranges: characters outside the
/// ranges come from `old`, the replacements come from `new`.
fn reconstruct(old: &str, ranges: &[TextChangeRange], new: &str) -> String {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    let mut out = String::new();
    let mut old_position = 0;
    let mut new_position = 0;
    for range in ranges {
        let unchanged = range.span.start - old_position;
        out.extend(&old[old_position..range.span.start]);
        new_position += unchanged;
        out.extend(&new[new_position..new_position + range.new_length]);
        new_position += range.new_length;
        old_position = range.span.end();
    }
    out.extend(&old[old_position..]);
    out
}

fn assert_well_formed(ranges: &[TextChangeRange], old_len: usize) {
    let mut end = 0;
    for (index, range) in ranges.iter().enumerate() {
        assert!(!range.is_unchanged(), "no-op range in {:?}", ranges);
        if index > 0 {
            assert!(range.span.start > end, "ranges touch or overlap: {:?}", ranges);
        }
        end = range.span.end();
    }
    assert!(end <= old_len);
}

fn line_starts(text: &str) -> Vec<usize> {
    SourceText::from_str(text).lines().starts().to_vec()
}

// ==================== Properties ====================

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_with_changes_matches_splice(base in text_strategy(), raw in edits_strategy()) {
        let text = SourceText::from_str(&base);
        let changes = changes_for(text.len(), &raw);
        let edited = text.with_changes(&changes).unwrap();
        let expected = splice(&base, &changes);
        prop_assert_eq!(edited.to_string(), expected.clone());
        prop_assert_eq!(edited.len(), expected.chars().count());
        prop_assert_eq!(edited.chars().collect::<String>(), expected);
    }

    #[test]
    fn prop_direct_ranges_reconstruct(base in text_strategy(), raw in edits_strategy()) {
        let v0 = SourceText::from_str(&base);
        let v1 = v0.with_changes(&changes_for(v0.len(), &raw)).unwrap();
        let ranges = v1.change_ranges(&v0);
        prop_assert_eq!(reconstruct(&base, &ranges, &v1.to_string()), v1.to_string());
    }

    #[test]
    fn prop_merged_ranges_are_exact(
        base in text_strategy(),
        first in edits_strategy(),
        second in edits_strategy(),
    ) {
        let v0 = SourceText::from_str(&base);
        let v1 = v0.with_changes(&changes_for(v0.len(), &first)).unwrap();
        let v2 = v1.with_changes(&changes_for(v1.len(), &second)).unwrap();

        let merged = v2.change_ranges(&v0);
        assert_well_formed(&merged, v0.len());
        prop_assert_eq!(
            merged.clone(),
            merge(&v1.change_ranges(&v0), &v2.change_ranges(&v1))
        );

        let new = v2.to_string();
        prop_assert_eq!(reconstruct(&base, &merged, &new), new.clone());

        let delta: isize = merged.iter().map(TextChangeRange::delta).sum();
        prop_assert_eq!(v0.len() as isize + delta, v2.len() as isize);
    }

    #[test]
    fn prop_three_generations_merge(
        base in text_strategy(),
        generations in prop::collection::vec(edits_strategy(), 3),
    ) {
        let mut versions = vec![SourceText::from_str(&base)];
        for raw in &generations {
            let last = versions[versions.len() - 1].clone();
            versions.push(last.with_changes(&changes_for(last.len(), raw)).unwrap());
        }
        let oldest = &versions[0];
        let newest = &versions[versions.len() - 1];
        let merged = newest.change_ranges(oldest);
        let new = newest.to_string();
        prop_assert_eq!(reconstruct(&base, &merged, &new), new);
    }

    #[test]
    fn prop_patched_lines_match_scan(base in text_strategy(), raw in edits_strategy()) {
        let v0 = SourceText::from_str(&base);
        // Build the old index first so the edit patches it
        prop_assert_eq!(v0.lines().starts().to_vec(), line_starts(&base));
        let v1 = v0.with_changes(&changes_for(v0.len(), &raw)).unwrap();
        prop_assert_eq!(v1.lines().starts().to_vec(), line_starts(&v1.to_string()));
    }

    #[test]
    fn prop_checksum_independent_of_representation(
        base in text_strategy(),
        raw in edits_strategy(),
    ) {
        let v0 = SourceText::from_str(&base);
        let v1 = v0.with_changes(&changes_for(v0.len(), &raw)).unwrap();
        let fresh = SourceText::from_str(&v1.to_string());
        prop_assert_eq!(v1.checksum(), fresh.checksum());
        prop_assert!(v1.content_equals(&fresh));
    }
}
