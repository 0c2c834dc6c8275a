// Chunk: docs/chunks/source_text - Immutable versioned source text for the compiler front end

//! Performance sanity checks for the text layer.
//!
//! These tests verify that editing and line lookups on large texts complete
//! within generous time bounds. They are not formal benchmarks but guard
//! against accidental whole-text rescans or copies per edit.

use source_text::{SourceText, TextChangeRange, TextSpan};
use std::time::{Duration, Instant};

fn large_source() -> String {
    "fn item() { let value = 42; }\n".repeat(40_000)
}

#[test]
fn typing_1k_chars_into_1mb_text_under_2s() {
    let source = large_source();
    let mut text = SourceText::from_str(&source);
    let middle = text.len() / 2;
    let start = Instant::now();

    for i in 0..1_000 {
        text = text.replace(TextSpan::new(middle + i, 0), "x").unwrap();
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(2),
        "Typing 1K characters took {:?}, expected < 2s",
        elapsed
    );
    assert_eq!(text.len(), source.len() + 1_000);
}

#[test]
fn line_index_follows_edits_under_2s() {
    let source = large_source();
    let mut text = SourceText::from_str(&source);
    let line_count = text.lines().len();
    let start = Instant::now();

    for i in 0..200 {
        let position = (i * 4_099) % text.len();
        // The predecessor stays alive until its successor has an index
        let next = text.replace(TextSpan::new(position, 0), "\n").unwrap();
        assert_eq!(next.lines().len(), line_count + i + 1);
        text = next;
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(2),
        "200 edits with line lookups took {:?}, expected < 2s",
        elapsed
    );
}

#[test]
fn random_access_into_edited_text() {
    let source = large_source();
    let text = SourceText::from_str(&source)
        .replace(TextSpan::new(10, 5), "edited")
        .unwrap();
    let start = Instant::now();

    let mut count = 0;
    for position in (0..text.len()).step_by(7) {
        if text.char_at(position).unwrap() == '\n' {
            count += 1;
        }
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_millis(500),
        "Sampling every 7th character took {:?}, expected < 500ms",
        elapsed
    );
    assert!(count > 0);
}

#[test]
fn retained_history_of_20k_edits_under_2s() {
    let mut history = vec![SourceText::from_str("fn main() {}")];
    let start = Instant::now();

    for i in 0..20_000 {
        let last = &history[history.len() - 1];
        let next = last.replace(TextSpan::new(11 + i, 0), "x").unwrap();
        history.push(next);
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(2),
        "Building 20K retained snapshots took {:?}, expected < 2s",
        elapsed
    );

    // Every snapshot is alive, so recent history merges exactly
    let newest = &history[20_000];
    let older = &history[19_900];
    assert_eq!(
        newest.change_ranges(older),
        vec![TextChangeRange::new(TextSpan::new(19_911, 0), 100)]
    );
}
