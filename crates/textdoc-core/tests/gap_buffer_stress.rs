//! Randomized consistency checks against a `ropey::Rope` reference model.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ropey::Rope;
use textdoc_core::{Document, GapBuffer, GapBufferOptions};

const SNIPPETS: &[&str] = &["X", "你好", "👋", "test\n", "\r\n", "\r", "  ", ""];

fn generate_text(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        text.push_str(&format!("{i:04} lorem ipsum dolor sit amet\n"));
    }
    text
}

#[test]
fn test_gap_buffer_matches_reference() {
    let mut rng = StdRng::seed_from_u64(0x6a70);
    let original = generate_text(40);
    let mut buffer = GapBuffer::from_text(&original, GapBufferOptions::new(8, 64));
    let mut reference = Rope::from_str(&original);

    for step in 0..2_000 {
        let len = buffer.len();
        if rng.gen_bool(0.55) {
            let offset = rng.gen_range(0..=len);
            let text = SNIPPETS[rng.gen_range(0..SNIPPETS.len())];
            buffer.insert(offset, text).unwrap();
            reference.insert(offset, text);
        } else if len > 0 {
            let offset = rng.gen_range(0..len);
            let count = rng.gen_range(0..=(len - offset).min(12));
            buffer.remove(offset, count).unwrap();
            reference.remove(offset..offset + count);
        }

        assert_eq!(buffer.len(), reference.len_chars(), "length diverged at step {step}");
        assert_eq!(buffer.len(), buffer.capacity() - buffer.gap_size());
        if step % 50 == 0 {
            assert_eq!(buffer.to_text(), reference.to_string(), "text diverged at step {step}");
        }
    }
    assert_eq!(buffer.to_text(), reference.to_string());
}

#[test]
fn test_replace_matches_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut buffer = GapBuffer::new(GapBufferOptions::default());
    let mut reference = Rope::new();

    for _ in 0..1_000 {
        let len = buffer.len();
        let offset = rng.gen_range(0..=len);
        let count = rng.gen_range(0..=(len - offset).min(5));
        let text = SNIPPETS[rng.gen_range(0..SNIPPETS.len())];
        buffer.replace(offset, count, text).unwrap();
        reference.remove(offset..offset + count);
        reference.insert(offset, text);
        assert_eq!(buffer.len(), buffer.capacity() - buffer.gap_size());
    }
    assert_eq!(buffer.to_text(), reference.to_string());
}

#[test]
fn test_document_lines_match_reference() {
    let mut rng = StdRng::seed_from_u64(0xd0c);
    let original = generate_text(30);
    let mut doc = Document::from_text(&original);
    let mut reference = Rope::from_str(&original);

    for step in 0..1_500 {
        let len = doc.len();
        let offset = rng.gen_range(0..=len);
        let count = if len > offset && rng.gen_bool(0.5) {
            rng.gen_range(1..=(len - offset).min(20))
        } else {
            0
        };
        let text = SNIPPETS[rng.gen_range(0..SNIPPETS.len())];
        doc.replace(offset, count, text).unwrap();
        reference.remove(offset..offset + count);
        reference.insert(offset, text);

        assert_eq!(doc.len(), reference.len_chars());
        assert_eq!(
            doc.line_count(),
            reference.len_lines(),
            "line count diverged at step {step}"
        );
        assert_eq!(doc.line_index().total_length(), doc.len());
        if step % 25 == 0 {
            doc.line_index().check_invariants().unwrap();
            for number in 0..doc.line_count() {
                let info = doc.line(number).unwrap();
                assert_eq!(info.offset, reference.line_to_char(number));
                assert_eq!(
                    doc.text(info.offset, info.total_length).unwrap(),
                    reference.line(number).to_string()
                );
            }
        }
    }
    assert_eq!(doc.full_text(), reference.to_string());
}

#[test]
fn test_many_small_edits_keep_gap_bounded() {
    let options = GapBufferOptions::new(16, 256);
    let mut buffer = GapBuffer::from_text(&generate_text(200), options);
    let mut offset = buffer.len() / 2;
    for _ in 0..5_000 {
        buffer.insert(offset, "x").unwrap();
        offset += 1;
    }
    for _ in 0..5_000 {
        offset -= 1;
        buffer.remove(offset, 1).unwrap();
    }
    assert_eq!(buffer.to_text(), generate_text(200));
    assert!(buffer.gap_size() <= options.max_gap);
}
