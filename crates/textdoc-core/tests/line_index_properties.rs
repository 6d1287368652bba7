//! Property tests for the line tree under random edit sequences.

use proptest::prelude::*;
use textdoc_core::{Document, TextPosition};

/// Reference line split on `\r\n`, `\n` and lone `\r`, keeping delimiters.
fn reference_lines(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        current.push(chars[i]);
        let ends = match chars[i] {
            '\r' if chars.get(i + 1) == Some(&'\n') => {
                current.push('\n');
                i += 1;
                true
            }
            '\r' | '\n' => true,
            _ => false,
        };
        if ends {
            lines.push(std::mem::take(&mut current));
        }
        i += 1;
    }
    lines.push(current);
    lines
}

#[derive(Debug, Clone)]
struct Edit {
    offset: usize,
    length: usize,
    text: String,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    (0usize..400, 0usize..6, "[ab\\r\\n]{0,5}").prop_map(|(offset, length, text)| Edit {
        offset,
        length,
        text,
    })
}

proptest! {
    #[test]
    fn prop_lines_follow_edits(
        initial in "[ab\\r\\n]{0,40}",
        edits in prop::collection::vec(edit_strategy(), 0..40),
    ) {
        let mut doc = Document::from_text(&initial);
        let mut reference: Vec<char> = initial.chars().collect();

        for edit in edits {
            let offset = edit.offset % (reference.len() + 1);
            let length = edit.length.min(reference.len() - offset);
            doc.replace(offset, length, &edit.text).unwrap();
            reference.splice(offset..offset + length, edit.text.chars());

            prop_assert!(doc.line_index().check_invariants().is_ok());
            prop_assert_eq!(doc.line_index().total_length(), doc.len());
        }

        let text: String = reference.iter().collect();
        prop_assert_eq!(doc.full_text(), text.clone());
        let expected = reference_lines(&text);
        prop_assert_eq!(doc.line_count(), expected.len());

        let mut offset = 0usize;
        for (number, line) in expected.iter().enumerate() {
            let info = doc.line(number).unwrap();
            prop_assert_eq!(info.offset, offset);
            prop_assert_eq!(info.total_length, line.chars().count());
            offset += info.total_length;
        }
    }

    #[test]
    fn prop_offset_position_round_trip(text in "[ab \\r\\n]{0,60}", probe in 0usize..80) {
        let doc = Document::from_text(&text);
        let offset = probe % (doc.len() + 1);
        let position = doc.offset_to_position(offset).unwrap();
        let line = doc.line(position.line).unwrap();
        prop_assert!(line.offset <= offset);
        prop_assert!(offset <= line.offset + line.total_length);
        if position.column <= line.length {
            prop_assert_eq!(doc.position_to_offset(position), offset);
        }
    }

    #[test]
    fn prop_position_to_offset_clamps(text in "[ab\\n]{0,30}", line in 0usize..20, column in 0usize..20) {
        let doc = Document::from_text(&text);
        let offset = doc.position_to_offset(TextPosition::new(line, column));
        prop_assert!(offset <= doc.len());
        let clamped = line.min(doc.line_count() - 1);
        let info = doc.line(clamped).unwrap();
        prop_assert!(offset >= info.offset && offset <= info.end_offset());
    }
}

#[test]
fn test_line_tree_stays_balanced_under_appends() {
    let mut doc = Document::new();
    for i in 0..2_000 {
        let end = doc.len();
        doc.insert(end, &format!("line {i}\n")).unwrap();
    }
    assert_eq!(doc.line_count(), 2_001);
    doc.line_index().check_invariants().unwrap();
    assert_eq!(doc.line(1_500).unwrap().offset, doc.position_to_offset(TextPosition::new(1_500, 0)));

    // Remove every second line from the back.
    for number in (0..2_000).rev().step_by(2) {
        let info = doc.line(number).unwrap();
        doc.remove(info.offset, info.total_length).unwrap();
    }
    assert_eq!(doc.line_count(), 1_001);
    doc.line_index().check_invariants().unwrap();
}
