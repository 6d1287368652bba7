use textdoc_core::{AnchorMovement, Document, DocumentError, TextPosition};

#[test]
fn test_anchor_shifts_on_insert_before_column() {
    let mut doc = Document::from_text("alpha\nbeta\ngamma");
    let anchor = doc.create_anchor(1, 2).unwrap();

    doc.insert(7, "XYZ").unwrap();
    assert_eq!(doc.anchor_position(anchor).unwrap(), TextPosition::new(1, 5));

    // Edits after the anchor leave it alone.
    doc.insert(doc.len(), "!").unwrap();
    assert_eq!(doc.anchor_position(anchor).unwrap(), TextPosition::new(1, 5));
}

#[test]
fn test_anchor_moves_to_new_line_on_split() {
    let mut doc = Document::from_text("hello world");
    let anchor = doc.create_anchor(0, 8).unwrap();

    doc.insert(5, "\n").unwrap();
    assert_eq!(doc.anchor_position(anchor).unwrap(), TextPosition::new(1, 3));
    assert_eq!(doc.anchor_offset(anchor).unwrap(), 9);

    doc.insert(0, "first\r\n").unwrap();
    assert_eq!(doc.anchor_position(anchor).unwrap(), TextPosition::new(2, 3));
}

#[test]
fn test_anchor_joins_previous_line_on_merge() {
    let mut doc = Document::from_text("one\r\ntwo\nthree");
    let on_two = doc.create_anchor(1, 1).unwrap();
    let on_three = doc.create_anchor(2, 4).unwrap();

    // Remove the CRLF between "one" and "two".
    doc.remove(3, 2).unwrap();
    assert_eq!(doc.anchor_position(on_two).unwrap(), TextPosition::new(0, 4));
    assert_eq!(doc.anchor_position(on_three).unwrap(), TextPosition::new(1, 4));

    // Remove "\nthr", merging the last line.
    doc.remove(6, 4).unwrap();
    assert_eq!(doc.full_text(), "onetwoee");
    assert_eq!(doc.anchor_position(on_three).unwrap(), TextPosition::new(0, 7));
}

#[test]
fn test_anchor_inside_removed_range_is_deleted() {
    let mut doc = Document::from_text("abc\ndef\nghi");
    let inside = doc.create_anchor(1, 1).unwrap();
    let at_start = doc.create_anchor(1, 0).unwrap();
    let at_end = doc.create_anchor(2, 0).unwrap();

    // Remove "def\n".
    doc.remove(4, 4).unwrap();
    assert!(doc.is_anchor_deleted(inside).unwrap());
    assert_eq!(doc.anchor_position(inside), Err(DocumentError::AnchorDeleted));

    // Range boundaries survive.
    assert!(!doc.is_anchor_deleted(at_start).unwrap());
    assert!(!doc.is_anchor_deleted(at_end).unwrap());
    assert_eq!(doc.anchor_position(at_start).unwrap(), TextPosition::new(1, 0));
    assert_eq!(doc.anchor_position(at_end).unwrap(), TextPosition::new(1, 0));
}

#[test]
fn test_replace_deletes_anchors_strictly_inside() {
    let mut doc = Document::from_text("let value = 10;");
    let name = doc.create_anchor(0, 6).unwrap();
    let after = doc.create_anchor(0, 14).unwrap();

    doc.replace(4, 5, "v").unwrap();
    assert!(doc.is_anchor_deleted(name).unwrap());
    assert_eq!(doc.anchor_position(after).unwrap(), TextPosition::new(0, 10));
}

#[test]
fn test_insertion_at_anchor_honors_movement() {
    let mut doc = Document::from_text("ab");
    let stays = doc.create_anchor(0, 1).unwrap();
    let moves = doc
        .create_anchor_with(0, 1, AnchorMovement::AfterInsertion)
        .unwrap();

    doc.insert(1, "XYZ").unwrap();
    assert_eq!(doc.anchor_offset(stays).unwrap(), 1);
    assert_eq!(doc.anchor_offset(moves).unwrap(), 4);
}

#[test]
fn test_anchor_inside_new_crlf_clamps_to_line_end() {
    let mut doc = Document::from_text("ab\ncd");
    let anchor = doc
        .create_anchor_with(0, 2, AnchorMovement::AfterInsertion)
        .unwrap();

    // The inserted `\r` joins the `\n`; the anchor would sit between them.
    doc.insert(2, "\r").unwrap();
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.anchor_position(anchor).unwrap(), TextPosition::new(0, 2));
}

#[test]
fn test_create_anchor_validates_position() {
    let mut doc = Document::from_text("ab\ncd");
    assert!(matches!(
        doc.create_anchor(2, 0),
        Err(DocumentError::LineOutOfRange { line: 2, count: 2 })
    ));
    assert!(matches!(
        doc.create_anchor(0, 3),
        Err(DocumentError::OffsetOutOfRange { .. })
    ));
    assert!(doc.create_anchor(0, 2).is_ok());
}

#[test]
fn test_many_anchors_survive_random_line_edits() {
    let text: String = (0..50).map(|i| format!("row {i:02}\n")).collect();
    let mut doc = Document::from_text(&text);
    let anchors: Vec<_> = (0..50)
        .map(|line| doc.create_anchor(line, 4).unwrap())
        .collect();

    // Prepend a line, then split every tenth line before its number.
    doc.insert(0, "header\n").unwrap();
    for line in (1..51).step_by(10).rev() {
        let offset = doc.line(line).unwrap().offset + 3;
        doc.insert(offset, "\n").unwrap();
    }

    for (i, anchor) in anchors.iter().enumerate() {
        let offset = doc.anchor_offset(*anchor).unwrap();
        let expected = format!("{i:02}");
        assert_eq!(doc.text(offset, 2).unwrap(), expected);
    }
}
