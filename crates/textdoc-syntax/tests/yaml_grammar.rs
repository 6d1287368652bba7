use pretty_assertions::assert_eq;
use std::path::PathBuf;
use textdoc_core::highlight::{Color, HighlightColor, WordKind};
use textdoc_core::Document;
use textdoc_syntax::{FoldingDefinition, GrammarSet, SyntaxError, SyntaxProcessor};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn csharp() -> GrammarSet {
    let mut set = GrammarSet::new();
    set.load_from_path(fixtures().join("csharp.yaml")).unwrap();
    set
}

/// `(text, color)` of the non-whitespace words of `line`.
fn colored_words(doc: &Document, line: usize) -> Vec<(String, Color)> {
    styled_words(doc, line)
        .into_iter()
        .map(|(text, color)| (text, color.color))
        .collect()
}

fn styled_words(doc: &Document, line: usize) -> Vec<(String, HighlightColor)> {
    let chars: Vec<char> = doc.line_text(line).unwrap().chars().collect();
    doc.line_words(line)
        .unwrap()
        .iter()
        .filter(|word| word.kind == WordKind::Word)
        .map(|word| (chars[word.column..word.end_column()].iter().collect(), word.color))
        .collect()
}

const KEYWORD: Color = Color::new(0, 0, 255);
const COMMENT: Color = Color::new(0, 128, 0);
const STRING: Color = Color::new(0xa3, 0x15, 0x15);

#[test]
fn fixture_compiles_with_palette_and_rule_sets() {
    let set = csharp();
    let grammar = set.for_extension("cs").unwrap();
    assert_eq!(grammar.name(), "C#");
    assert_eq!(grammar.rule_sets().len(), 2);
    assert_eq!(grammar.span_count(), 6);
    assert_eq!(grammar.digit_color().color, Color::new(0x09, 0x86, 0x58));
    assert_eq!(
        grammar.default_rule_set().keywords().get("class"),
        Some(HighlightColor::new(KEYWORD).bold())
    );
    assert_eq!(
        set.language("C#").unwrap().folding,
        FoldingDefinition::Braces {
            open: '{',
            close: '}'
        }
    );
}

#[test]
fn processor_highlights_and_folds_document() {
    let set = csharp();
    let language = set.language_for_path("Program.cs").unwrap();
    let mut doc = Document::from_text(concat!(
        "class A {\n",
        "    /* multi\n",
        "       line */\n",
        "    void F() { return \"s\"; }\n",
        "}\n",
    ));

    let mut processor = SyntaxProcessor::new(language);
    let report = processor.process(&mut doc).unwrap();
    assert!(report.full_pass);
    assert_eq!(report.line_count, doc.line_count());

    assert_eq!(colored_words(&doc, 0)[0], ("class".to_string(), KEYWORD));
    assert!(colored_words(&doc, 2).iter().all(|(_, color)| *color == COMMENT));
    let line3 = colored_words(&doc, 3);
    assert!(line3.contains(&("return".to_string(), KEYWORD)));
    assert!(line3.iter().any(|(_, color)| *color == STRING));

    assert_eq!(doc.folding().len(), 1);
    assert_eq!(doc.folding().markers()[0].start_line(), 0);
    assert_eq!(doc.folding().markers()[0].end_line(), 4);
}

#[test]
fn refresh_keeps_folded_regions_folded() {
    let set = csharp();
    let mut processor = SyntaxProcessor::new(set.language("C#").unwrap());
    let mut doc = Document::from_text("class A {\n}\nclass B {\n}\n");
    processor.process(&mut doc).unwrap();
    assert_eq!(doc.folding().len(), 2);

    assert!(doc.toggle_fold_at_line(2).unwrap());
    doc.insert(0, "using X;\n").unwrap();
    processor.refresh_foldings(&mut doc).unwrap();

    let folded: Vec<usize> = doc
        .folding()
        .markers()
        .iter()
        .filter(|marker| marker.is_folded)
        .map(|marker| marker.start_line())
        .collect();
    assert_eq!(folded, vec![3]);
}

#[test]
fn regex_span_uses_variables_and_line_start() {
    let set = csharp();
    let mut doc = Document::from_text("#region Setup\nint x; #if\n");
    SyntaxProcessor::new(set.language("C#").unwrap())
        .process(&mut doc)
        .unwrap();

    let grey = Color::new(0x80, 0x80, 0x80);
    assert!(colored_words(&doc, 0).iter().all(|(_, color)| *color == grey));
    assert!(colored_words(&doc, 1).iter().all(|(_, color)| *color != grey));
}

#[test]
fn doc_comments_switch_rule_set() {
    let set = csharp();
    let mut doc = Document::from_text("/// <summary> text\n");
    SyntaxProcessor::new(set.language("C#").unwrap())
        .process(&mut doc)
        .unwrap();

    let words = styled_words(&doc, 0);
    let (_, summary) = words.iter().find(|(text, _)| text == "summary").unwrap();
    assert_eq!(summary.color, Color::new(0x80, 0x80, 0x80));
    assert!(summary.bold);
    assert!(!summary.italic);

    let (_, text) = words.iter().find(|(text, _)| text == "text").unwrap();
    assert!(text.italic);
}

#[test]
fn load_from_dir_picks_up_yaml_files() {
    let mut set = GrammarSet::new();
    let loaded = set.load_from_dir(fixtures()).unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(set.names(), vec!["C#"]);
}

#[test]
fn load_errors_are_reported() {
    let mut set = GrammarSet::new();

    let err = set
        .load_from_str(
            "name: X\nrule_sets:\n  - name: default\n    spans:\n      - { name: S, begin: a, color: teal }\n",
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::InvalidColor(ref c) if c == "teal"));

    let err = set
        .load_from_str(
            "name: X\nrule_sets:\n  - name: default\n    spans:\n      - { name: S, begin: { regex: '{{nope}}' } }\n",
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::UnknownVariable(ref v) if v == "nope"));

    let err = set
        .load_from_str(
            "name: X\nrule_sets:\n  - name: default\n    spans:\n      - { name: S, begin: a, rule_set: missing }\n",
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::Grammar(_)));

    let err = set.load_from_path(fixtures().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, SyntaxError::Io(_)));
    assert!(set.is_empty());
}
