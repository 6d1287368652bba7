use std::sync::Arc;

use textdoc_core::highlight::{
    Color, GrammarBuilder, HighlightColor, HighlightExtension, RuleSetDef, Span, SpanDef,
    SpanStack, TextWord,
};
use textdoc_core::{Document, DocumentOptions, HighlightGrammar, HighlightOptions};

const KEYWORD: Color = Color::new(0, 0, 255);
const COMMENT: Color = Color::new(0, 128, 0);
const STRING: Color = Color::new(163, 21, 21);
const TODO: Color = Color::new(255, 0, 0);

fn c_grammar() -> Arc<HighlightGrammar> {
    let grammar = GrammarBuilder::new("C")
        .rule_set(
            RuleSetDef::new("default")
                .delimiters("(){};,=+-*/<>")
                .keywords(KEYWORD, ["if", "else", "return", "while"])
                .span(SpanDef::new("LineComment", "//").color(COMMENT))
                .span(SpanDef::new("BlockComment", "/*").end("*/").color(COMMENT))
                .span(SpanDef::new("String", "\"").end("\"").escape('\\').color(STRING)),
        )
        .build()
        .unwrap();
    Arc::new(grammar)
}

fn word_texts(doc: &Document, line: usize) -> Vec<(String, Color)> {
    let text: Vec<char> = doc.line_text(line).unwrap().chars().collect();
    doc.line_words(line)
        .unwrap()
        .iter()
        .filter(|w| !w.is_whitespace())
        .map(|w| (text[w.column..w.end_column()].iter().collect(), w.color.color))
        .collect()
}

fn snapshot(doc: &Document) -> Vec<(Vec<TextWord>, usize)> {
    (0..doc.line_count())
        .map(|n| {
            (
                doc.line_words(n).unwrap().to_vec(),
                doc.line_span_stack(n).unwrap().map_or(0, SpanStack::len),
            )
        })
        .collect()
}

#[test]
fn test_line_comment_does_not_propagate() {
    let mut doc = Document::from_text("if (x) {\n  y();\n}\n");
    assert_eq!(doc.line_count(), 4);
    doc.set_grammar(c_grammar()).unwrap();
    assert_eq!(word_texts(&doc, 0)[0], ("if".to_string(), KEYWORD));

    let before: Vec<usize> = (0..4).map(|n| doc.line(n).unwrap().offset).collect();
    doc.insert(0, "// ").unwrap();
    let after: Vec<usize> = (0..4).map(|n| doc.line(n).unwrap().offset).collect();

    assert_eq!(doc.line_count(), 4);
    assert_eq!(after[0], 0);
    for n in 1..4 {
        assert_eq!(after[n], before[n] + 3);
    }

    let exit = doc.line_span_stack(0).unwrap().unwrap();
    assert_eq!(exit.len(), 1);
    assert!(exit.peek().unwrap().stop_eol);

    let report = doc.last_highlight_report().unwrap();
    assert!(!report.full_pass);
    assert_eq!(report.lines(), 0..1);

    assert!(word_texts(&doc, 0).iter().all(|(_, color)| *color == COMMENT));
    assert_eq!(word_texts(&doc, 1)[0], ("y".to_string(), Color::BLACK));
}

#[test]
fn test_block_comment_propagates_until_closed() {
    let mut doc = Document::from_text("a\nb\nc */ d\ne\nf");
    doc.set_grammar(c_grammar()).unwrap();

    doc.insert(0, "/* ").unwrap();
    let report = doc.last_highlight_report().unwrap();
    assert_eq!(report.lines(), 0..3);
    assert!(!report.full_pass);

    assert_eq!(word_texts(&doc, 1), vec![("b".to_string(), COMMENT)]);
    assert_eq!(word_texts(&doc, 2)[0].1, COMMENT);
    assert_eq!(word_texts(&doc, 2).last().unwrap(), &("d".to_string(), Color::BLACK));
    assert_eq!(word_texts(&doc, 3), vec![("e".to_string(), Color::BLACK)]);

    // Closing the comment early re-colors the following lines again.
    doc.insert(4, " */").unwrap();
    assert_eq!(word_texts(&doc, 1), vec![("b".to_string(), Color::BLACK)]);
}

#[test]
fn test_rehighlight_is_idempotent() {
    let text = "while (x) {\n  s = \"a \\\" /* b\";\n  /* c\n  d */ return;\n}\n";
    let mut doc = Document::from_text(text);
    doc.set_grammar(c_grammar()).unwrap();
    let first = snapshot(&doc);
    doc.set_grammar(c_grammar()).unwrap();
    assert_eq!(snapshot(&doc), first);

    // An edit that is undone leaves the same highlighting behind.
    doc.insert(14, "/*").unwrap();
    doc.remove(14, 2).unwrap();
    assert_eq!(snapshot(&doc), first);
}

#[test]
fn test_escaped_quote_keeps_string_open() {
    let mut doc = Document::from_text("s = \"a \\\" if\"; if");
    doc.set_grammar(c_grammar()).unwrap();
    let words = word_texts(&doc, 0);
    let last = words.last().unwrap();
    assert_eq!(last, &("if".to_string(), KEYWORD));
    assert!(words.iter().any(|(text, color)| text == "if\"" || (text == "if" && *color == STRING)));
    assert!(doc.line_span_stack(0).unwrap().unwrap().is_empty());
}

#[test]
fn test_long_propagation_falls_back_to_full_pass() {
    let text: String = (0..200).map(|i| format!("value_{i} = {i};\n")).collect();
    let options = DocumentOptions::default().with_highlight(HighlightOptions {
        full_rehighlight_ratio: 0.1,
        full_rehighlight_min_lines: 8,
    });
    let mut doc = Document::with_options(&text, options);
    doc.set_grammar(c_grammar()).unwrap();

    doc.insert(0, "/*").unwrap();
    let report = doc.last_highlight_report().unwrap();
    assert!(report.full_pass);
    assert_eq!(report.line_count, doc.line_count());
    assert_eq!(word_texts(&doc, 199)[0].1, COMMENT);
}

#[test]
fn test_grammar_change_runs_full_pass() {
    let mut doc = Document::from_text("if x\nreturn y");
    let report = doc.set_grammar(c_grammar()).unwrap();
    assert!(report.full_pass);
    assert_eq!(report.line_count, 2);

    let plain = GrammarBuilder::new("Plain")
        .rule_set(RuleSetDef::new("default"))
        .build()
        .unwrap();
    doc.set_grammar(Arc::new(plain)).unwrap();
    assert_eq!(word_texts(&doc, 0)[0], ("if".to_string(), Color::BLACK));
    assert_eq!(doc.grammar().unwrap().name(), "Plain");
}

#[test]
fn test_edits_without_grammar_leave_no_tokens() {
    let mut doc = Document::from_text("if x");
    doc.insert(0, "/*").unwrap();
    assert!(doc.line_words(0).unwrap().is_empty());
    assert!(doc.last_highlight_report().is_none());
}

struct UrlAware;

impl HighlightExtension for UrlAware {
    fn override_span(&self, span: &Span, line: &[char], column: usize) -> bool {
        // `//` right after `:` is part of a URL, not a comment.
        !(span.name == "LineComment" && column > 0 && line[column - 1] == ':')
    }

    fn word_color(&self, word: &str, _stack: &SpanStack) -> Option<HighlightColor> {
        (word == "TODO").then(|| HighlightColor::new(TODO).bold())
    }
}

#[test]
fn test_extension_vetoes_spans_and_colors_words() {
    let mut doc = Document::from_text("u = http://x; // TODO");
    doc.set_grammar(c_grammar()).unwrap();
    assert!(word_texts(&doc, 0).iter().any(|(w, c)| w == "x;" && *c == COMMENT));

    let report = doc.set_highlight_extension(Some(Arc::new(UrlAware))).unwrap();
    assert!(report.unwrap().full_pass);

    let words = word_texts(&doc, 0);
    assert!(words.iter().any(|(w, c)| w == "x" && *c == Color::BLACK));
    assert_eq!(words.last().unwrap(), &("TODO".to_string(), TODO));
    let todo = doc.line_words(0).unwrap().last().unwrap();
    assert!(todo.color.bold);
}
