//! Highlighting grammars.
//!
//! A grammar is described with plain definition values ([`RuleSetDef`],
//! [`SpanDef`], [`PatternDef`]) collected by a [`GrammarBuilder`].
//! [`GrammarBuilder::build`] resolves rule-set names, compiles patterns and
//! produces an immutable [`HighlightGrammar`]. Every consistency problem is
//! reported there; a built grammar can tokenize any text.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use super::color::HighlightColor;

/// Errors detected while building a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A span refers to a rule set that is not defined.
    #[error("span `{span}` references unknown rule set `{rule_set}`")]
    UnknownRuleSet {
        /// Span name.
        span: String,
        /// Missing rule set name.
        rule_set: String,
    },
    /// The default rule set is not defined.
    #[error("default rule set `{0}` is not defined")]
    MissingDefaultRuleSet(String),
    /// Two rule sets share a name.
    #[error("rule set `{0}` is defined more than once")]
    DuplicateRuleSet(String),
    /// A begin or end pattern is empty or does not compile.
    #[error("invalid pattern in span `{span}`: {message}")]
    InvalidPattern {
        /// Span name.
        span: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Index of a rule set inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleSetId(u32);

/// Identity of a span inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u32);

/// Uncompiled begin/end pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternDef {
    /// Match this exact text.
    Literal(String),
    /// Match this regular expression at the current position.
    Regex(String),
}

impl PatternDef {
    /// A regular expression pattern.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex(pattern.into())
    }
}

impl From<&str> for PatternDef {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

impl From<String> for PatternDef {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

/// Compiled begin/end pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact characters, optionally compared case-insensitively.
    Literal {
        /// Characters to match.
        chars: Vec<char>,
        /// Compare with simple lowercase folding.
        ignore_case: bool,
    },
    /// A regex anchored at the match position.
    Regex(Regex),
}

impl Pattern {
    fn compile(def: &PatternDef, ignore_case: bool, span: &str) -> Result<Self, GrammarError> {
        let invalid = |message: String| GrammarError::InvalidPattern {
            span: span.to_string(),
            message,
        };
        match def {
            PatternDef::Literal(text) if text.is_empty() => Err(invalid("empty literal".into())),
            PatternDef::Literal(text) => Ok(Self::Literal {
                chars: text.chars().collect(),
                ignore_case,
            }),
            PatternDef::Regex(source) => RegexBuilder::new(&format!("^(?:{source})"))
                .case_insensitive(ignore_case)
                .build()
                .map(Self::Regex)
                .map_err(|err| invalid(err.to_string())),
        }
    }

    /// Length in characters of a non-empty match at `column`, if any.
    ///
    /// `text` is the whole line and `byte_offsets[i]` the byte offset of `chars[i]`.
    pub(crate) fn match_at(
        &self,
        chars: &[char],
        text: &str,
        byte_offsets: &[usize],
        column: usize,
    ) -> Option<usize> {
        match self {
            Self::Literal { chars: wanted, ignore_case } => {
                let candidate = chars.get(column..column + wanted.len())?;
                let equal = if *ignore_case {
                    candidate
                        .iter()
                        .zip(wanted)
                        .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
                } else {
                    candidate == wanted.as_slice()
                };
                equal.then_some(wanted.len())
            }
            Self::Regex(regex) => {
                let start = *byte_offsets.get(column)?;
                let found = regex.find(&text[start..])?;
                let length = found.as_str().chars().count();
                (length > 0).then_some(length)
            }
        }
    }

    /// First character of a literal pattern.
    pub fn first_char(&self) -> Option<char> {
        match self {
            Self::Literal { chars, .. } => chars.first().copied(),
            Self::Regex(_) => None,
        }
    }
}

/// Definition of a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanDef {
    /// Span name.
    pub name: String,
    /// Opening pattern.
    pub begin: PatternDef,
    /// Closing pattern. A span without one ends at the end of the line.
    pub end: Option<PatternDef>,
    /// Color of the span content.
    pub color: HighlightColor,
    /// Color of the opening text (defaults to `color`).
    pub begin_color: Option<HighlightColor>,
    /// Color of the closing text (defaults to `color`).
    pub end_color: Option<HighlightColor>,
    /// Rule set applied inside the span.
    pub rule_set: Option<String>,
    /// Escape character.
    pub escape: Option<char>,
    /// The span closes at the end of the line.
    pub stop_eol: bool,
    /// The opening text must be a whole word.
    pub is_begin_single_word: bool,
    /// The closing text must be a whole word.
    pub is_end_single_word: bool,
    /// `Some(true)`: may only open after leading whitespace; `Some(false)`: never there.
    pub begin_at_line_start: Option<bool>,
    /// Match begin and end case-insensitively.
    pub ignore_case: bool,
}

impl SpanDef {
    /// Create a span opened by `begin`.
    pub fn new(name: impl Into<String>, begin: impl Into<PatternDef>) -> Self {
        Self {
            name: name.into(),
            begin: begin.into(),
            end: None,
            color: HighlightColor::default(),
            begin_color: None,
            end_color: None,
            rule_set: None,
            escape: None,
            stop_eol: false,
            is_begin_single_word: false,
            is_end_single_word: false,
            begin_at_line_start: None,
            ignore_case: false,
        }
    }

    /// Set the closing pattern.
    pub fn end(mut self, end: impl Into<PatternDef>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Set the content color.
    pub fn color(mut self, color: impl Into<HighlightColor>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the opening color.
    pub fn begin_color(mut self, color: impl Into<HighlightColor>) -> Self {
        self.begin_color = Some(color.into());
        self
    }

    /// Set the closing color.
    pub fn end_color(mut self, color: impl Into<HighlightColor>) -> Self {
        self.end_color = Some(color.into());
        self
    }

    /// Use the named rule set inside the span.
    pub fn rule_set(mut self, name: impl Into<String>) -> Self {
        self.rule_set = Some(name.into());
        self
    }

    /// Set the escape character.
    pub fn escape(mut self, ch: char) -> Self {
        self.escape = Some(ch);
        self
    }

    /// Close the span at the end of the line.
    pub fn stop_eol(mut self) -> Self {
        self.stop_eol = true;
        self
    }

    /// Require whole-word opening text.
    pub fn begin_single_word(mut self) -> Self {
        self.is_begin_single_word = true;
        self
    }

    /// Require whole-word closing text.
    pub fn end_single_word(mut self) -> Self {
        self.is_end_single_word = true;
        self
    }

    /// Constrain where the span may open relative to leading whitespace.
    pub fn begin_at_line_start(mut self, at_start: bool) -> Self {
        self.begin_at_line_start = Some(at_start);
        self
    }

    /// Match begin and end case-insensitively.
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }
}

/// Word that recolors its neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRule {
    /// Marker word.
    pub what: String,
    /// Color given to the marked neighbor.
    pub color: HighlightColor,
    /// Also color the marker word itself.
    pub mark_marker: bool,
}

/// Definition of a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSetDef {
    /// Rule set name.
    pub name: String,
    /// Keywords are matched case-insensitively.
    pub ignore_case: bool,
    /// Highlight numbers even inside a span using this rule set.
    pub highlight_digits: bool,
    /// Characters that split words.
    pub delimiters: String,
    /// Keyword groups.
    pub keywords: Vec<(HighlightColor, Vec<String>)>,
    /// Spans that may open under this rule set, tried in order.
    pub spans: Vec<SpanDef>,
    /// Markers coloring the word before them.
    pub mark_previous: Vec<MarkRule>,
    /// Markers coloring the word after them.
    pub mark_following: Vec<MarkRule>,
}

impl RuleSetDef {
    /// Create an empty rule set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Match keywords case-insensitively.
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Allow number highlighting inside spans using this rule set.
    pub fn highlight_digits(mut self, highlight: bool) -> Self {
        self.highlight_digits = highlight;
        self
    }

    /// Set the delimiter characters.
    pub fn delimiters(mut self, delimiters: impl Into<String>) -> Self {
        self.delimiters = delimiters.into();
        self
    }

    /// Add a keyword group.
    pub fn keywords<I, S>(mut self, color: impl Into<HighlightColor>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords
            .push((color.into(), words.into_iter().map(Into::into).collect()));
        self
    }

    /// Add a span.
    pub fn span(mut self, span: SpanDef) -> Self {
        self.spans.push(span);
        self
    }

    /// Color the word before each `what`.
    pub fn mark_previous(
        mut self,
        what: impl Into<String>,
        color: impl Into<HighlightColor>,
        mark_marker: bool,
    ) -> Self {
        self.mark_previous.push(MarkRule {
            what: what.into(),
            color: color.into(),
            mark_marker,
        });
        self
    }

    /// Color the word after each `what`.
    pub fn mark_following(
        mut self,
        what: impl Into<String>,
        color: impl Into<HighlightColor>,
        mark_marker: bool,
    ) -> Self {
        self.mark_following.push(MarkRule {
            what: what.into(),
            color: color.into(),
            mark_marker,
        });
        self
    }
}

/// Keyword → color lookup.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    words: HashMap<String, HighlightColor>,
    ignore_case: bool,
}

impl KeywordTable {
    fn new(ignore_case: bool) -> Self {
        Self {
            words: HashMap::new(),
            ignore_case,
        }
    }

    fn insert(&mut self, word: &str, color: HighlightColor) {
        let key = if self.ignore_case {
            word.to_lowercase()
        } else {
            word.to_string()
        };
        self.words.insert(key, color);
    }

    /// Color of `word`, if it is a keyword.
    pub fn get(&self, word: &str) -> Option<HighlightColor> {
        if self.ignore_case {
            self.words.get(&word.to_lowercase()).copied()
        } else {
            self.words.get(word).copied()
        }
    }

    /// Number of keywords.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A compiled span.
#[derive(Debug)]
pub struct Span {
    id: SpanId,
    /// Span name.
    pub name: String,
    /// Opening pattern.
    pub begin: Pattern,
    /// Closing pattern; `None` for spans that run to the end of the line.
    pub end: Option<Pattern>,
    /// Content color.
    pub color: HighlightColor,
    /// Opening color.
    pub begin_color: HighlightColor,
    /// Closing color.
    pub end_color: HighlightColor,
    /// Rule set applied inside the span.
    pub rule_set: Option<RuleSetId>,
    /// Escape character.
    pub escape: Option<char>,
    /// Closes at the end of the line.
    pub stop_eol: bool,
    /// Opening text must be a whole word.
    pub is_begin_single_word: bool,
    /// Closing text must be a whole word.
    pub is_end_single_word: bool,
    /// Leading-whitespace constraint for the opening text.
    pub begin_at_line_start: Option<bool>,
}

impl Span {
    /// Identity within the grammar.
    pub fn id(&self) -> SpanId {
        self.id
    }

    /// Whether the escape character is the closing text doubled (SQL `''`).
    pub fn escape_doubles_end(&self) -> bool {
        match (self.escape, self.end.as_ref().and_then(Pattern::first_char)) {
            (Some(escape), Some(first)) => escape == first,
            _ => false,
        }
    }
}

/// A compiled rule set.
#[derive(Debug)]
pub struct RuleSet {
    /// Rule set name.
    pub name: String,
    /// Keywords are matched case-insensitively.
    pub ignore_case: bool,
    /// Numbers are highlighted inside spans using this rule set.
    pub highlight_digits: bool,
    delimiters: HashSet<char>,
    keywords: KeywordTable,
    spans: Vec<Arc<Span>>,
    mark_previous: Vec<MarkRule>,
    mark_following: Vec<MarkRule>,
}

impl RuleSet {
    /// Whether `ch` splits words.
    pub fn is_delimiter(&self, ch: char) -> bool {
        self.delimiters.contains(&ch)
    }

    /// Keyword table.
    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    /// Spans that may open under this rule set.
    pub fn spans(&self) -> &[Arc<Span>] {
        &self.spans
    }

    /// Rules coloring the word before a marker.
    pub fn mark_previous(&self) -> &[MarkRule] {
        &self.mark_previous
    }

    /// Rules coloring the word after a marker.
    pub fn mark_following(&self) -> &[MarkRule] {
        &self.mark_following
    }

    fn find_mark<'a>(rules: &'a [MarkRule], word: &str, ignore_case: bool) -> Option<&'a MarkRule> {
        rules.iter().find(|rule| {
            if ignore_case {
                rule.what.to_lowercase() == word.to_lowercase()
            } else {
                rule.what == word
            }
        })
    }

    pub(crate) fn previous_mark(&self, word: &str) -> Option<&MarkRule> {
        Self::find_mark(&self.mark_previous, word, self.ignore_case)
    }

    pub(crate) fn following_mark(&self, word: &str) -> Option<&MarkRule> {
        Self::find_mark(&self.mark_following, word, self.ignore_case)
    }
}

/// An immutable, resolved highlighting grammar.
#[derive(Debug)]
pub struct HighlightGrammar {
    name: String,
    default_color: HighlightColor,
    digit_color: HighlightColor,
    rule_sets: Vec<RuleSet>,
    default_rule_set: RuleSetId,
    span_count: usize,
}

impl HighlightGrammar {
    /// Grammar name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color of text no rule applies to.
    pub fn default_color(&self) -> HighlightColor {
        self.default_color
    }

    /// Color of numeric literals.
    pub fn digit_color(&self) -> HighlightColor {
        self.digit_color
    }

    /// Rule set used outside any span.
    pub fn default_rule_set(&self) -> &RuleSet {
        &self.rule_sets[self.default_rule_set.0 as usize]
    }

    /// Rule set by id.
    pub fn rule_set(&self, id: RuleSetId) -> Option<&RuleSet> {
        self.rule_sets.get(id.0 as usize)
    }

    /// Rule set by name.
    pub fn rule_set_by_name(&self, name: &str) -> Option<&RuleSet> {
        self.rule_sets.iter().find(|rs| rs.name == name)
    }

    /// All rule sets.
    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.rule_sets
    }

    /// Total number of spans across rule sets.
    pub fn span_count(&self) -> usize {
        self.span_count
    }
}

/// Collects definitions and builds a [`HighlightGrammar`].
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    name: String,
    default_color: HighlightColor,
    digit_color: HighlightColor,
    default_rule_set: String,
    rule_sets: Vec<RuleSetDef>,
}

impl GrammarBuilder {
    /// Name of the rule set used when none is configured.
    pub const DEFAULT_RULE_SET: &'static str = "default";

    /// Start a grammar.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_color: HighlightColor::default(),
            digit_color: HighlightColor::default(),
            default_rule_set: Self::DEFAULT_RULE_SET.to_string(),
            rule_sets: Vec::new(),
        }
    }

    /// Color of text no rule applies to.
    pub fn default_color(mut self, color: impl Into<HighlightColor>) -> Self {
        self.default_color = color.into();
        self
    }

    /// Color of numeric literals.
    pub fn digit_color(mut self, color: impl Into<HighlightColor>) -> Self {
        self.digit_color = color.into();
        self
    }

    /// Name of the rule set used outside any span.
    pub fn default_rule_set(mut self, name: impl Into<String>) -> Self {
        self.default_rule_set = name.into();
        self
    }

    /// Add a rule set.
    pub fn rule_set(mut self, rule_set: RuleSetDef) -> Self {
        self.rule_sets.push(rule_set);
        self
    }

    /// Resolve names, compile patterns and freeze the grammar.
    pub fn build(self) -> Result<HighlightGrammar, GrammarError> {
        let mut ids: HashMap<&str, RuleSetId> = HashMap::new();
        for (index, def) in self.rule_sets.iter().enumerate() {
            if ids.insert(def.name.as_str(), RuleSetId(index as u32)).is_some() {
                return Err(GrammarError::DuplicateRuleSet(def.name.clone()));
            }
        }
        let default_rule_set = *ids
            .get(self.default_rule_set.as_str())
            .ok_or_else(|| GrammarError::MissingDefaultRuleSet(self.default_rule_set.clone()))?;

        let mut next_span = 0u32;
        let mut rule_sets = Vec::with_capacity(self.rule_sets.len());
        for def in &self.rule_sets {
            let mut spans = Vec::with_capacity(def.spans.len());
            for span in &def.spans {
                spans.push(Arc::new(compile_span(span, SpanId(next_span), &ids)?));
                next_span += 1;
            }

            let mut keywords = KeywordTable::new(def.ignore_case);
            for (color, words) in &def.keywords {
                for word in words {
                    keywords.insert(word, *color);
                }
            }

            rule_sets.push(RuleSet {
                name: def.name.clone(),
                ignore_case: def.ignore_case,
                highlight_digits: def.highlight_digits,
                delimiters: def.delimiters.chars().collect(),
                keywords,
                spans,
                mark_previous: def.mark_previous.clone(),
                mark_following: def.mark_following.clone(),
            });
        }

        Ok(HighlightGrammar {
            name: self.name,
            default_color: self.default_color,
            digit_color: self.digit_color,
            rule_sets,
            default_rule_set,
            span_count: next_span as usize,
        })
    }
}

fn compile_span(
    def: &SpanDef,
    id: SpanId,
    rule_sets: &HashMap<&str, RuleSetId>,
) -> Result<Span, GrammarError> {
    let rule_set = match &def.rule_set {
        Some(name) => Some(*rule_sets.get(name.as_str()).ok_or_else(|| {
            GrammarError::UnknownRuleSet {
                span: def.name.clone(),
                rule_set: name.clone(),
            }
        })?),
        None => None,
    };
    let begin = Pattern::compile(&def.begin, def.ignore_case, &def.name)?;
    let end = def
        .end
        .as_ref()
        .map(|end| Pattern::compile(end, def.ignore_case, &def.name))
        .transpose()?;

    Ok(Span {
        id,
        name: def.name.clone(),
        stop_eol: def.stop_eol || end.is_none(),
        begin,
        end,
        color: def.color,
        begin_color: def.begin_color.unwrap_or(def.color),
        end_color: def.end_color.unwrap_or(def.color),
        rule_set,
        escape: def.escape,
        is_begin_single_word: def.is_begin_single_word,
        is_end_single_word: def.is_end_single_word,
        begin_at_line_start: def.begin_at_line_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::color::Color;

    #[test]
    fn test_build_resolves_rule_sets() {
        let grammar = GrammarBuilder::new("C")
            .rule_set(
                RuleSetDef::new("default")
                    .keywords(Color::new(0, 0, 255), ["if", "else"])
                    .span(SpanDef::new("Comment", "/*").end("*/").rule_set("doc")),
            )
            .rule_set(RuleSetDef::new("doc").ignore_case(true).keywords(Color::BLACK, ["TODO"]))
            .build()
            .unwrap();

        assert_eq!(grammar.rule_sets().len(), 2);
        assert_eq!(grammar.span_count(), 1);
        let span = &grammar.default_rule_set().spans()[0];
        let nested = grammar.rule_set(span.rule_set.unwrap()).unwrap();
        assert_eq!(nested.name, "doc");
        assert!(nested.keywords().get("todo").is_some());
        assert!(grammar.default_rule_set().keywords().get("IF").is_none());
        assert!(!span.stop_eol);
    }

    #[test]
    fn test_span_without_end_stops_at_eol() {
        let grammar = GrammarBuilder::new("x")
            .rule_set(RuleSetDef::new("default").span(SpanDef::new("Line", "#")))
            .build()
            .unwrap();
        assert!(grammar.default_rule_set().spans()[0].stop_eol);
    }

    #[test]
    fn test_build_errors() {
        let unknown = GrammarBuilder::new("x")
            .rule_set(RuleSetDef::new("default").span(SpanDef::new("S", "\"").rule_set("nope")))
            .build();
        assert_eq!(
            unknown.unwrap_err(),
            GrammarError::UnknownRuleSet {
                span: "S".into(),
                rule_set: "nope".into()
            }
        );

        let missing = GrammarBuilder::new("x")
            .rule_set(RuleSetDef::new("other"))
            .build();
        assert_eq!(
            missing.unwrap_err(),
            GrammarError::MissingDefaultRuleSet("default".into())
        );

        let duplicate = GrammarBuilder::new("x")
            .rule_set(RuleSetDef::new("default"))
            .rule_set(RuleSetDef::new("default"))
            .build();
        assert_eq!(
            duplicate.unwrap_err(),
            GrammarError::DuplicateRuleSet("default".into())
        );

        let invalid = GrammarBuilder::new("x")
            .rule_set(RuleSetDef::new("default").span(SpanDef::new("R", PatternDef::regex("("))))
            .build();
        assert!(matches!(invalid, Err(GrammarError::InvalidPattern { .. })));
    }

    #[test]
    fn test_pattern_matching() {
        let chars: Vec<char> = "été SELECT 42".chars().collect();
        let text: String = chars.iter().collect();
        let mut offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        offsets.push(text.len());

        let literal = Pattern::compile(&"select".into(), true, "s").unwrap();
        assert_eq!(literal.match_at(&chars, &text, &offsets, 4), Some(6));
        assert_eq!(literal.match_at(&chars, &text, &offsets, 3), None);

        let regex = Pattern::compile(&PatternDef::regex(r"\d+"), false, "n").unwrap();
        assert_eq!(regex.match_at(&chars, &text, &offsets, 11), Some(2));
        assert_eq!(regex.match_at(&chars, &text, &offsets, 10), None);

        let empty = Pattern::compile(&PatternDef::regex("x*"), false, "e").unwrap();
        assert_eq!(empty.match_at(&chars, &text, &offsets, 0), None);
    }
}
