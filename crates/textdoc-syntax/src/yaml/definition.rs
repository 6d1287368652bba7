use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
/// Raw YAML grammar definition.
pub struct GrammarDefinition {
    /// Grammar name, used as the lookup key in a [`GrammarSet`](super::GrammarSet).
    pub name: String,

    #[serde(default)]
    /// File extensions associated with this grammar, without the leading dot.
    pub file_extensions: Vec<String>,

    #[serde(default)]
    /// Color of text no rule applies to.
    pub default_color: Option<ColorSpec>,

    #[serde(default)]
    /// Color of numeric literals.
    pub digit_color: Option<ColorSpec>,

    #[serde(default = "default_rule_set")]
    /// Rule set in effect outside every span.
    pub default_rule_set: String,

    #[serde(default)]
    /// Variables used for `{{name}}` substitution in regex patterns.
    pub variables: HashMap<String, String>,

    #[serde(default)]
    /// Named colors that other color fields may refer to.
    pub colors: HashMap<String, ColorSpec>,

    #[serde(default)]
    /// How fold regions are generated for documents using this grammar.
    pub folding: FoldingDefinition,

    /// Rule sets in declaration order.
    pub rule_sets: Vec<RuleSetDefinition>,
}

fn default_rule_set() -> String {
    textdoc_core::highlight::GrammarBuilder::DEFAULT_RULE_SET.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
/// A color reference: a palette name or hex string, or a full style.
pub enum ColorSpec {
    /// `"#rrggbb"`, `"#rgb"` or a key of the `colors` palette.
    Plain(String),
    /// Color plus attributes.
    Styled {
        /// Foreground, as in [`ColorSpec::Plain`].
        color: String,
        #[serde(default)]
        /// Optional background.
        background: Option<String>,
        #[serde(default)]
        /// Bold text.
        bold: bool,
        #[serde(default)]
        /// Italic text.
        italic: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
/// `folding:` field of a grammar.
pub enum FoldingDefinition {
    #[default]
    /// No fold regions.
    None,
    /// Matching bracket pairs spanning lines.
    Braces {
        #[serde(default = "default_open")]
        /// Opening bracket.
        open: char,
        #[serde(default = "default_close")]
        /// Closing bracket.
        close: char,
    },
    /// Indentation blocks.
    Indent {
        #[serde(default = "default_tab_size")]
        /// Columns a tab advances to.
        tab_size: usize,
    },
}

fn default_open() -> char {
    '{'
}

fn default_close() -> char {
    '}'
}

fn default_tab_size() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
/// One rule set.
pub struct RuleSetDefinition {
    /// Rule set name.
    pub name: String,

    #[serde(default)]
    /// Match keywords case-insensitively.
    pub ignore_case: bool,

    #[serde(default)]
    /// Highlight numbers inside spans using this rule set.
    pub highlight_digits: bool,

    #[serde(default)]
    /// Characters that split words.
    pub delimiters: String,

    #[serde(default)]
    /// Keyword groups.
    pub keywords: Vec<KeywordGroup>,

    #[serde(default)]
    /// Spans, tried in order.
    pub spans: Vec<SpanDefinition>,

    #[serde(default)]
    /// Markers coloring the word before them.
    pub mark_previous: Vec<MarkDefinition>,

    #[serde(default)]
    /// Markers coloring the word after them.
    pub mark_following: Vec<MarkDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
/// Words sharing one color.
pub struct KeywordGroup {
    /// Group color.
    pub color: ColorSpec,
    /// The keywords.
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
/// A `mark_previous` / `mark_following` rule.
pub struct MarkDefinition {
    /// Marker word.
    pub what: String,
    /// Color given to the neighbouring word.
    pub color: ColorSpec,
    #[serde(default)]
    /// Also color the marker itself.
    pub mark_marker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
/// A begin/end pattern: plain text, or `{ regex: ... }`.
pub enum PatternDefinition {
    /// Exact text.
    Literal(String),
    /// Regular expression matched at the current column.
    Regex {
        /// The expression; `{{name}}` references are substituted first.
        regex: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
/// One span.
pub struct SpanDefinition {
    /// Span name.
    pub name: String,

    /// Opening pattern.
    pub begin: PatternDefinition,

    #[serde(default)]
    /// Closing pattern; without one the span ends with the line.
    pub end: Option<PatternDefinition>,

    #[serde(default)]
    /// Content color.
    pub color: Option<ColorSpec>,

    #[serde(default)]
    /// Color of the opening text.
    pub begin_color: Option<ColorSpec>,

    #[serde(default)]
    /// Color of the closing text.
    pub end_color: Option<ColorSpec>,

    #[serde(default)]
    /// Rule set applied inside the span.
    pub rule_set: Option<String>,

    #[serde(default)]
    /// Escape character.
    pub escape: Option<char>,

    #[serde(default)]
    /// Close the span at the end of the line even if it has an end pattern.
    pub stop_eol: bool,

    #[serde(default)]
    /// The opening text must be a whole word.
    pub begin_single_word: bool,

    #[serde(default)]
    /// The closing text must be a whole word.
    pub end_single_word: bool,

    #[serde(default)]
    /// `true`: only after leading whitespace; `false`: never there.
    pub begin_at_line_start: Option<bool>,

    #[serde(default)]
    /// Match begin/end case-insensitively.
    pub ignore_case: bool,
}
