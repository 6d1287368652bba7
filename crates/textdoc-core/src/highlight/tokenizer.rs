//! Single-line tokenizer.
//!
//! Scans one line under a given entry [`SpanStack`] and produces its words and
//! exit stack. At every position the first applicable rule wins:
//!
//! 1. space / tab, each a word of its own;
//! 2. the active span's escape character;
//! 3. a numeric literal at the start of a word;
//! 4. the active span's end pattern;
//! 5. a begin pattern of the active rule set;
//! 6. a delimiter of the active rule set, emitted as a one-character word;
//! 7. otherwise the character extends the current word.
//!
//! No input makes tokenizing fail; unmatched text always falls through to 7.

use super::color::HighlightColor;
use super::engine::HighlightExtension;
use super::grammar::{HighlightGrammar, RuleSet, Span};
use super::span_stack::SpanStack;
use super::token::{TextWord, WordKind};

pub(crate) struct LineTokenizer<'a> {
    grammar: &'a HighlightGrammar,
    extension: Option<&'a dyn HighlightExtension>,
    chars: &'a [char],
    text: String,
    byte_offsets: Vec<usize>,
    stack: SpanStack,
    words: Vec<TextWord>,
    word_start: usize,
    pending_following: Option<HighlightColor>,
}

impl<'a> LineTokenizer<'a> {
    pub(crate) fn new(
        grammar: &'a HighlightGrammar,
        extension: Option<&'a dyn HighlightExtension>,
        chars: &'a [char],
        entry: SpanStack,
    ) -> Self {
        let text: String = chars.iter().collect();
        let mut byte_offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        byte_offsets.push(text.len());
        Self {
            grammar,
            extension,
            chars,
            text,
            byte_offsets,
            stack: entry,
            words: Vec::new(),
            word_start: 0,
            pending_following: None,
        }
    }

    pub(crate) fn run(mut self) -> (Vec<TextWord>, SpanStack) {
        let len = self.chars.len();
        let mut i = 0usize;

        'scan: while i < len {
            let ch = self.chars[i];

            if ch == ' ' || ch == '\t' {
                self.flush(i);
                let kind = if ch == ' ' {
                    WordKind::Space
                } else {
                    WordKind::Tab
                };
                let color = self.span_color();
                self.words.push(TextWord {
                    column: i,
                    length: 1,
                    color,
                    kind,
                });
                i += 1;
                self.word_start = i;
                continue;
            }

            let span = self.stack.peek().cloned();

            if let Some(span) = &span
                && let Some(escape) = span.escape
                && ch == escape
            {
                if !span.escape_doubles_end() {
                    i = (i + 2).min(len);
                    continue;
                }
                if self.chars.get(i + 1) == Some(&escape) {
                    i += 2;
                    continue;
                }
            }

            let rule_set = self.active_rule_set();

            if self.word_start == i
                && (span.is_none() || rule_set.is_some_and(|rs| rs.highlight_digits))
                && let Some(length) = self.number_length(i)
            {
                self.words.push(TextWord {
                    column: i,
                    length,
                    color: self.grammar.digit_color(),
                    kind: WordKind::Word,
                });
                i += length;
                self.word_start = i;
                continue;
            }

            if let Some(span) = &span
                && let Some(end) = &span.end
                && let Some(length) = end.match_at(self.chars, &self.text, &self.byte_offsets, i)
                && (!span.is_end_single_word || self.is_whole_word(i, length))
            {
                self.flush(i);
                self.words.push(TextWord {
                    column: i,
                    length,
                    color: span.end_color,
                    kind: WordKind::Word,
                });
                self.stack = self.stack.pop();
                i += length;
                self.word_start = i;
                continue;
            }

            if let Some(rule_set) = rule_set {
                for candidate in rule_set.spans() {
                    if let Some(length) = self.begin_length(candidate, i) {
                        self.flush(i);
                        self.words.push(TextWord {
                            column: i,
                            length,
                            color: candidate.begin_color,
                            kind: WordKind::Word,
                        });
                        self.stack = self.stack.push(candidate.clone());
                        i += length;
                        self.word_start = i;
                        continue 'scan;
                    }
                }

                if rule_set.is_delimiter(ch) {
                    self.flush(i);
                    self.emit_word(i, i + 1);
                    i += 1;
                    self.word_start = i;
                    continue;
                }
            }

            i += 1;
        }

        self.flush(len);
        (self.words, self.stack)
    }

    fn active_rule_set(&self) -> Option<&'a RuleSet> {
        match self.stack.peek() {
            Some(span) => span.rule_set.and_then(|id| self.grammar.rule_set(id)),
            None => Some(self.grammar.default_rule_set()),
        }
    }

    fn span_color(&self) -> HighlightColor {
        self.stack
            .peek()
            .map_or(self.grammar.default_color(), |span| span.color)
    }

    fn begin_length(&self, span: &Span, column: usize) -> Option<usize> {
        let length = span
            .begin
            .match_at(self.chars, &self.text, &self.byte_offsets, column)?;
        if span.is_begin_single_word && !self.is_whole_word(column, length) {
            return None;
        }
        match span.begin_at_line_start {
            Some(true) if !self.only_whitespace_before(column) => return None,
            Some(false) if self.only_whitespace_before(column) => return None,
            _ => {}
        }
        if let Some(extension) = self.extension
            && !extension.override_span(span, self.chars, column)
        {
            return None;
        }
        Some(length)
    }

    fn only_whitespace_before(&self, column: usize) -> bool {
        self.chars[..column].iter().all(|&c| c == ' ' || c == '\t')
    }

    fn is_whole_word(&self, column: usize, length: usize) -> bool {
        let before = column == 0 || !is_word_char(self.chars[column - 1]);
        let after = self.chars.get(column + length).is_none_or(|&c| !is_word_char(c));
        before && after
    }

    fn flush(&mut self, end: usize) {
        if self.word_start < end {
            self.emit_word(self.word_start, end);
        }
    }

    fn emit_word(&mut self, start: usize, end: usize) {
        let word: String = self.chars[start..end].iter().collect();
        let rule_set = self.active_rule_set();

        let mut color = self
            .extension
            .and_then(|extension| extension.word_color(&word, &self.stack))
            .or_else(|| rule_set.and_then(|rs| rs.keywords().get(&word)))
            .unwrap_or_else(|| self.span_color());
        if let Some(pending) = self.pending_following.take() {
            color = pending;
        }

        if let Some(rule_set) = rule_set {
            if let Some(rule) = rule_set.previous_mark(&word) {
                let plain = self.span_color();
                if let Some(previous) = self.words.iter_mut().rev().find(|w| !w.is_whitespace())
                    && previous.color == plain
                {
                    previous.color = rule.color;
                }
                if rule.mark_marker {
                    color = rule.color;
                }
            }
            if let Some(rule) = rule_set.following_mark(&word) {
                self.pending_following = Some(rule.color);
                if rule.mark_marker {
                    color = rule.color;
                }
            }
        }

        self.words.push(TextWord {
            column: start,
            length: end - start,
            color,
            kind: WordKind::Word,
        });
    }

    /// Length of the numeric literal starting at `start`, if there is one.
    ///
    /// Accepts `0x` hex, decimals, `.5`, fractions, signed exponents, the
    /// float suffixes `f`/`m`/`d` and the integer suffixes `u`, `l`, `ul`, `lu`.
    fn number_length(&self, start: usize) -> Option<usize> {
        let at = |k: usize| self.chars.get(k).copied();
        let digit = |k: usize| at(k).is_some_and(|c| c.is_ascii_digit());

        if !(digit(start) || (at(start) == Some('.') && digit(start + 1))) {
            return None;
        }

        let mut j = start;
        let mut is_float = false;
        if at(j) == Some('0')
            && matches!(at(j + 1), Some('x' | 'X'))
            && at(j + 2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            j += 2;
            while at(j).is_some_and(|c| c.is_ascii_hexdigit()) {
                j += 1;
            }
        } else {
            while digit(j) {
                j += 1;
            }
            if at(j) == Some('.') && digit(j + 1) {
                is_float = true;
                j += 1;
                while digit(j) {
                    j += 1;
                }
            }
            if matches!(at(j), Some('e' | 'E')) {
                let mut k = j + 1;
                if matches!(at(k), Some('+' | '-')) {
                    k += 1;
                }
                if digit(k) {
                    is_float = true;
                    j = k;
                    while digit(j) {
                        j += 1;
                    }
                }
            }
            if matches!(at(j), Some('f' | 'F' | 'm' | 'M' | 'd' | 'D')) {
                is_float = true;
                j += 1;
            }
        }

        if !is_float {
            match at(j) {
                Some('u' | 'U') => {
                    j += 1;
                    if matches!(at(j), Some('l' | 'L')) {
                        j += 1;
                    }
                }
                Some('l' | 'L') => {
                    j += 1;
                    if matches!(at(j), Some('u' | 'U')) {
                        j += 1;
                    }
                }
                _ => {}
            }
        }

        if at(j).is_some_and(is_word_char) {
            return None;
        }
        Some(j - start)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
