//! Full and incremental re-highlighting over a [`LineIndex`].

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::color::HighlightColor;
use super::grammar::{HighlightGrammar, Span};
use super::span_stack::SpanStack;
use super::token::TextWord;
use super::tokenizer::LineTokenizer;
use crate::line_index::{LineId, LineIndex};
use crate::options::HighlightOptions;
use crate::storage::GapBuffer;

/// Hook for language-specific highlighting decisions the grammar cannot express.
pub trait HighlightExtension: Send + Sync {
    /// Return `false` to stop `span` from opening at `column` of `line`.
    fn override_span(&self, span: &Span, line: &[char], column: usize) -> bool {
        let _ = (span, line, column);
        true
    }

    /// Color for `word`, overriding keyword and span colors.
    fn word_color(&self, word: &str, stack: &SpanStack) -> Option<HighlightColor> {
        let _ = (word, stack);
        None
    }
}

/// What a highlighting pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightReport {
    /// First re-tokenized line.
    pub first_line: usize,
    /// Number of re-tokenized lines.
    pub line_count: usize,
    /// Whether the whole document was re-tokenized.
    pub full_pass: bool,
}

impl HighlightReport {
    /// Re-tokenized line numbers.
    pub fn lines(&self) -> Range<usize> {
        self.first_line..self.first_line + self.line_count
    }
}

/// Tokenizes lines with a grammar and keeps per-line results in the line records.
pub struct HighlightEngine {
    grammar: Arc<HighlightGrammar>,
    extension: Option<Arc<dyn HighlightExtension>>,
    options: HighlightOptions,
}

impl HighlightEngine {
    /// Create an engine for `grammar`.
    pub fn new(grammar: Arc<HighlightGrammar>, options: HighlightOptions) -> Self {
        Self {
            grammar,
            extension: None,
            options,
        }
    }

    /// Install or remove the extension hook.
    pub fn set_extension(&mut self, extension: Option<Arc<dyn HighlightExtension>>) {
        self.extension = extension;
    }

    /// The grammar in use.
    pub fn grammar(&self) -> &Arc<HighlightGrammar> {
        &self.grammar
    }

    /// Propagation policy.
    pub fn options(&self) -> HighlightOptions {
        self.options
    }

    /// Tokenize one line starting from the exit stack of the previous line.
    ///
    /// End-of-line spans of `previous_exit` are dropped before scanning.
    pub fn tokenize_line(&self, line: &[char], previous_exit: &SpanStack) -> (Vec<TextWord>, SpanStack) {
        LineTokenizer::new(
            &self.grammar,
            self.extension.as_deref(),
            line,
            previous_exit.without_stop_eol(),
        )
        .run()
    }

    /// Re-tokenize every line.
    pub fn highlight_all(&self, lines: &mut LineIndex, buffer: &GapBuffer) -> HighlightReport {
        let mut targets: Vec<(LineId, usize, usize)> = Vec::with_capacity(lines.line_count());
        let mut offset = 0usize;
        for (id, record) in lines.iter() {
            targets.push((id, offset, record.length()));
            offset += record.total_length();
        }

        let mut exit = SpanStack::new();
        for &(id, offset, length) in &targets {
            let chars = buffer.chars(offset, length).unwrap_or_default();
            let (words, line_exit) = self.tokenize_line(&chars, &exit);
            exit = line_exit;
            if let Ok(record) = lines.line_mut(id) {
                record.words = Some(words);
                record.span_stack = Some(exit.clone());
            }
        }

        tracing::debug!(
            grammar = self.grammar.name(),
            lines = targets.len(),
            "full highlight pass"
        );
        HighlightReport {
            first_line: 0,
            line_count: targets.len(),
            full_pass: true,
        }
    }

    /// Re-tokenize lines `first..first + count`, then keep going while the exit
    /// state of the last re-tokenized line differs from what it was before.
    ///
    /// Falls back to [`highlight_all`](Self::highlight_all) once more lines
    /// were touched than [`HighlightOptions::fallback_threshold`] allows, or
    /// when the line before `first` has never been tokenized.
    pub fn highlight_lines(
        &self,
        lines: &mut LineIndex,
        buffer: &GapBuffer,
        first: usize,
        count: usize,
    ) -> HighlightReport {
        let line_count = lines.line_count();
        if first >= line_count {
            return HighlightReport {
                first_line: first,
                ..HighlightReport::default()
            };
        }

        let mut exit = if first == 0 {
            SpanStack::new()
        } else {
            let previous = lines
                .line_by_index(first - 1)
                .ok()
                .and_then(|id| lines.line(id).ok())
                .and_then(|record| record.span_stack.clone());
            match previous {
                Some(stack) => stack,
                None => return self.highlight_all(lines, buffer),
            }
        };

        let threshold = self.options.fallback_threshold(line_count);
        let (Ok(mut id), Ok(mut offset)) = (
            lines.line_by_index(first),
            lines.line_by_index(first).and_then(|id| lines.offset_of(id)),
        ) else {
            return self.highlight_all(lines, buffer);
        };

        let mut touched = 0usize;
        loop {
            let (length, total_length) = match lines.line(id) {
                Ok(record) => (record.length(), record.total_length()),
                Err(_) => break,
            };
            let chars = buffer.chars(offset, length).unwrap_or_default();
            let (words, line_exit) = self.tokenize_line(&chars, &exit);
            let previous = match lines.line_mut(id) {
                Ok(record) => {
                    record.words = Some(words);
                    record.span_stack.replace(line_exit.clone())
                }
                Err(_) => break,
            };
            touched += 1;
            exit = line_exit;

            let forced = touched < count;
            let stable = previous.is_some_and(|stack| stack.same_state(&exit));
            if !forced && stable {
                break;
            }
            if touched > threshold {
                tracing::debug!(touched, threshold, "highlight propagation fell back to a full pass");
                return self.highlight_all(lines, buffer);
            }
            match lines.next_line(id) {
                Ok(Some(next)) => {
                    id = next;
                    offset += total_length;
                }
                _ => break,
            }
        }

        tracing::trace!(first, touched, "incremental highlight");
        HighlightReport {
            first_line: first,
            line_count: touched,
            full_pass: false,
        }
    }
}

impl fmt::Debug for HighlightEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightEngine")
            .field("grammar", &self.grammar.name())
            .field("extension", &self.extension.is_some())
            .field("options", &self.options)
            .finish()
    }
}
