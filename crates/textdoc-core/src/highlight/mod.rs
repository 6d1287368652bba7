//! Span-stack syntax highlighting.
//!
//! A [`HighlightGrammar`] is a set of named [`RuleSet`]s. Each line is
//! tokenized into [`TextWord`]s starting from the [`SpanStack`] left open by
//! the line before it; the stack in effect at the end of a line is stored on
//! the line so that an edit only re-tokenizes lines until the stored state
//! matches again.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use textdoc_core::Document;
//! use textdoc_core::highlight::{Color, GrammarBuilder, RuleSetDef, SpanDef};
//!
//! let comment = Color::new(0, 128, 0);
//! let grammar = GrammarBuilder::new("C")
//!     .rule_set(
//!         RuleSetDef::new("default")
//!             .delimiters("(){};")
//!             .keywords(Color::new(0, 0, 255), ["if", "return"])
//!             .span(SpanDef::new("BlockComment", "/*").end("*/").color(comment)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut doc = Document::from_text("if (x) /* open\nstill comment */ return;");
//! doc.set_grammar(Arc::new(grammar)).unwrap();
//! assert_eq!(doc.line_words(1).unwrap()[0].color.color, comment);
//! ```

mod color;
mod engine;
mod grammar;
mod span_stack;
mod token;
mod tokenizer;

pub use color::{Color, HighlightColor};
pub use engine::{HighlightEngine, HighlightExtension, HighlightReport};
pub use grammar::{
    GrammarBuilder, GrammarError, HighlightGrammar, KeywordTable, MarkRule, Pattern, PatternDef,
    RuleSet, RuleSetDef, RuleSetId, Span, SpanDef, SpanId,
};
pub use span_stack::SpanStack;
pub use token::{TextWord, WordKind};
