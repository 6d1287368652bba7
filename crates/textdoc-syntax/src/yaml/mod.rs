//! YAML grammar definitions.
//!
//! A definition file describes one [`HighlightGrammar`](textdoc_core::HighlightGrammar):
//!
//! ```yaml
//! name: C
//! file_extensions: [c, h]
//! colors:
//!   comment: "#008000"
//! variables:
//!   ident: '[A-Za-z_][A-Za-z0-9_]*'
//! folding: { strategy: braces }
//! rule_sets:
//!   - name: default
//!     delimiters: "(){};,"
//!     keywords:
//!       - color: { color: "#0000ff", bold: true }
//!         words: [if, else, return]
//!     spans:
//!       - { name: Block, begin: "/*", end: "*/", color: comment }
//!       - { name: Line, begin: "//", color: comment }
//!       - name: Directive
//!         begin: { regex: '#\s*{{ident}}' }
//!         color: "#800080"
//!         begin_at_line_start: true
//! ```
//!
//! Definitions are compiled with [`compile_grammar`] or collected in a
//! [`GrammarSet`].

mod compiler;
mod definition;
mod error;
mod set;

pub use compiler::compile_grammar;
pub use definition::{
    ColorSpec, FoldingDefinition, GrammarDefinition, KeywordGroup, MarkDefinition,
    PatternDefinition, RuleSetDefinition, SpanDefinition,
};
pub use error::SyntaxError;
pub use set::{GrammarSet, Language};
