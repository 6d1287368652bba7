#![warn(missing_docs)]
//! `textdoc-syntax` - YAML grammar definitions for `textdoc-core`.
//!
//! Grammars are written as YAML files (see [`yaml`]), compiled into
//! [`textdoc_core::HighlightGrammar`] values and collected in a
//! [`GrammarSet`]. A [`SyntaxProcessor`] applies one to a
//! [`textdoc_core::Document`], including fold region generation.
//!
//! ```
//! use textdoc_core::Document;
//! use textdoc_syntax::{GrammarSet, SyntaxProcessor};
//!
//! let mut set = GrammarSet::new();
//! set.load_from_str(
//!     "name: Shell\n\
//!      file_extensions: [sh]\n\
//!      rule_sets:\n  - name: default\n    spans:\n      - { name: Comment, begin: '#', color: '#808080' }\n",
//! )
//! .unwrap();
//!
//! let language = set.language_for_path("build.sh").unwrap();
//! let mut doc = Document::from_text("echo hi # note\n");
//! let report = SyntaxProcessor::new(language).process(&mut doc).unwrap();
//! assert!(report.full_pass);
//! ```

pub mod yaml;

mod processor;

pub use processor::SyntaxProcessor;
pub use yaml::*;
