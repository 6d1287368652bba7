#![warn(missing_docs)]
//! Text document engine for code editors.
//!
//! # Overview
//!
//! `textdoc-core` keeps a text buffer together with the structures an editor
//! derives from it, and updates all of them incrementally on every edit:
//!
//! - **Storage**: a gap buffer of `char`s ([`storage`])
//! - **Lines**: an augmented AVL tree of line records with O(log n) lookup
//!   by line number and by offset ([`line_index`])
//! - **Anchors**: positions that follow edits and report when their text is
//!   removed ([`anchor`])
//! - **Highlighting**: span-stack tokenizer with incremental re-highlighting
//!   that stops once the line state stabilizes ([`highlight`])
//! - **Folding, markers and bookmarks**: offset segments reconciled against
//!   each edit ([`folding`], [`markers`], [`segments`])
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document façade & change events            │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Highlighting (grammar, span stacks)        │  ← Per-line tokens
//! ├─────────────────────────────────────────────┤
//! │  Anchors, markers, bookmarks, folds         │  ← Tracked positions
//! ├─────────────────────────────────────────────┤
//! │  Line Index (augmented AVL tree)            │  ← Line Access
//! ├─────────────────────────────────────────────┤
//! │  Gap Buffer Storage                         │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use textdoc_core::{Document, DocumentEvent};
//!
//! let mut doc = Document::from_text("let x = 1;\r\nlet y = 2;\n");
//! assert_eq!(doc.line_count(), 3);
//!
//! doc.subscribe(|event| {
//!     if let DocumentEvent::Changed(change) = event {
//!         println!("changed at {}", change.offset);
//!     }
//! });
//!
//! doc.replace(4, 1, "answer").unwrap();
//! assert_eq!(doc.line_text(0).unwrap(), "let answer = 1;");
//! assert_eq!(doc.line(1).unwrap().offset, 17);
//! ```
//!
//! All offsets and columns count Unicode scalar values (`char`s). Lines end
//! at `\n`, `\r\n` or a lone `\r`.

pub mod anchor;
pub mod change;
pub mod document;
pub mod error;
pub mod folding;
pub mod highlight;
pub mod line_ending;
pub mod line_index;
pub mod markers;
pub mod options;
pub mod segments;
pub mod storage;

pub use anchor::{AnchorId, AnchorMovement, AnchorSet, TextAnchor};
pub use change::{DocumentEvent, DocumentEventCallback, TextChange};
pub use document::Document;
pub use error::{DocumentError, Result};
pub use folding::{
    BraceFoldingStrategy, FoldIndex, FoldMarker, FoldType, FoldingStrategy, IndentFoldingStrategy,
};
pub use highlight::{
    GrammarBuilder, GrammarError, HighlightEngine, HighlightExtension, HighlightGrammar,
    HighlightReport, SpanStack, TextWord, WordKind,
};
pub use line_ending::{LineDelimiter, LineSpan, scan_lines};
pub use line_index::{LineId, LineIndex, LineInfo, LineRecord, TextPosition};
pub use markers::{Bookmark, BookmarkSet, MarkerSet, MarkerType, TextMarker};
pub use options::{DocumentOptions, GapBufferOptions, HighlightOptions};
pub use segments::Segment;
pub use storage::GapBuffer;
