//! Document façade.
//!
//! [`Document`] owns every structure of the engine and keeps them consistent
//! across edits. One edit runs through a fixed pipeline: the gap buffer, the
//! line index, anchors and segments (markers, bookmarks, folds), incremental
//! highlighting, and finally the [`DocumentEvent::Changed`] notification.
//!
//! # Example
//!
//! ```rust
//! use textdoc_core::{Document, TextPosition};
//!
//! let mut doc = Document::from_text("fn main() {\n}\n");
//! let anchor = doc.create_anchor(1, 1).unwrap();
//!
//! doc.insert(12, "    body();\n").unwrap();
//! assert_eq!(doc.line_count(), 4);
//! assert_eq!(doc.line_text(1).unwrap(), "    body();");
//! assert_eq!(doc.anchor_position(anchor).unwrap(), TextPosition::new(2, 1));
//! ```

use std::sync::Arc;
#[cfg(debug_assertions)]
use std::thread::ThreadId;

use crate::anchor::{AnchorId, AnchorMovement, AnchorSet, TextAnchor};
use crate::change::{DocumentEvent, DocumentEventCallback, TextChange};
use crate::error::{DocumentError, Result};
use crate::folding::{FoldIndex, FoldMarker, FoldingStrategy};
use crate::highlight::{
    HighlightEngine, HighlightExtension, HighlightGrammar, HighlightReport, SpanStack, TextWord,
};
use crate::line_ending::scan_lines;
use crate::line_index::{LineId, LineIndex, LineInfo, TextPosition};
use crate::markers::{BookmarkSet, MarkerSet};
use crate::options::DocumentOptions;
use crate::storage::GapBuffer;

/// A text document with line structure, anchors, highlighting and folding.
///
/// Offsets and columns count `char`s. The document is single-owner: in debug
/// builds every mutating call made from a thread other than the owning one
/// fails with [`DocumentError::WrongThread`].
pub struct Document {
    buffer: GapBuffer,
    lines: LineIndex,
    anchors: AnchorSet,
    markers: MarkerSet,
    bookmarks: BookmarkSet,
    folding: FoldIndex,
    highlighter: Option<HighlightEngine>,
    extension: Option<Arc<dyn HighlightExtension>>,
    last_report: Option<HighlightReport>,
    options: DocumentOptions,
    callbacks: Vec<DocumentEventCallback>,
    version: u64,
    #[cfg(debug_assertions)]
    owner: ThreadId,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::with_options("", DocumentOptions::default())
    }

    /// Create a document holding `text`.
    pub fn from_text(text: &str) -> Self {
        Self::with_options(text, DocumentOptions::default())
    }

    /// Create a document holding `text` with explicit options.
    pub fn with_options(text: &str, options: DocumentOptions) -> Self {
        let buffer = GapBuffer::from_text(text, options.gap);
        let chars: Vec<char> = text.chars().collect();
        let lines = LineIndex::from_spans(&scan_lines(&chars));
        Self {
            buffer,
            lines,
            anchors: AnchorSet::new(),
            markers: MarkerSet::new(),
            bookmarks: BookmarkSet::new(),
            folding: FoldIndex::new(options.default_fold_text.clone()),
            highlighter: None,
            extension: None,
            last_report: None,
            options,
            callbacks: Vec::new(),
            version: 0,
            #[cfg(debug_assertions)]
            owner: std::thread::current().id(),
        }
    }

    /// Options the document was created with.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Make the calling thread the owner of this document.
    pub fn adopt_current_thread(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.owner = std::thread::current().id();
        }
    }

    // ---- text ----

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the document holds no text.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Character at `offset`.
    pub fn char_at(&self, offset: usize) -> Result<char> {
        self.buffer.char_at(offset)
    }

    /// `length` characters starting at `offset`.
    pub fn text(&self, offset: usize, length: usize) -> Result<String> {
        self.buffer.text(offset, length)
    }

    /// The whole text.
    pub fn full_text(&self) -> String {
        self.buffer.to_text()
    }

    /// Edit counter, bumped once per applied change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.replace(offset, 0, text)
    }

    /// Remove `length` characters at `offset`.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<()> {
        self.replace(offset, length, "")
    }

    /// Replace `length` characters at `offset` with `text`.
    ///
    /// Empty edits are accepted and change nothing.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        self.check_thread()?;
        let len = self.buffer.len();
        if offset > len {
            return Err(DocumentError::OffsetOutOfRange { offset, len });
        }
        if offset.checked_add(length).is_none_or(|end| end > len) {
            return Err(DocumentError::RangeOutOfBounds {
                offset,
                length,
                len,
            });
        }
        if length == 0 && text.is_empty() {
            return Ok(());
        }

        let change = TextChange::new(offset, self.buffer.text(offset, length)?, text);
        self.emit(&DocumentEvent::BeforeChange(change.clone()));
        self.apply_change(&change)?;
        self.version += 1;
        self.emit(&DocumentEvent::Changed(change));
        Ok(())
    }

    /// Replace the whole text.
    ///
    /// Every anchor is marked deleted and markers, bookmarks and fold regions
    /// are dropped; highlighting is redone from scratch.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.check_thread()?;
        let change = TextChange::new(0, self.buffer.to_text(), text);
        self.emit(&DocumentEvent::BeforeChange(change.clone()));

        self.buffer.set_content(text);
        let chars: Vec<char> = text.chars().collect();
        self.lines.rebuild(&scan_lines(&chars));
        self.anchors.delete_all();
        self.markers.clear();
        self.bookmarks.clear();
        self.folding.clear();
        if let Some(engine) = &self.highlighter {
            self.last_report = Some(engine.highlight_all(&mut self.lines, &self.buffer));
        }

        self.version += 1;
        self.emit(&DocumentEvent::Changed(change));
        Ok(())
    }

    /// Register a listener for [`DocumentEvent`]s.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&DocumentEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    // ---- lines ----

    /// Number of lines. An empty document has one line; a trailing
    /// delimiter starts a further empty line.
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// The line index.
    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Position data for line `number`.
    pub fn line(&self, number: usize) -> Result<LineInfo> {
        let id = self.lines.line_by_index(number)?;
        self.lines.info(id)
    }

    /// Content of line `number` without its delimiter.
    pub fn line_text(&self, number: usize) -> Result<String> {
        let info = self.line(number)?;
        self.buffer.text(info.offset, info.length)
    }

    /// Line containing `offset`. `offset == len()` belongs to the last line.
    pub fn line_number_for_offset(&self, offset: usize) -> Result<usize> {
        self.offset_to_position(offset).map(|position| position.line)
    }

    /// Line and column of `offset`.
    pub fn offset_to_position(&self, offset: usize) -> Result<TextPosition> {
        let (id, start) = self.lines.line_by_offset(offset)?;
        Ok(TextPosition::new(self.lines.index_of(id)?, offset - start))
    }

    /// Offset of `position`, clamped to the nearest valid line and column.
    pub fn position_to_offset(&self, position: TextPosition) -> usize {
        let last = self.lines.line_count().saturating_sub(1);
        match self.line(position.line.min(last)) {
            Ok(info) => info.offset + position.column.min(info.length),
            Err(_) => 0,
        }
    }

    // ---- anchors ----

    /// Create an anchor at `column` of line `line` that stays in front of
    /// text inserted at its position.
    pub fn create_anchor(&mut self, line: usize, column: usize) -> Result<AnchorId> {
        self.create_anchor_with(line, column, AnchorMovement::BeforeInsertion)
    }

    /// Create an anchor with an explicit insertion behavior.
    pub fn create_anchor_with(
        &mut self,
        line: usize,
        column: usize,
        movement: AnchorMovement,
    ) -> Result<AnchorId> {
        self.check_thread()?;
        let info = self.line(line)?;
        if column > info.length {
            return Err(DocumentError::OffsetOutOfRange {
                offset: info.offset + column,
                len: self.len(),
            });
        }
        let id = self.anchors.insert(TextAnchor {
            line: info.id,
            column,
            movement,
        });
        self.lines.line_mut(info.id)?.anchors.push(id);
        Ok(id)
    }

    /// Current state of an anchor.
    pub fn anchor(&self, id: AnchorId) -> Result<TextAnchor> {
        self.anchors.get(id).copied()
    }

    /// Line and column of an anchor.
    pub fn anchor_position(&self, id: AnchorId) -> Result<TextPosition> {
        let anchor = self.anchors.get(id)?;
        Ok(TextPosition::new(
            self.lines.index_of(anchor.line)?,
            anchor.column,
        ))
    }

    /// Absolute offset of an anchor.
    pub fn anchor_offset(&self, id: AnchorId) -> Result<usize> {
        let anchor = self.anchors.get(id)?;
        Ok(self.lines.offset_of(anchor.line)? + anchor.column)
    }

    /// Whether the text an anchor marked was removed.
    pub fn is_anchor_deleted(&self, id: AnchorId) -> Result<bool> {
        self.anchors.is_deleted(id)
    }

    /// Stop tracking an anchor. The handle becomes unknown afterwards.
    pub fn release_anchor(&mut self, id: AnchorId) -> Result<()> {
        self.check_thread()?;
        if let Some(line) = self.anchors.release(id)?
            && let Ok(record) = self.lines.line_mut(line)
        {
            record.anchors.retain(|anchor| *anchor != id);
        }
        Ok(())
    }

    // ---- highlighting ----

    /// Install a grammar and highlight the whole document.
    pub fn set_grammar(&mut self, grammar: Arc<HighlightGrammar>) -> Result<HighlightReport> {
        self.check_thread()?;
        let mut engine = HighlightEngine::new(grammar, self.options.highlight);
        engine.set_extension(self.extension.clone());
        let report = engine.highlight_all(&mut self.lines, &self.buffer);
        self.highlighter = Some(engine);
        self.last_report = Some(report);
        Ok(report)
    }

    /// Remove the grammar and every line's highlighting.
    pub fn clear_grammar(&mut self) -> Result<()> {
        self.check_thread()?;
        self.highlighter = None;
        self.last_report = None;
        let ids: Vec<LineId> = self.lines.iter().map(|(id, _)| id).collect();
        for id in ids {
            let record = self.lines.line_mut(id)?;
            record.words = None;
            record.span_stack = None;
        }
        Ok(())
    }

    /// The installed grammar.
    pub fn grammar(&self) -> Option<&Arc<HighlightGrammar>> {
        self.highlighter.as_ref().map(HighlightEngine::grammar)
    }

    /// Install or remove the highlight extension. With a grammar installed
    /// the whole document is re-highlighted.
    pub fn set_highlight_extension(
        &mut self,
        extension: Option<Arc<dyn HighlightExtension>>,
    ) -> Result<Option<HighlightReport>> {
        self.check_thread()?;
        self.extension = extension;
        let Some(engine) = &mut self.highlighter else {
            return Ok(None);
        };
        engine.set_extension(self.extension.clone());
        let report = engine.highlight_all(&mut self.lines, &self.buffer);
        self.last_report = Some(report);
        Ok(Some(report))
    }

    /// Tokens of line `number`. Empty without a grammar.
    pub fn line_words(&self, number: usize) -> Result<&[TextWord]> {
        let id = self.lines.line_by_index(number)?;
        Ok(self.lines.line(id)?.words().unwrap_or(&[]))
    }

    /// Span stack in effect at the end of line `number`.
    pub fn line_span_stack(&self, number: usize) -> Result<Option<&SpanStack>> {
        let id = self.lines.line_by_index(number)?;
        Ok(self.lines.line(id)?.span_stack())
    }

    /// Outcome of the most recent highlighting pass.
    pub fn last_highlight_report(&self) -> Option<HighlightReport> {
        self.last_report
    }

    // ---- folding ----

    /// Fold regions.
    pub fn folding(&self) -> &FoldIndex {
        &self.folding
    }

    /// Fold regions, for folding and unfolding.
    pub fn folding_mut(&mut self) -> &mut FoldIndex {
        &mut self.folding
    }

    /// Replace the fold regions, keeping the folded state of unchanged ones.
    pub fn update_foldings(&mut self, regions: Vec<FoldMarker>) -> Result<&[FoldMarker]> {
        self.check_thread()?;
        let len = self.buffer.len();
        let regions = regions
            .into_iter()
            .filter(|region| region.end_offset() <= len)
            .collect();
        let lines = &self.lines;
        Ok(self
            .folding
            .update_foldings(regions, |offset| position_in(lines, offset)))
    }

    /// Regenerate the fold regions with `strategy`.
    pub fn update_foldings_with<S>(&mut self, strategy: &mut S) -> Result<&[FoldMarker]>
    where
        S: FoldingStrategy + ?Sized,
    {
        let regions = strategy.generate_foldings(self);
        self.update_foldings(regions)
    }

    /// Toggle the innermost region starting on `line`.
    pub fn toggle_fold_at_line(&mut self, line: usize) -> Result<bool> {
        self.check_thread()?;
        Ok(self.folding.toggle_fold_at_line(line))
    }

    // ---- markers and bookmarks ----

    /// Text markers.
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Text markers, for adding and removing.
    pub fn markers_mut(&mut self) -> &mut MarkerSet {
        &mut self.markers
    }

    /// Bookmarks.
    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    /// Bookmarks, for enabling and disabling.
    pub fn bookmarks_mut(&mut self) -> &mut BookmarkSet {
        &mut self.bookmarks
    }

    /// Add or remove the bookmark on `line`. Returns whether one is set afterwards.
    pub fn toggle_bookmark(&mut self, line: usize) -> Result<bool> {
        self.check_thread()?;
        let offset = self.line(line)?.offset;
        Ok(self.bookmarks.toggle(line, offset))
    }

    // ---- internals ----

    fn emit(&mut self, event: &DocumentEvent) {
        for callback in &mut self.callbacks {
            callback(event);
        }
    }

    #[cfg(debug_assertions)]
    fn check_thread(&self) -> Result<()> {
        if std::thread::current().id() == self.owner {
            Ok(())
        } else {
            Err(DocumentError::WrongThread)
        }
    }

    #[cfg(not(debug_assertions))]
    fn check_thread(&self) -> Result<()> {
        Ok(())
    }

    /// Run `change` through the buffer, the line index, anchors, segments and
    /// highlighting. The range was validated by the caller.
    fn apply_change(&mut self, change: &TextChange) -> Result<()> {
        let offset = change.offset;
        let removed = change.removed_len();
        let inserted = change.inserted_len();

        // Start one line early at a line start so a `\r` left behind can join
        // an inserted `\n`.
        let (mut first, mut first_start) = self.lines.line_by_offset(offset)?;
        if first_start == offset
            && let Some(previous) = self.lines.previous_line(first)?
        {
            first = previous;
            first_start = self.lines.offset_of(previous)?;
        }
        let (last, last_start) = self.lines.line_by_offset(offset + removed)?;
        let last_end = last_start + self.lines.line(last)?.total_length();
        let last_exit = self.lines.line(last)?.span_stack.clone();
        let reaches_end = self.lines.next_line(last)?.is_none();

        // Detach the anchors of the affected lines with their old offsets.
        let mut old_ids = Vec::new();
        let mut moved: Vec<(AnchorId, Option<usize>)> = Vec::new();
        let mut id = first;
        let mut line_start = first_start;
        loop {
            let record = self.lines.line_mut(id)?;
            let total_length = record.total_length();
            for anchor_id in std::mem::take(&mut record.anchors) {
                if let Ok(anchor) = self.anchors.get(anchor_id) {
                    let position = line_start + anchor.column;
                    moved.push((anchor_id, anchor.relocate(position, offset, removed, inserted)));
                }
            }
            old_ids.push(id);
            if id == last {
                break;
            }
            line_start += total_length;
            match self.lines.next_line(id)? {
                Some(next) => id = next,
                None => break,
            }
        }

        self.buffer.replace(offset, removed, &change.inserted_text)?;

        let region_len = last_end - first_start - removed + inserted;
        let chars = self.buffer.chars(first_start, region_len)?;
        let mut spans = scan_lines(&chars);
        if !reaches_end {
            // The region ends with a delimiter; the empty tail belongs to the next line.
            spans.pop();
        }

        let reused = old_ids.len().min(spans.len());
        let mut new_ids: Vec<LineId> = Vec::with_capacity(spans.len());
        for (&id, &span) in old_ids.iter().zip(&spans) {
            self.lines.set_line_length(id, span)?;
            new_ids.push(id);
        }
        if spans.len() > reused {
            let mut after = new_ids[reused - 1];
            for &span in &spans[reused..] {
                after = self.lines.insert_line_after(after, span)?;
                new_ids.push(after);
            }
            tracing::trace!(offset, added = spans.len() - reused, "lines split");
        } else if old_ids.len() > reused {
            for &id in &old_ids[reused..] {
                self.lines.remove_line(id)?;
            }
            tracing::trace!(offset, removed = old_ids.len() - reused, "lines merged");
        }

        for &id in &new_ids {
            let record = self.lines.line_mut(id)?;
            record.words = None;
            record.span_stack = None;
        }
        if let Some(&tail) = new_ids.last() {
            self.lines.line_mut(tail)?.span_stack = last_exit;
        }

        // Re-home anchors: a position inside a delimiter clamps to the line end.
        let mut starts = Vec::with_capacity(spans.len());
        let mut start = first_start;
        for span in &spans {
            starts.push(start);
            start += span.total_length;
        }
        for (anchor_id, position) in moved {
            let Some(position) = position else {
                self.anchors.mark_deleted(anchor_id);
                continue;
            };
            let k = spans
                .iter()
                .zip(&starts)
                .position(|(span, &start)| position < start + span.total_length)
                .unwrap_or(spans.len() - 1);
            let column = position
                .saturating_sub(starts[k])
                .min(spans[k].content_length());
            self.anchors.rehome(anchor_id, new_ids[k], column);
            self.lines.line_mut(new_ids[k])?.anchors.push(anchor_id);
        }

        self.markers.apply_change(change);
        let lines = &self.lines;
        self.bookmarks
            .apply_change(change, |offset| locate_line(lines, offset));
        self.folding
            .apply_change(change, |offset| position_in(lines, offset));

        if let Some(engine) = &self.highlighter {
            let first_number = self.lines.index_of(first)?;
            let report =
                engine.highlight_lines(&mut self.lines, &self.buffer, first_number, new_ids.len());
            self.last_report = Some(report);
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.len())
            .field("lines", &self.line_count())
            .field("version", &self.version)
            .field("highlighter", &self.highlighter)
            .finish_non_exhaustive()
    }
}

/// `(line number, line start)` of `offset`, clamped to the document.
fn locate_line(lines: &LineIndex, offset: usize) -> (usize, usize) {
    let offset = offset.min(lines.total_length());
    lines
        .line_by_offset(offset)
        .and_then(|(id, start)| Ok((lines.index_of(id)?, start)))
        .unwrap_or((0, 0))
}

fn position_in(lines: &LineIndex, offset: usize) -> TextPosition {
    let offset = offset.min(lines.total_length());
    let (line, start) = locate_line(lines, offset);
    TextPosition::new(line, offset - start)
}
