//! Text markers and bookmarks.
//!
//! Both are derived, offset-based state owned by the document and kept in
//! place across edits by [`reconcile`](crate::segments::reconcile). Rendering
//! them is up to the host.

use crate::change::TextChange;
use crate::highlight::Color;
use crate::segments::{self, Segment};

/// How a marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerType {
    /// Filled background.
    #[default]
    SolidBlock,
    /// Straight underline.
    Underlined,
    /// Squiggly underline (diagnostics).
    WaveLine,
}

/// A colored region of text, e.g. a search hit or a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMarker {
    /// Start offset in characters.
    pub offset: usize,
    /// Length in characters.
    pub length: usize,
    /// Drawing style.
    pub marker_type: MarkerType,
    /// Marker color.
    pub color: Color,
    /// Optional hover text.
    pub tooltip: Option<String>,
}

impl TextMarker {
    /// Create a marker over `[offset, offset + length)`.
    pub fn new(offset: usize, length: usize, marker_type: MarkerType, color: Color) -> Self {
        Self {
            offset,
            length,
            marker_type,
            color,
            tooltip: None,
        }
    }

    /// Attach a tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Whether `offset` falls inside the marker.
    pub fn contains(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.end_offset()
    }
}

impl Segment for TextMarker {
    fn offset(&self) -> usize {
        self.offset
    }

    fn length(&self) -> usize {
        self.length
    }

    fn set_range(&mut self, offset: usize, length: usize) {
        self.offset = offset;
        self.length = length;
    }
}

/// Markers of one document, kept sorted by offset.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<TextMarker>,
}

impl MarkerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker.
    pub fn add(&mut self, marker: TextMarker) {
        let pos = self.markers.partition_point(|m| m.offset <= marker.offset);
        self.markers.insert(pos, marker);
    }

    /// Remove every marker matching `predicate`. Returns how many were removed.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&TextMarker) -> bool) -> usize {
        let before = self.markers.len();
        self.markers.retain(|m| !predicate(m));
        before - self.markers.len()
    }

    /// Markers covering `offset`.
    pub fn markers_at(&self, offset: usize) -> Vec<&TextMarker> {
        self.markers.iter().filter(|m| m.contains(offset)).collect()
    }

    /// Markers overlapping `[start, end)`.
    pub fn markers_in_range(&self, start: usize, end: usize) -> Vec<&TextMarker> {
        self.markers
            .iter()
            .take_while(|m| m.offset < end)
            .filter(|m| m.end_offset() > start)
            .collect()
    }

    /// All markers.
    pub fn iter(&self) -> impl Iterator<Item = &TextMarker> {
        self.markers.iter()
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether there are no markers.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Remove all markers.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub(crate) fn apply_change(&mut self, change: &TextChange) {
        let removed = segments::reconcile(&mut self.markers, change);
        if removed > 0 {
            tracing::trace!(removed, "text markers dropped by edit");
        }
        self.markers.sort_by_key(|m| m.offset);
    }
}

/// A line bookmark.
///
/// Stored as a zero-length region at the start of its line; after each edit it
/// is snapped back to the start of whatever line it landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    offset: usize,
    line: usize,
    /// Disabled bookmarks are kept but skipped by navigation.
    pub is_enabled: bool,
}

impl Bookmark {
    /// Line the bookmark is on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Offset of the bookmarked line's start.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Segment for Bookmark {
    fn offset(&self) -> usize {
        self.offset
    }

    fn length(&self) -> usize {
        0
    }

    fn set_range(&mut self, offset: usize, _length: usize) {
        self.offset = offset;
    }
}

/// Bookmarks of one document, at most one per line, sorted by line.
#[derive(Debug, Clone, Default)]
pub struct BookmarkSet {
    bookmarks: Vec<Bookmark>,
}

impl BookmarkSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `line` carries a bookmark.
    pub fn contains_line(&self, line: usize) -> bool {
        self.bookmarks.binary_search_by_key(&line, |b| b.line).is_ok()
    }

    /// The bookmark on `line`, if any.
    pub fn get(&self, line: usize) -> Option<&Bookmark> {
        let idx = self.bookmarks.binary_search_by_key(&line, |b| b.line).ok()?;
        self.bookmarks.get(idx)
    }

    /// Enable or disable the bookmark on `line`. Returns `false` if there is none.
    pub fn set_enabled(&mut self, line: usize, enabled: bool) -> bool {
        match self.bookmarks.binary_search_by_key(&line, |b| b.line) {
            Ok(idx) => {
                self.bookmarks[idx].is_enabled = enabled;
                true
            }
            Err(_) => false,
        }
    }

    /// Add a bookmark on `line` starting at `line_offset`, or remove the existing one.
    ///
    /// Returns whether the line is bookmarked afterwards.
    pub fn toggle(&mut self, line: usize, line_offset: usize) -> bool {
        match self.bookmarks.binary_search_by_key(&line, |b| b.line) {
            Ok(idx) => {
                self.bookmarks.remove(idx);
                false
            }
            Err(idx) => {
                self.bookmarks.insert(
                    idx,
                    Bookmark {
                        offset: line_offset,
                        line,
                        is_enabled: true,
                    },
                );
                true
            }
        }
    }

    /// First enabled bookmark after `line`, wrapping around.
    pub fn next_after(&self, line: usize) -> Option<&Bookmark> {
        let enabled = || self.bookmarks.iter().filter(|b| b.is_enabled);
        enabled().find(|b| b.line > line).or_else(|| enabled().next())
    }

    /// Last enabled bookmark before `line`, wrapping around.
    pub fn previous_before(&self, line: usize) -> Option<&Bookmark> {
        let enabled = || self.bookmarks.iter().rev().filter(|b| b.is_enabled);
        enabled().find(|b| b.line < line).or_else(|| enabled().next())
    }

    /// All bookmarks.
    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.bookmarks.iter()
    }

    /// Number of bookmarks.
    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    /// Whether there are no bookmarks.
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Remove all bookmarks.
    pub fn clear(&mut self) {
        self.bookmarks.clear();
    }

    /// Reconcile with `change`, then snap each bookmark to its line start.
    ///
    /// `locate` maps an offset to `(line, line_start_offset)` in the new text.
    /// Bookmarks collapsing onto the same line are merged.
    pub(crate) fn apply_change(
        &mut self,
        change: &TextChange,
        mut locate: impl FnMut(usize) -> (usize, usize),
    ) {
        segments::reconcile(&mut self.bookmarks, change);
        for bookmark in &mut self.bookmarks {
            let (line, start) = locate(bookmark.offset);
            bookmark.line = line;
            bookmark.offset = start;
        }
        self.bookmarks.sort_by_key(|b| b.line);
        self.bookmarks.dedup_by_key(|b| b.line);
    }
}
