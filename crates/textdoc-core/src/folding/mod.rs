//! Code folding.
//!
//! [`FoldIndex`] holds the fold regions of a document sorted by start offset,
//! with a secondary index sorted by end offset. Regions come from a
//! [`FoldingStrategy`] (or any external scanner) through
//! [`FoldIndex::update_foldings`], which keeps the folded/unfolded state of
//! every region that survives a re-scan at the same position.

mod strategy;

use std::cell::OnceCell;

use crate::change::TextChange;
use crate::line_index::TextPosition;
use crate::segments::{self, Segment};

pub use strategy::{BraceFoldingStrategy, FoldingStrategy, IndentFoldingStrategy};

/// Kind of a fold region, for hosts that fold by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldType {
    /// No particular kind.
    #[default]
    Unspecified,
    /// Body of a method or function.
    MemberBody,
    /// An explicit `#region`-style block.
    Region,
    /// Body of a type declaration.
    TypeBody,
}

/// One fold region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldMarker {
    offset: usize,
    length: usize,
    start: TextPosition,
    end: TextPosition,
    /// Whether the region is collapsed.
    pub is_folded: bool,
    /// Label shown in place of the folded text. Empty means the index default.
    pub fold_text: String,
    /// Region kind.
    pub fold_type: FoldType,
}

impl FoldMarker {
    /// Create an unfolded region over `[offset, offset + length)`.
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            start: TextPosition::default(),
            end: TextPosition::default(),
            is_folded: false,
            fold_text: String::new(),
            fold_type: FoldType::Unspecified,
        }
    }

    /// Set the label.
    pub fn with_fold_text(mut self, text: impl Into<String>) -> Self {
        self.fold_text = text.into();
        self
    }

    /// Set the kind.
    pub fn with_type(mut self, fold_type: FoldType) -> Self {
        self.fold_type = fold_type;
        self
    }

    /// Set the initial folded state. Only used when no earlier region matches.
    pub fn folded(mut self, is_folded: bool) -> Self {
        self.is_folded = is_folded;
        self
    }

    /// Start offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in characters.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Exclusive end offset.
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Start line.
    pub fn start_line(&self) -> usize {
        self.start.line
    }

    /// Column of the first folded character.
    pub fn start_column(&self) -> usize {
        self.start.column
    }

    /// End line.
    pub fn end_line(&self) -> usize {
        self.end.line
    }

    /// Column just past the folded text.
    pub fn end_column(&self) -> usize {
        self.end.column
    }

    fn key(&self) -> (TextPosition, TextPosition) {
        (self.start, self.end)
    }

    fn contains_range(&self, other: &FoldMarker) -> bool {
        self.offset <= other.offset && other.end_offset() <= self.end_offset()
    }
}

impl Segment for FoldMarker {
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

/// Sorted fold regions of one document.
#[derive(Debug, Clone)]
pub struct FoldIndex {
    /// Sorted by `(offset, end_offset)`.
    by_start: Vec<FoldMarker>,
    /// Indices into `by_start`, sorted by `end_offset`.
    by_end: Vec<usize>,
    /// Indices of folded regions with no folded ancestor.
    top_level: OnceCell<Vec<usize>>,
    default_fold_text: String,
}

impl FoldIndex {
    /// Create an empty index using `default_fold_text` for unlabeled regions.
    pub fn new(default_fold_text: impl Into<String>) -> Self {
        Self {
            by_start: Vec::new(),
            by_end: Vec::new(),
            top_level: OnceCell::new(),
            default_fold_text: default_fold_text.into(),
        }
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    /// Whether there are no regions.
    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    /// All regions in start order.
    pub fn markers(&self) -> &[FoldMarker] {
        &self.by_start
    }

    /// Regions in end-offset order.
    pub fn markers_by_end(&self) -> impl Iterator<Item = &FoldMarker> {
        self.by_end.iter().map(|&i| &self.by_start[i])
    }

    /// Replace the regions with a freshly scanned set.
    ///
    /// A new region whose (start line, start column, end line, end column)
    /// equals an existing region's takes over that region's folded state;
    /// every other new region keeps the state it was created with.
    /// `position_of` maps offsets of the current text to positions.
    pub fn update_foldings(
        &mut self,
        mut regions: Vec<FoldMarker>,
        position_of: impl Fn(usize) -> TextPosition,
    ) -> &[FoldMarker] {
        for region in &mut regions {
            region.start = position_of(region.offset);
            region.end = position_of(region.end_offset());
            if region.fold_text.is_empty() {
                region.fold_text.clone_from(&self.default_fold_text);
            }
        }
        regions.sort_by_key(|r| (r.offset, r.end_offset()));

        let mut kept = 0usize;
        let mut old = self.by_start.iter().peekable();
        for region in &mut regions {
            while old.next_if(|o| o.key() < region.key()).is_some() {}
            if let Some(previous) = old.peek()
                && previous.key() == region.key()
            {
                region.is_folded = previous.is_folded;
                kept += 1;
                old.next();
            }
        }

        tracing::debug!(
            regions = regions.len(),
            matched = kept,
            "fold regions reconciled"
        );
        self.by_start = regions;
        self.rebuild();
        &self.by_start
    }

    /// Move the regions along with a text change and refresh their positions.
    pub fn apply_change(
        &mut self,
        change: &TextChange,
        position_of: impl Fn(usize) -> TextPosition,
    ) {
        if self.by_start.is_empty() {
            return;
        }
        segments::reconcile(&mut self.by_start, change);
        for region in &mut self.by_start {
            region.start = position_of(region.offset);
            region.end = position_of(region.end_offset());
        }
        self.by_start.sort_by_key(|r| (r.offset, r.end_offset()));
        self.rebuild();
    }

    /// Remove all regions.
    pub fn clear(&mut self) {
        self.by_start.clear();
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.by_end = (0..self.by_start.len()).collect();
        self.by_end
            .sort_by_key(|&i| (self.by_start[i].end_offset(), self.by_start[i].offset));
        self.top_level = OnceCell::new();
    }

    /// Regions that start or end on `line`.
    pub fn folds_at_line(&self, line: usize) -> Vec<&FoldMarker> {
        let mut found: Vec<&FoldMarker> = self.folds_starting_at_line(line);
        let first = self
            .by_end
            .partition_point(|&i| self.by_start[i].end_line() < line);
        for &i in &self.by_end[first..] {
            let marker = &self.by_start[i];
            if marker.end_line() != line {
                break;
            }
            if marker.start_line() != line {
                found.push(marker);
            }
        }
        found
    }

    /// Regions whose first line is `line`, outermost first.
    pub fn folds_starting_at_line(&self, line: usize) -> Vec<&FoldMarker> {
        let first = self.by_start.partition_point(|m| m.start_line() < line);
        let mut found: Vec<&FoldMarker> = self.by_start[first..]
            .iter()
            .take_while(|m| m.start_line() == line)
            .collect();
        found.sort_by_key(|m| std::cmp::Reverse(m.end_offset()));
        found
    }

    /// Regions whose line range `start_line..=end_line` includes `line`.
    pub fn folds_containing_line(&self, line: usize) -> Vec<&FoldMarker> {
        self.by_start
            .iter()
            .take_while(|m| m.start_line() <= line)
            .filter(|m| m.end_line() >= line)
            .collect()
    }

    /// Folded regions not nested in another folded region, in start order.
    pub fn top_level_folded_regions(&self) -> Vec<&FoldMarker> {
        self.top_level_indices()
            .iter()
            .map(|&i| &self.by_start[i])
            .collect()
    }

    fn top_level_indices(&self) -> &[usize] {
        self.top_level.get_or_init(|| {
            let mut order: Vec<usize> = (0..self.by_start.len())
                .filter(|&i| self.by_start[i].is_folded)
                .collect();
            order.sort_by_key(|&i| {
                let m = &self.by_start[i];
                (m.offset, std::cmp::Reverse(m.end_offset()))
            });
            let mut top: Vec<usize> = Vec::new();
            for i in order {
                let nested = top
                    .last()
                    .is_some_and(|&t| self.by_start[t].contains_range(&self.by_start[i]));
                if !nested {
                    top.push(i);
                }
            }
            top.sort_unstable();
            top
        })
    }

    /// Whether `line` is shown, i.e. not hidden inside a folded region.
    ///
    /// The first line of a folded region stays visible.
    pub fn is_line_visible(&self, line: usize) -> bool {
        !self
            .top_level_indices()
            .iter()
            .map(|&i| &self.by_start[i])
            .any(|m| m.start_line() < line && line <= m.end_line())
    }

    /// Toggle the innermost region starting on `line`. Returns `false` if there is none.
    pub fn toggle_fold_at_line(&mut self, line: usize) -> bool {
        let first = self.by_start.partition_point(|m| m.start_line() < line);
        let innermost = self.by_start[first..]
            .iter()
            .enumerate()
            .take_while(|(_, m)| m.start_line() == line)
            .min_by_key(|(_, m)| (m.end_offset() - m.offset, std::cmp::Reverse(m.offset)))
            .map(|(i, _)| first + i);
        let Some(idx) = innermost else {
            return false;
        };
        self.by_start[idx].is_folded = !self.by_start[idx].is_folded;
        self.top_level = OnceCell::new();
        true
    }

    /// Fold every region.
    pub fn fold_all(&mut self) {
        self.set_all(true);
    }

    /// Unfold every region.
    pub fn unfold_all(&mut self) {
        self.set_all(false);
    }

    fn set_all(&mut self, folded: bool) {
        for marker in &mut self.by_start {
            marker.is_folded = folded;
        }
        self.top_level = OnceCell::new();
    }

    /// Hidden line ranges (`first_hidden..=last_hidden`), merged and in order.
    fn hidden_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for &i in self.top_level_indices() {
            let m = &self.by_start[i];
            if m.end_line() <= m.start_line() {
                continue;
            }
            let (first, last) = (m.start_line() + 1, m.end_line());
            match ranges.last_mut() {
                Some(prev) if first <= prev.1 + 1 => prev.1 = prev.1.max(last),
                _ => ranges.push((first, last)),
            }
        }
        ranges
    }

    /// Visual row of logical `line`, or `None` when the line is hidden.
    pub fn logical_to_visual_line(&self, line: usize) -> Option<usize> {
        let mut hidden = 0usize;
        for (first, last) in self.hidden_ranges() {
            if line < first {
                break;
            }
            if line <= last {
                return None;
            }
            hidden += last - first + 1;
        }
        Some(line - hidden)
    }

    /// Logical line shown at visual row `row`.
    pub fn visual_to_logical_line(&self, row: usize) -> usize {
        let mut line = row;
        for (first, last) in self.hidden_ranges() {
            if line < first {
                break;
            }
            line += last - first + 1;
        }
        line
    }
}

impl Default for FoldIndex {
    fn default() -> Self {
        Self::new("...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lines of 10 characters each (9 + '\n').
    fn position_of(offset: usize) -> TextPosition {
        TextPosition::new(offset / 10, offset % 10)
    }

    fn region(start: usize, end: usize) -> FoldMarker {
        FoldMarker::new(start, end - start)
    }

    #[test]
    fn test_update_copies_folded_state_by_position() {
        let mut index = FoldIndex::default();
        index.update_foldings(vec![region(5, 35), region(12, 22)], position_of);
        assert!(index.toggle_fold_at_line(0));
        assert!(index.markers()[0].is_folded);

        // Fresh objects, same positions: the folded flag carries over.
        let updated = index.update_foldings(
            vec![region(12, 22), region(5, 35), region(41, 59).folded(true)],
            position_of,
        );
        let folded: Vec<_> = updated.iter().map(|m| m.is_folded).collect();
        assert_eq!(folded, vec![true, false, true]);
        assert_eq!(updated[0].fold_text, "...");
    }

    #[test]
    fn test_update_drops_state_of_moved_region() {
        let mut index = FoldIndex::default();
        index.update_foldings(vec![region(5, 35).folded(true)], position_of);
        let updated = index.update_foldings(vec![region(6, 35)], position_of);
        assert!(!updated[0].is_folded);
    }

    #[test]
    fn test_line_queries() {
        let mut index = FoldIndex::default();
        index.update_foldings(
            vec![region(5, 45), region(15, 25), region(12, 38), region(51, 75)],
            position_of,
        );
        let starting: Vec<_> = index
            .folds_starting_at_line(1)
            .iter()
            .map(|m| m.offset())
            .collect();
        assert_eq!(starting, vec![12, 15]);
        assert_eq!(index.folds_at_line(4).len(), 1);
        assert_eq!(index.folds_at_line(2).len(), 1);
        assert_eq!(index.folds_containing_line(3).len(), 2);
        assert_eq!(index.markers_by_end().next().map(FoldMarker::offset), Some(15));
    }

    #[test]
    fn test_top_level_and_visibility() {
        let mut index = FoldIndex::default();
        index.update_foldings(
            vec![
                region(5, 45).folded(true),
                region(15, 25).folded(true),
                region(51, 75).folded(true),
            ],
            position_of,
        );
        let top: Vec<_> = index
            .top_level_folded_regions()
            .iter()
            .map(|m| m.offset())
            .collect();
        assert_eq!(top, vec![5, 51]);

        assert!(index.is_line_visible(0));
        assert!(!index.is_line_visible(1));
        assert!(!index.is_line_visible(4));
        assert!(index.is_line_visible(5));
        assert!(!index.is_line_visible(7));
        assert!(index.is_line_visible(8));

        assert_eq!(index.logical_to_visual_line(0), Some(0));
        assert_eq!(index.logical_to_visual_line(3), None);
        assert_eq!(index.logical_to_visual_line(5), Some(1));
        assert_eq!(index.logical_to_visual_line(8), Some(2));
        assert_eq!(index.visual_to_logical_line(2), 8);
    }

    #[test]
    fn test_toggle_prefers_innermost() {
        let mut index = FoldIndex::default();
        index.update_foldings(vec![region(5, 45), region(7, 25)], position_of);
        index.toggle_fold_at_line(0);
        let folded: Vec<_> = index.markers().iter().map(|m| m.is_folded).collect();
        assert_eq!(folded, vec![false, true]);
        assert!(!index.toggle_fold_at_line(9));
    }

    #[test]
    fn test_fold_all_invalidates_cache() {
        let mut index = FoldIndex::default();
        index.update_foldings(vec![region(5, 45), region(51, 75)], position_of);
        assert!(index.top_level_folded_regions().is_empty());
        index.fold_all();
        assert_eq!(index.top_level_folded_regions().len(), 2);
        index.unfold_all();
        assert!(index.is_line_visible(3));
    }

    #[test]
    fn test_apply_change_moves_regions() {
        let mut index = FoldIndex::default();
        index.update_foldings(vec![region(15, 35).folded(true)], position_of);
        index.apply_change(&TextChange::new(0, "", "0123456789"), position_of);
        let marker = &index.markers()[0];
        assert_eq!((marker.start_line(), marker.start_column()), (2, 5));
        assert_eq!(marker.end_line(), 4);
        assert!(marker.is_folded);

        index.apply_change(&TextChange::new(20, &"x".repeat(30), ""), position_of);
        assert!(index.is_empty());
    }
}
