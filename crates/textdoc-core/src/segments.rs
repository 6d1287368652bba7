//! Offset/length regions that follow text changes.
//!
//! One reconciliation routine is shared by folds, text markers and bookmarks.
//! A replace is treated as a deletion of `[offset, offset + removed)` followed
//! by an insertion of `inserted` characters at `offset`:
//!
//! - deletion: regions fully inside the removed range disappear, regions
//!   overlapping one boundary are clipped to the part that survives, regions
//!   spanning the whole range shrink, regions after it move left;
//! - insertion: regions starting at or after `offset` move right, regions
//!   strictly containing `offset` grow.
//!
//! A region ending exactly at `offset` never grows, and a zero-length region
//! at `offset` survives and moves with the inserted text.

use crate::change::TextChange;

/// A region tracked in character offsets.
pub trait Segment {
    /// Start offset.
    fn offset(&self) -> usize;
    /// Length in characters.
    fn length(&self) -> usize;
    /// Store the reconciled range.
    fn set_range(&mut self, offset: usize, length: usize);

    /// Exclusive end offset.
    fn end_offset(&self) -> usize {
        self.offset() + self.length()
    }
}

/// Adjust `[start, end)` for `change`. `None` means the region was deleted.
pub fn adjust_range(start: usize, end: usize, change: &TextChange) -> Option<(usize, usize)> {
    let (mut start, mut end) = (start, end);
    let edit_start = change.offset;
    let edit_end = change.removed_end();
    let removed = change.removed_len();

    if removed > 0 && end > edit_start {
        if start >= edit_end {
            start -= removed;
            end -= removed;
        } else if start >= edit_start && end <= edit_end {
            return None;
        } else if start < edit_start && end > edit_end {
            end -= removed;
        } else if start < edit_start {
            end = edit_start;
        } else {
            start = edit_start;
            end -= removed;
        }
    }

    let inserted = change.inserted_len();
    if inserted > 0 {
        if start >= edit_start {
            start += inserted;
            end += inserted;
        } else if end > edit_start {
            end += inserted;
        }
    }
    Some((start, end))
}

/// Apply `change` to every segment, dropping the ones it deletes.
///
/// Returns the number of removed segments. Relative order is preserved.
pub fn reconcile<T: Segment>(segments: &mut Vec<T>, change: &TextChange) -> usize {
    if change.is_empty() {
        return 0;
    }
    let before = segments.len();
    segments.retain_mut(|segment| {
        match adjust_range(segment.offset(), segment.end_offset(), change) {
            Some((start, end)) => {
                segment.set_range(start, end - start);
                true
            }
            None => false,
        }
    });
    before - segments.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Region {
        offset: usize,
        length: usize,
    }

    impl Segment for Region {
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

    fn region(start: usize, end: usize) -> Region {
        Region {
            offset: start,
            length: end - start,
        }
    }

    fn ranges(segments: &[Region]) -> Vec<(usize, usize)> {
        segments.iter().map(|r| (r.offset, r.end_offset())).collect()
    }

    #[test]
    fn test_insertion_shifts_and_grows() {
        let mut segments = vec![region(0, 5), region(2, 8), region(5, 9), region(5, 5)];
        reconcile(&mut segments, &TextChange::new(5, "", "xyz"));
        assert_eq!(ranges(&segments), vec![(0, 5), (2, 11), (8, 12), (8, 8)]);
    }

    #[test]
    fn test_deletion_removes_and_clips() {
        let mut segments = vec![
            region(0, 20), // spans the removal
            region(5, 8),  // equals the removal
            region(6, 7),  // inside
            region(2, 6),  // end inside
            region(7, 12), // start inside
            region(8, 10), // after
        ];
        let removed = reconcile(&mut segments, &TextChange::new(5, "abc", ""));
        assert_eq!(removed, 2);
        assert_eq!(ranges(&segments), vec![(0, 17), (2, 5), (5, 9), (5, 7)]);
    }

    #[test]
    fn test_replace_containing_region_changes_by_delta() {
        let mut segments = vec![region(0, 10), region(12, 14)];
        reconcile(&mut segments, &TextChange::new(4, "ab", "12345"));
        assert_eq!(ranges(&segments), vec![(0, 13), (15, 17)]);
    }

    #[test]
    fn test_replace_start_inside_moves_past_new_text() {
        let mut segments = vec![region(6, 12)];
        reconcile(&mut segments, &TextChange::new(4, "abcd", "xy"));
        // Deletion clips to [4, 8); the insertion at 4 shifts it by 2.
        assert_eq!(ranges(&segments), vec![(6, 10)]);
    }

    #[test]
    fn test_zero_length_region_inside_removal_is_deleted() {
        let mut segments = vec![region(6, 6), region(5, 5), region(8, 8)];
        reconcile(&mut segments, &TextChange::new(5, "abc", ""));
        assert_eq!(ranges(&segments), vec![(5, 5), (5, 5)]);
    }
}
