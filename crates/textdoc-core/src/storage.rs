//! Linear storage layer.
//!
//! A gap buffer over `char`s: one movable unused region absorbs edits near the
//! previous edit point in amortized O(1). Offsets are Unicode scalar values.
//!
//! ```text
//!  [ text-before-gap | gap | text-after-gap ]
//!    0..gap_start            gap_end..capacity
//! ```

use crate::error::{DocumentError, Result};
use crate::options::GapBufferOptions;

const GAP_FILL: char = '\0';

/// Gap buffer character store.
///
/// Invariant: `len() == capacity() - gap_size()`. Not meant to be shared
/// between threads; the owning [`Document`](crate::Document) confines it.
#[derive(Debug, Clone)]
pub struct GapBuffer {
    buffer: Vec<char>,
    gap_start: usize,
    gap_end: usize,
    options: GapBufferOptions,
}

impl GapBuffer {
    /// Create an empty buffer.
    pub fn new(options: GapBufferOptions) -> Self {
        Self {
            buffer: Vec::new(),
            gap_start: 0,
            gap_end: 0,
            options,
        }
    }

    /// Create a buffer holding `text`, with the gap at the end.
    pub fn from_text(text: &str, options: GapBufferOptions) -> Self {
        let mut buffer = Self::new(options);
        buffer.set_content(text);
        buffer
    }

    /// Number of characters stored.
    pub fn len(&self) -> usize {
        self.buffer.len() - self.gap_size()
    }

    /// Whether the buffer holds no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated slots, text plus gap.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current gap size.
    pub fn gap_size(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Sizing policy in use.
    pub fn options(&self) -> GapBufferOptions {
        self.options
    }

    /// Character at `offset`.
    pub fn char_at(&self, offset: usize) -> Result<char> {
        if offset >= self.len() {
            return Err(DocumentError::OffsetOutOfRange {
                offset,
                len: self.len(),
            });
        }
        let physical = if offset < self.gap_start {
            offset
        } else {
            offset + self.gap_size()
        };
        Ok(self.buffer[physical])
    }

    /// Text of `[offset, offset + length)`.
    pub fn text(&self, offset: usize, length: usize) -> Result<String> {
        let (head, tail) = self.slices(offset, length)?;
        let mut out = String::with_capacity(length);
        out.extend(head.iter().chain(tail));
        Ok(out)
    }

    /// Characters of `[offset, offset + length)`.
    pub fn chars(&self, offset: usize, length: usize) -> Result<Vec<char>> {
        let (head, tail) = self.slices(offset, length)?;
        let mut out = Vec::with_capacity(length);
        out.extend_from_slice(head);
        out.extend_from_slice(tail);
        Ok(out)
    }

    /// The whole text.
    pub fn to_text(&self) -> String {
        self.buffer[..self.gap_start]
            .iter()
            .chain(&self.buffer[self.gap_end..])
            .collect()
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.replace(offset, 0, text)
    }

    /// Remove `length` characters starting at `offset`.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<()> {
        self.replace(offset, length, "")
    }

    /// Replace `[offset, offset + length)` with `text`.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        self.check_range(offset, length)?;

        let inserted: Vec<char> = text.chars().collect();
        let required = inserted.len().saturating_sub(length);
        self.place_gap(offset, required);

        self.gap_end += length;
        self.buffer[self.gap_start..self.gap_start + inserted.len()].copy_from_slice(&inserted);
        self.gap_start += inserted.len();

        if self.gap_size() > self.options.max_gap {
            self.make_new_buffer(self.gap_start, self.options.min_gap);
        }
        Ok(())
    }

    /// Replace the whole content, dropping the old allocation.
    pub fn set_content(&mut self, text: &str) {
        let mut buffer: Vec<char> = text.chars().collect();
        let len = buffer.len();
        buffer.resize(len + self.options.min_gap, GAP_FILL);
        self.buffer = buffer;
        self.gap_start = len;
        self.gap_end = self.buffer.len();
    }

    fn check_range(&self, offset: usize, length: usize) -> Result<()> {
        let len = self.len();
        if offset > len {
            return Err(DocumentError::OffsetOutOfRange { offset, len });
        }
        if length > len - offset {
            return Err(DocumentError::RangeOutOfBounds {
                offset,
                length,
                len,
            });
        }
        Ok(())
    }

    /// Physical slices covering the logical range, before and after the gap.
    fn slices(&self, offset: usize, length: usize) -> Result<(&[char], &[char])> {
        self.check_range(offset, length)?;
        let end = offset + length;
        let gap = self.gap_size();
        if end <= self.gap_start {
            Ok((&self.buffer[offset..end], &[]))
        } else if offset >= self.gap_start {
            Ok((&self.buffer[offset + gap..end + gap], &[]))
        } else {
            Ok((
                &self.buffer[offset..self.gap_start],
                &self.buffer[self.gap_end..end + gap],
            ))
        }
    }

    /// Move the gap to `offset`, making sure it holds at least `required` slots.
    fn place_gap(&mut self, offset: usize, required: usize) {
        if self.gap_size() < required {
            self.make_new_buffer(offset, required);
            return;
        }

        if offset < self.gap_start {
            let moved = self.gap_start - offset;
            self.buffer
                .copy_within(offset..self.gap_start, self.gap_end - moved);
            self.gap_start = offset;
            self.gap_end -= moved;
        } else if offset > self.gap_start {
            let moved = offset - self.gap_start;
            self.buffer
                .copy_within(self.gap_end..self.gap_end + moved, self.gap_start);
            self.gap_start = offset;
            self.gap_end += moved;
        }
    }

    fn make_new_buffer(&mut self, gap_offset: usize, gap_len: usize) {
        let gap_len = gap_len.max(self.options.min_gap);
        let len = self.len();

        let mut buffer = Vec::with_capacity(len + gap_len);
        let (head, tail) = self.logical_split(gap_offset);
        buffer.extend_from_slice(head.0);
        buffer.extend_from_slice(head.1);
        buffer.resize(buffer.len() + gap_len, GAP_FILL);
        buffer.extend_from_slice(tail.0);
        buffer.extend_from_slice(tail.1);

        tracing::debug!(len, gap_offset, gap_len, "gap buffer reallocated");

        self.buffer = buffer;
        self.gap_start = gap_offset;
        self.gap_end = gap_offset + gap_len;
    }

    /// Logical text split at `at`, each side given as up to two physical slices.
    #[allow(clippy::type_complexity)]
    fn logical_split(&self, at: usize) -> ((&[char], &[char]), (&[char], &[char])) {
        let before = &self.buffer[..self.gap_start];
        let after = &self.buffer[self.gap_end..];
        if at <= self.gap_start {
            ((&before[..at], &[]), (&before[at..], after))
        } else {
            let split = at - self.gap_start;
            ((before, &after[..split]), (&after[split..], &[]))
        }
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new(GapBufferOptions::default())
    }
}
