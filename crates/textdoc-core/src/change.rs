//! Structured text changes and document events.
//!
//! Every mutation of a [`Document`](crate::Document) is described by one
//! [`TextChange`] expressed in character offsets (Unicode scalar values).
//! Observers receive it twice: once before the buffer is touched and once
//! after every derived structure is consistent again.

/// A single replace operation: `removed_text` at `offset` was replaced by `inserted_text`.
///
/// Inserts and removes are the special cases with an empty `removed_text` or
/// `inserted_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// Start character offset of the change.
    pub offset: usize,
    /// Exact removed text (may be empty).
    pub removed_text: String,
    /// Exact inserted text (may be empty).
    pub inserted_text: String,
    removed_len: usize,
    inserted_len: usize,
}

impl TextChange {
    /// Build a change record.
    pub fn new(offset: usize, removed_text: impl Into<String>, inserted_text: impl Into<String>) -> Self {
        let removed_text = removed_text.into();
        let inserted_text = inserted_text.into();
        Self {
            offset,
            removed_len: removed_text.chars().count(),
            inserted_len: inserted_text.chars().count(),
            removed_text,
            inserted_text,
        }
    }

    /// Length of `removed_text` in characters.
    pub fn removed_len(&self) -> usize {
        self.removed_len
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_len
    }

    /// Exclusive end of the removed range in the pre-change document.
    pub fn removed_end(&self) -> usize {
        self.offset + self.removed_len
    }

    /// Exclusive end of the inserted range in the post-change document.
    pub fn inserted_end(&self) -> usize {
        self.offset + self.inserted_len
    }

    /// Signed length difference (`inserted - removed`).
    pub fn delta(&self) -> isize {
        self.inserted_len as isize - self.removed_len as isize
    }

    /// Whether the change leaves the text untouched.
    pub fn is_empty(&self) -> bool {
        self.removed_len == 0 && self.inserted_len == 0
    }

    /// The change that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            offset: self.offset,
            removed_text: self.inserted_text.clone(),
            inserted_text: self.removed_text.clone(),
            removed_len: self.inserted_len,
            inserted_len: self.removed_len,
        }
    }

    /// Map a pre-change offset to the post-change document.
    ///
    /// Offsets inside the removed range collapse to `offset`. An offset equal to
    /// `offset` stays before the inserted text.
    pub fn map_offset(&self, position: usize) -> usize {
        if position <= self.offset {
            position
        } else if position < self.removed_end() {
            self.offset
        } else {
            position - self.removed_len + self.inserted_len
        }
    }
}

/// Notification sent to [`Document`](crate::Document) subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The change is about to be applied; the document still shows the old text.
    BeforeChange(TextChange),
    /// The change has been applied and every derived structure is up to date.
    Changed(TextChange),
}

impl DocumentEvent {
    /// The change this event is about.
    pub fn change(&self) -> &TextChange {
        match self {
            Self::BeforeChange(change) | Self::Changed(change) => change,
        }
    }
}

/// Document event callback type.
pub type DocumentEventCallback = Box<dyn FnMut(&DocumentEvent) + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_are_in_chars() {
        let change = TextChange::new(3, "你好", "a");
        assert_eq!(change.removed_len(), 2);
        assert_eq!(change.inserted_len(), 1);
        assert_eq!(change.removed_end(), 5);
        assert_eq!(change.inserted_end(), 4);
        assert_eq!(change.delta(), -1);
    }

    #[test]
    fn test_inverse_swaps_texts() {
        let change = TextChange::new(0, "old", "brand new");
        let inverse = change.inverse();
        assert_eq!(inverse.removed_text, "brand new");
        assert_eq!(inverse.inserted_text, "old");
        assert_eq!(inverse.inverse(), change);
    }

    #[test]
    fn test_map_offset() {
        let change = TextChange::new(5, "abc", "xy");
        assert_eq!(change.map_offset(2), 2);
        assert_eq!(change.map_offset(5), 5);
        assert_eq!(change.map_offset(6), 5);
        assert_eq!(change.map_offset(8), 7);
        assert_eq!(change.map_offset(20), 19);
    }
}
