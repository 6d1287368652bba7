use thiserror::Error;

/// Result alias used throughout `textdoc-core`.
pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors surfaced by the document engine.
///
/// Bounds errors are never clamped silently; the only clamping policy is
/// [`Document::position_to_offset`](crate::Document::position_to_offset).
pub enum DocumentError {
    #[error("offset {offset} is out of range (document length {len})")]
    /// An offset outside `[0, len]`.
    OffsetOutOfRange {
        /// The requested offset.
        offset: usize,
        /// Current length.
        len: usize,
    },

    #[error("range {offset}..{offset}+{length} is out of bounds (document length {len})")]
    /// A range whose end lies past the end of the text.
    RangeOutOfBounds {
        /// Range start.
        offset: usize,
        /// Range length.
        length: usize,
        /// Current length.
        len: usize,
    },

    #[error("line {line} is out of range (line count {count})")]
    /// A line number outside `[0, line_count)`.
    LineOutOfRange {
        /// The requested line.
        line: usize,
        /// Current line count.
        count: usize,
    },

    #[error("anchor has been deleted")]
    /// The anchor's character range was removed from the document.
    AnchorDeleted,

    #[error("unknown anchor")]
    /// The anchor handle does not belong to this document, or was released.
    UnknownAnchor,

    #[error("line has been removed from the document")]
    /// A detached line record was queried for its offset or number.
    LineDeleted,

    #[error("document used from a thread other than its owner")]
    /// Debug-build ownership check failed.
    WrongThread,
}
