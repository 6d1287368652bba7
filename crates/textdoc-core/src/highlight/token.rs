use super::color::HighlightColor;

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// Anything that is not whitespace.
    Word,
    /// A single space.
    Space,
    /// A single tab.
    Tab,
}

/// One colored token of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWord {
    /// Column of the first character.
    pub column: usize,
    /// Length in characters.
    pub length: usize,
    /// Assigned color.
    pub color: HighlightColor,
    /// Token kind.
    pub kind: WordKind,
}

impl TextWord {
    /// Column just past the token.
    pub fn end_column(&self) -> usize {
        self.column + self.length
    }

    /// Whether this is a space or tab.
    pub fn is_whitespace(&self) -> bool {
        !matches!(self.kind, WordKind::Word)
    }
}
