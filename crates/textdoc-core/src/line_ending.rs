//! Line delimiter helpers.
//!
//! A line ends with `"\n"`, `"\r\n"` or a lone `'\r'`; only the last line of a
//! document has no delimiter.

/// The delimiter terminating a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDelimiter {
    /// Last line of the document.
    None,
    /// Unix-style LF (`'\n'`).
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    CrLf,
    /// Classic Mac CR (`'\r'`).
    Cr,
}

impl LineDelimiter {
    /// Number of characters the delimiter occupies.
    pub fn len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Lf | Self::Cr => 1,
            Self::CrLf => 2,
        }
    }

    /// Whether this is [`LineDelimiter::None`].
    pub fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// The delimiter text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Detect the dominant delimiter of a text: CRLF if present, else CR, else LF.
    pub fn detect_in_text(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::CrLf
        } else if text.contains('\r') {
            Self::Cr
        } else {
            Self::Lf
        }
    }
}

/// Length of one scanned line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// Content plus delimiter.
    pub total_length: usize,
    /// The terminating delimiter.
    pub delimiter: LineDelimiter,
}

impl LineSpan {
    /// Content length without the delimiter.
    pub fn content_length(&self) -> usize {
        self.total_length - self.delimiter.len()
    }
}

/// Split `chars` into lines.
///
/// Always returns at least one span; the last span carries
/// [`LineDelimiter::None`] and may be empty.
pub fn scan_lines(chars: &[char]) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < chars.len() {
        let delimiter = match chars[i] {
            '\n' => LineDelimiter::Lf,
            '\r' if chars.get(i + 1) == Some(&'\n') => LineDelimiter::CrLf,
            '\r' => LineDelimiter::Cr,
            _ => {
                i += 1;
                continue;
            }
        };
        i += delimiter.len();
        spans.push(LineSpan {
            total_length: i - start,
            delimiter,
        });
        start = i;
    }
    spans.push(LineSpan {
        total_length: chars.len() - start,
        delimiter: LineDelimiter::None,
    });
    spans
}
