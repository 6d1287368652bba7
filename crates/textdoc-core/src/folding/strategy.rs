//! Built-in fold region scanners.

use crate::Document;

use super::FoldMarker;

/// Produces fold regions for a document.
///
/// Implementations should not mutate the document; the caller passes the
/// result to [`Document::update_foldings`](crate::Document::update_foldings),
/// which keeps the folded state of regions that did not move.
pub trait FoldingStrategy {
    /// Scan `document` and return its fold regions in any order.
    fn generate_foldings(&mut self, document: &Document) -> Vec<FoldMarker>;
}

/// Folds matching brace pairs that span more than one line.
#[derive(Debug, Clone)]
pub struct BraceFoldingStrategy {
    /// Opening brace.
    pub opening: char,
    /// Closing brace.
    pub closing: char,
}

impl Default for BraceFoldingStrategy {
    fn default() -> Self {
        Self {
            opening: '{',
            closing: '}',
        }
    }
}

impl FoldingStrategy for BraceFoldingStrategy {
    fn generate_foldings(&mut self, document: &Document) -> Vec<FoldMarker> {
        let mut regions = Vec::new();
        let mut open: Vec<(usize, usize)> = Vec::new();

        for number in 0..document.line_count() {
            let (Ok(info), Ok(text)) = (document.line(number), document.line_text(number)) else {
                continue;
            };
            for (column, ch) in text.chars().enumerate() {
                let offset = info.offset + column;
                if ch == self.opening {
                    open.push((offset, number));
                } else if ch == self.closing
                    && let Some((start, start_line)) = open.pop()
                    && start_line < number
                {
                    regions.push(FoldMarker::new(start, offset + 1 - start));
                }
            }
        }
        regions
    }
}

/// Folds blocks of lines indented deeper than the line introducing them.
///
/// A region starts at the end of the header line and ends at the end of the
/// last non-blank line of the block, so the header stays visible.
#[derive(Debug, Clone)]
pub struct IndentFoldingStrategy {
    /// Columns a tab advances to.
    pub tab_size: usize,
}

impl Default for IndentFoldingStrategy {
    fn default() -> Self {
        Self { tab_size: 4 }
    }
}

impl IndentFoldingStrategy {
    fn indent_of(&self, text: &str) -> Option<usize> {
        let mut width = 0usize;
        for ch in text.chars() {
            match ch {
                ' ' => width += 1,
                '\t' => width += self.tab_size - width % self.tab_size.max(1),
                _ => return Some(width),
            }
        }
        None
    }
}

impl FoldingStrategy for IndentFoldingStrategy {
    fn generate_foldings(&mut self, document: &Document) -> Vec<FoldMarker> {
        let mut regions = Vec::new();
        // (indent, header line end offset, header line)
        let mut stack: Vec<(usize, usize, usize)> = Vec::new();
        let mut last_content: Option<(usize, usize)> = None;

        let close = |regions: &mut Vec<FoldMarker>,
                     header: (usize, usize, usize),
                     last: Option<(usize, usize)>| {
            if let Some((last_line, last_end)) = last
                && last_line > header.2
            {
                regions.push(FoldMarker::new(header.1, last_end - header.1));
            }
        };

        for number in 0..document.line_count() {
            let (Ok(info), Ok(text)) = (document.line(number), document.line_text(number)) else {
                continue;
            };
            let Some(indent) = self.indent_of(&text) else {
                continue;
            };
            while let Some(&top) = stack.last() {
                if top.0 < indent {
                    break;
                }
                stack.pop();
                close(&mut regions, top, last_content);
            }
            stack.push((indent, info.end_offset(), number));
            last_content = Some((number, info.end_offset()));
        }
        while let Some(top) = stack.pop() {
            close(&mut regions, top, last_content);
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(document: &Document, regions: &[FoldMarker]) -> Vec<String> {
        let mut out: Vec<_> = regions
            .iter()
            .map(|r| document.text(r.offset(), r.length()).unwrap())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_brace_folding() {
        let document = Document::from_text("fn a() {\n  if x { y }\n  {\n  }\n}\n");
        let regions = BraceFoldingStrategy::default().generate_foldings(&document);
        assert_eq!(
            spans(&document, &regions),
            vec!["{\n  if x { y }\n  {\n  }\n}", "{\n  }"]
        );
    }

    #[test]
    fn test_unbalanced_braces_are_ignored() {
        let document = Document::from_text("}\n{\n");
        let regions = BraceFoldingStrategy::default().generate_foldings(&document);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_indent_folding() {
        let document = Document::from_text("a:\n  b\n  c:\n\tdeep\n\nd\n");
        let regions = IndentFoldingStrategy::default().generate_foldings(&document);
        assert_eq!(
            spans(&document, &regions),
            vec!["\n\tdeep", "\n  b\n  c:\n\tdeep"]
        );
    }
}
