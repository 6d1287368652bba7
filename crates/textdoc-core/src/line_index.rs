//! Logical line index.
//!
//! An AVL tree of [`LineRecord`]s stored in an index arena. Each node keeps the
//! number of lines and the number of characters in its subtree, so line
//! numbers and offsets are never stored; both are rebuilt in O(log n) from
//! these aggregates. Every insert, delete and rotation re-derives the
//! aggregates of the touched node and all of its ancestors.

use crate::anchor::AnchorId;
use crate::error::{DocumentError, Result};
use crate::highlight::{SpanStack, TextWord};
use crate::line_ending::{LineDelimiter, LineSpan};

/// Stable identity of a line record.
///
/// A line id stays valid while the record is attached to the tree. After a
/// merge or removal it reports deleted, even if the arena slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId {
    index: u32,
    generation: u32,
}

impl LineId {
    pub(crate) fn slot(self) -> usize {
        self.index as usize
    }
}

/// One line of the document.
#[derive(Debug, Clone, Default)]
pub struct LineRecord {
    total_length: usize,
    delimiter: Option<LineDelimiter>,
    pub(crate) anchors: Vec<AnchorId>,
    pub(crate) words: Option<Vec<TextWord>>,
    pub(crate) span_stack: Option<SpanStack>,
}

impl LineRecord {
    fn new(span: LineSpan) -> Self {
        Self {
            total_length: span.total_length,
            delimiter: Some(span.delimiter),
            ..Self::default()
        }
    }

    /// Content plus delimiter.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Content length without the delimiter.
    pub fn length(&self) -> usize {
        self.total_length - self.delimiter_length()
    }

    /// Delimiter length (0, 1 or 2).
    pub fn delimiter_length(&self) -> usize {
        self.delimiter().len()
    }

    /// The delimiter terminating this line.
    pub fn delimiter(&self) -> LineDelimiter {
        self.delimiter.unwrap_or(LineDelimiter::None)
    }

    /// Tokens from the last highlighting pass, if the line has been tokenized.
    pub fn words(&self) -> Option<&[TextWord]> {
        self.words.as_deref()
    }

    /// Span stack in effect at the end of this line.
    pub fn span_stack(&self) -> Option<&SpanStack> {
        self.span_stack.as_ref()
    }

    /// Anchors hosted by this line.
    pub fn anchors(&self) -> &[AnchorId] {
        &self.anchors
    }
}

/// A (line, column) coordinate. Columns count Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextPosition {
    /// Zero-based line number.
    pub line: usize,
    /// Zero-based column.
    pub column: usize,
}

impl TextPosition {
    /// Create a position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Snapshot of a line's position, as returned by [`Document::line`](crate::Document::line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    /// Line identity.
    pub id: LineId,
    /// Zero-based line number.
    pub number: usize,
    /// Offset of the first character.
    pub offset: usize,
    /// Content length.
    pub length: usize,
    /// Content plus delimiter.
    pub total_length: usize,
    /// Terminating delimiter.
    pub delimiter: LineDelimiter,
}

impl LineInfo {
    /// Offset just past the content (where the delimiter starts).
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    line: LineRecord,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    height: i32,
    count: usize,
    total_length: usize,
    generation: u32,
    live: bool,
}

/// Augmented balanced tree of line records.
///
/// The tree is never empty: an empty document has one zero-length line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: usize,
}

impl LineIndex {
    /// Create an index holding one empty line.
    pub fn new() -> Self {
        let mut index = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: 0,
        };
        index.root = index.alloc(LineRecord::new(LineSpan {
            total_length: 0,
            delimiter: LineDelimiter::None,
        }));
        index
    }

    /// Build a balanced index from scanned line spans.
    pub fn from_spans(spans: &[LineSpan]) -> Self {
        let mut index = Self::new();
        index.rebuild(spans);
        index
    }

    /// Replace every line with the given spans. All previous line ids become deleted.
    pub fn rebuild(&mut self, spans: &[LineSpan]) {
        for node in &mut self.nodes {
            if node.live {
                node.generation = node.generation.wrapping_add(1);
            }
            node.live = false;
            node.line = LineRecord::default();
        }
        self.free = (0..self.nodes.len()).rev().collect();

        if spans.is_empty() {
            self.root = self.alloc(LineRecord::new(LineSpan {
                total_length: 0,
                delimiter: LineDelimiter::None,
            }));
            return;
        }
        if let Some(root) = self.build_balanced(spans, None) {
            self.root = root;
        }
    }

    /// Remove everything and re-seed a single empty line.
    pub fn clear(&mut self) {
        self.rebuild(&[]);
    }

    fn build_balanced(&mut self, spans: &[LineSpan], parent: Option<usize>) -> Option<usize> {
        if spans.is_empty() {
            return None;
        }
        let mid = spans.len() / 2;
        let node = self.alloc(LineRecord::new(spans[mid]));
        self.nodes[node].parent = parent;
        let left = self.build_balanced(&spans[..mid], Some(node));
        let right = self.build_balanced(&spans[mid + 1..], Some(node));
        self.nodes[node].left = left;
        self.nodes[node].right = right;
        self.update(node);
        Some(node)
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.nodes[self.root].count
    }

    /// Number of characters, delimiters included.
    pub fn total_length(&self) -> usize {
        self.nodes[self.root].total_length
    }

    /// Whether `id` no longer refers to an attached line.
    pub fn is_deleted(&self, id: LineId) -> bool {
        self.resolve(id).is_err()
    }

    /// The record behind `id`.
    pub fn line(&self, id: LineId) -> Result<&LineRecord> {
        let node = self.resolve(id)?;
        Ok(&self.nodes[node].line)
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> Result<&mut LineRecord> {
        let node = self.resolve(id)?;
        Ok(&mut self.nodes[node].line)
    }

    /// Line id at `number`.
    pub fn line_by_index(&self, number: usize) -> Result<LineId> {
        let count = self.line_count();
        if number >= count {
            return Err(DocumentError::LineOutOfRange {
                line: number,
                count,
            });
        }
        let mut node = self.root;
        let mut remaining = number;
        loop {
            let left_count = self.count(self.nodes[node].left);
            if remaining < left_count {
                match self.nodes[node].left {
                    Some(left) => node = left,
                    None => break,
                }
            } else if remaining == left_count {
                break;
            } else {
                remaining -= left_count + 1;
                match self.nodes[node].right {
                    Some(right) => node = right,
                    None => break,
                }
            }
        }
        Ok(self.id_of(node))
    }

    /// Line containing `offset`, with the line's start offset.
    ///
    /// `offset == total_length()` resolves to the last line.
    pub fn line_by_offset(&self, offset: usize) -> Result<(LineId, usize)> {
        let len = self.total_length();
        if offset > len {
            return Err(DocumentError::OffsetOutOfRange { offset, len });
        }
        if offset == len {
            let last = self.rightmost(self.root);
            return Ok((self.id_of(last), len - self.nodes[last].line.total_length));
        }

        let mut node = self.root;
        let mut remaining = offset;
        let mut line_start = 0usize;
        loop {
            let left_total = self.total(self.nodes[node].left);
            if remaining < left_total {
                match self.nodes[node].left {
                    Some(left) => {
                        node = left;
                        continue;
                    }
                    None => break,
                }
            }
            remaining -= left_total;
            line_start += left_total;
            let own = self.nodes[node].line.total_length;
            if remaining < own {
                break;
            }
            remaining -= own;
            line_start += own;
            match self.nodes[node].right {
                Some(right) => node = right,
                None => break,
            }
        }
        Ok((self.id_of(node), line_start))
    }

    /// Line number of `id`.
    pub fn index_of(&self, id: LineId) -> Result<usize> {
        let mut node = self.resolve(id)?;
        let mut index = self.count(self.nodes[node].left);
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[parent].right == Some(node) {
                index += self.count(self.nodes[parent].left) + 1;
            }
            node = parent;
        }
        Ok(index)
    }

    /// Offset of the first character of `id`.
    pub fn offset_of(&self, id: LineId) -> Result<usize> {
        let mut node = self.resolve(id)?;
        let mut offset = self.total(self.nodes[node].left);
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[parent].right == Some(node) {
                offset +=
                    self.total(self.nodes[parent].left) + self.nodes[parent].line.total_length;
            }
            node = parent;
        }
        Ok(offset)
    }

    /// Position snapshot of `id`.
    pub fn info(&self, id: LineId) -> Result<LineInfo> {
        let line = self.line(id)?;
        Ok(LineInfo {
            id,
            number: self.index_of(id)?,
            offset: self.offset_of(id)?,
            length: line.length(),
            total_length: line.total_length,
            delimiter: line.delimiter(),
        })
    }

    /// The line following `id`.
    pub fn next_line(&self, id: LineId) -> Result<Option<LineId>> {
        let node = self.resolve(id)?;
        Ok(self.successor(node).map(|n| self.id_of(n)))
    }

    /// The line preceding `id`.
    pub fn previous_line(&self, id: LineId) -> Result<Option<LineId>> {
        let node = self.resolve(id)?;
        Ok(self.predecessor(node).map(|n| self.id_of(n)))
    }

    /// Iterate over all lines in document order.
    pub fn iter(&self) -> LineIter<'_> {
        LineIter {
            index: self,
            next: Some(self.leftmost(self.root)),
        }
    }

    /// Insert a new line directly after `after`.
    pub fn insert_line_after(&mut self, after: LineId, span: LineSpan) -> Result<LineId> {
        let anchor = self.resolve(after)?;
        let new = self.alloc(LineRecord::new(span));
        match self.nodes[anchor].right {
            None => self.attach(anchor, new, false),
            Some(right) => {
                let parent = self.leftmost(right);
                self.attach(parent, new, true);
            }
        }
        let parent = self.nodes[new].parent;
        self.rebalance_from(parent);
        tracing::trace!(line = ?self.id_of(new), "line inserted");
        Ok(self.id_of(new))
    }

    /// Insert a new line directly before `before`.
    pub fn insert_line_before(&mut self, before: LineId, span: LineSpan) -> Result<LineId> {
        let anchor = self.resolve(before)?;
        let new = self.alloc(LineRecord::new(span));
        match self.nodes[anchor].left {
            None => self.attach(anchor, new, true),
            Some(left) => {
                let parent = self.rightmost(left);
                self.attach(parent, new, false);
            }
        }
        let parent = self.nodes[new].parent;
        self.rebalance_from(parent);
        Ok(self.id_of(new))
    }

    /// Detach `id` from the tree and return its record.
    ///
    /// Removing the only line re-seeds an empty one.
    pub fn remove_line(&mut self, id: LineId) -> Result<LineRecord> {
        let z = self.resolve(id)?;
        if self.line_count() == 1 {
            let record = std::mem::take(&mut self.nodes[z].line);
            self.clear();
            return Ok(record);
        }

        let rebalance_start = match (self.nodes[z].left, self.nodes[z].right) {
            (Some(left), Some(right)) => {
                let y = self.leftmost(right);
                let start = if self.nodes[y].parent == Some(z) {
                    y
                } else {
                    let y_parent = self.nodes[y].parent;
                    let y_right = self.nodes[y].right;
                    self.set_child(y_parent, y, y_right);
                    if let Some(r) = y_right {
                        self.nodes[r].parent = y_parent;
                    }
                    self.nodes[y].right = Some(right);
                    self.nodes[right].parent = Some(y);
                    y_parent.unwrap_or(y)
                };
                self.nodes[y].left = Some(left);
                self.nodes[left].parent = Some(y);
                let z_parent = self.nodes[z].parent;
                self.nodes[y].parent = z_parent;
                self.set_child(z_parent, z, Some(y));
                Some(start)
            }
            (child, None) | (None, child) => {
                let z_parent = self.nodes[z].parent;
                if let Some(c) = child {
                    self.nodes[c].parent = z_parent;
                }
                self.set_child(z_parent, z, child);
                z_parent
            }
        };

        let record = self.release(z);
        self.rebalance_from(rebalance_start);
        tracing::trace!(line = ?id, "line removed");
        Ok(record)
    }

    /// Change the length of a line and refresh the aggregates above it.
    pub fn set_line_length(&mut self, id: LineId, span: LineSpan) -> Result<()> {
        let node = self.resolve(id)?;
        self.nodes[node].line.total_length = span.total_length;
        self.nodes[node].line.delimiter = Some(span.delimiter);
        let mut at = Some(node);
        while let Some(i) = at {
            self.update(i);
            at = self.nodes[i].parent;
        }
        Ok(())
    }

    /// Verify aggregates, balance factors and parent links for the whole tree.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.nodes[self.root].parent.is_some() {
            return Err("root has a parent".to_string());
        }
        self.check_node(self.root).map(|_| ())
    }

    fn check_node(&self, node: usize) -> std::result::Result<(i32, usize, usize), String> {
        let n = &self.nodes[node];
        if !n.live {
            return Err(format!("node {node} is not live"));
        }
        let mut height = (0, 0);
        let mut count = 0;
        let mut total = 0;
        for (side, child) in [(0, n.left), (1, n.right)] {
            if let Some(c) = child {
                if self.nodes[c].parent != Some(node) {
                    return Err(format!("node {c} has a wrong parent link"));
                }
                let (h, cnt, tot) = self.check_node(c)?;
                if side == 0 {
                    height.0 = h;
                } else {
                    height.1 = h;
                }
                count += cnt;
                total += tot;
            }
        }
        count += 1;
        total += n.line.total_length;
        let h = 1 + height.0.max(height.1);
        if (height.0 - height.1).abs() > 1 {
            return Err(format!("node {node} is unbalanced"));
        }
        if n.height != h || n.count != count || n.total_length != total {
            return Err(format!(
                "node {node} aggregates out of date: height {}/{h}, count {}/{count}, total {}/{total}",
                n.height, n.count, n.total_length
            ));
        }
        Ok((h, count, total))
    }

    fn resolve(&self, id: LineId) -> Result<usize> {
        match self.nodes.get(id.slot()) {
            Some(node) if node.live && node.generation == id.generation => Ok(id.slot()),
            _ => Err(DocumentError::LineDeleted),
        }
    }

    fn id_of(&self, node: usize) -> LineId {
        LineId {
            index: node as u32,
            generation: self.nodes[node].generation,
        }
    }

    fn alloc(&mut self, line: LineRecord) -> usize {
        let node = Node {
            total_length: line.total_length,
            line,
            height: 1,
            count: 1,
            live: true,
            ..Node::default()
        };
        match self.free.pop() {
            Some(slot) => {
                let generation = self.nodes[slot].generation;
                self.nodes[slot] = Node {
                    generation,
                    ..node
                };
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, node: usize) -> LineRecord {
        let n = &mut self.nodes[node];
        n.live = false;
        n.generation = n.generation.wrapping_add(1);
        n.parent = None;
        n.left = None;
        n.right = None;
        self.free.push(node);
        std::mem::take(&mut self.nodes[node].line)
    }

    fn attach(&mut self, parent: usize, child: usize, as_left: bool) {
        if as_left {
            self.nodes[parent].left = Some(child);
        } else {
            self.nodes[parent].right = Some(child);
        }
        self.nodes[child].parent = Some(parent);
    }

    fn set_child(&mut self, parent: Option<usize>, old: usize, new: Option<usize>) {
        match parent {
            None => {
                if let Some(n) = new {
                    self.root = n;
                }
            }
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
    }

    fn height(&self, node: Option<usize>) -> i32 {
        node.map_or(0, |n| self.nodes[n].height)
    }

    fn count(&self, node: Option<usize>) -> usize {
        node.map_or(0, |n| self.nodes[n].count)
    }

    fn total(&self, node: Option<usize>) -> usize {
        node.map_or(0, |n| self.nodes[n].total_length)
    }

    fn balance(&self, node: usize) -> i32 {
        self.height(self.nodes[node].left) - self.height(self.nodes[node].right)
    }

    fn update(&mut self, node: usize) {
        let (left, right) = (self.nodes[node].left, self.nodes[node].right);
        let height = 1 + self.height(left).max(self.height(right));
        let count = 1 + self.count(left) + self.count(right);
        let total = self.nodes[node].line.total_length + self.total(left) + self.total(right);
        let n = &mut self.nodes[node];
        n.height = height;
        n.count = count;
        n.total_length = total;
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        let Some(y) = self.nodes[x].right else {
            return x;
        };
        let inner = self.nodes[y].left;
        let parent = self.nodes[x].parent;

        self.nodes[x].right = inner;
        if let Some(i) = inner {
            self.nodes[i].parent = Some(x);
        }
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
        self.nodes[y].parent = parent;
        self.set_child(parent, x, Some(y));

        self.update(x);
        self.update(y);
        y
    }

    fn rotate_right(&mut self, x: usize) -> usize {
        let Some(y) = self.nodes[x].left else {
            return x;
        };
        let inner = self.nodes[y].right;
        let parent = self.nodes[x].parent;

        self.nodes[x].left = inner;
        if let Some(i) = inner {
            self.nodes[i].parent = Some(x);
        }
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
        self.nodes[y].parent = parent;
        self.set_child(parent, x, Some(y));

        self.update(x);
        self.update(y);
        y
    }

    /// Restore balance and aggregates from `start` up to the root.
    fn rebalance_from(&mut self, start: Option<usize>) {
        let mut at = start;
        while let Some(node) = at {
            self.update(node);
            let balance = self.balance(node);
            let top = if balance > 1 {
                if let Some(left) = self.nodes[node].left
                    && self.balance(left) < 0
                {
                    self.rotate_left(left);
                }
                self.rotate_right(node)
            } else if balance < -1 {
                if let Some(right) = self.nodes[node].right
                    && self.balance(right) > 0
                {
                    self.rotate_right(right);
                }
                self.rotate_left(node)
            } else {
                node
            };
            at = self.nodes[top].parent;
        }
    }

    fn leftmost(&self, mut node: usize) -> usize {
        while let Some(left) = self.nodes[node].left {
            node = left;
        }
        node
    }

    fn rightmost(&self, mut node: usize) -> usize {
        while let Some(right) = self.nodes[node].right {
            node = right;
        }
        node
    }

    fn successor(&self, node: usize) -> Option<usize> {
        if let Some(right) = self.nodes[node].right {
            return Some(self.leftmost(right));
        }
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    fn predecessor(&self, node: usize) -> Option<usize> {
        if let Some(left) = self.nodes[node].left {
            return Some(self.rightmost(left));
        }
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].right == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over `(LineId, &LineRecord)`.
pub struct LineIter<'a> {
    index: &'a LineIndex,
    next: Option<usize>,
}

impl<'a> Iterator for LineIter<'a> {
    type Item = (LineId, &'a LineRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = self.index.successor(node);
        Some((self.index.id_of(node), &self.index.nodes[node].line))
    }
}
