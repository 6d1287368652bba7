//! Persistent stack of open spans.
//!
//! Every line keeps the stack in effect at its end, so the stack is an
//! immutable singly linked list of shared nodes: push, pop, peek and clone
//! are O(1) and snapshots share their tails.

use std::fmt;
use std::sync::Arc;

use super::grammar::Span;

struct Node {
    span: Arc<Span>,
    next: Option<Arc<Node>>,
}

/// Open spans, innermost on top.
#[derive(Clone, Default)]
pub struct SpanStack {
    head: Option<Arc<Node>>,
    len: usize,
}

impl SpanStack {
    /// The empty stack (normal state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open spans.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no span is open.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Innermost open span.
    pub fn peek(&self) -> Option<&Arc<Span>> {
        self.head.as_ref().map(|node| &node.span)
    }

    /// A stack with `span` on top of this one.
    pub fn push(&self, span: Arc<Span>) -> Self {
        Self {
            head: Some(Arc::new(Node {
                span,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// This stack without its innermost span. Popping the empty stack yields the empty stack.
    pub fn pop(&self) -> Self {
        match &self.head {
            Some(node) => Self {
                head: node.next.clone(),
                len: self.len - 1,
            },
            None => Self::default(),
        }
    }

    /// Open spans from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Span>> {
        std::iter::successors(self.head.as_deref(), |node| node.next.as_deref())
            .map(|node| &node.span)
    }

    /// Whether any open span ends at the end of its line.
    pub fn has_stop_eol(&self) -> bool {
        self.iter().any(|span| span.stop_eol)
    }

    /// The state carried into the next line: this stack with every
    /// end-of-line span removed. Shares the whole list when there is none.
    pub fn without_stop_eol(&self) -> Self {
        if !self.has_stop_eol() {
            return self.clone();
        }
        let kept: Vec<&Arc<Span>> = self.iter().filter(|span| !span.stop_eol).collect();
        kept.into_iter()
            .rev()
            .fold(Self::new(), |stack, span| stack.push(span.clone()))
    }

    /// Whether two stacks carry the same state into the next line.
    ///
    /// End-of-line spans are ignored on both sides.
    pub fn same_state(&self, other: &SpanStack) -> bool {
        if let (Some(a), Some(b)) = (&self.head, &other.head)
            && Arc::ptr_eq(a, b)
        {
            return true;
        }
        let mut left = self.iter().filter(|span| !span.stop_eol);
        let mut right = other.iter().filter(|span| !span.stop_eol);
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.id() == b.id() => continue,
                _ => return false,
            }
        }
    }
}

impl fmt::Debug for SpanStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|span| span.name.as_str()))
            .finish()
    }
}
