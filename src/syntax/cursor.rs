//! Parse cursor and source spans.
//!
//! The cursor is a plain byte offset into the expression text. It is never
//! shared: every parsing step takes one by value and hands back the advanced
//! position next to the value it produced.

use crate::TallyError;

/// A byte range in the expression text, used to label diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A one-byte span starting at `offset`.
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Current read offset into the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cursor(usize);

impl Cursor {
    pub fn start() -> Self {
        Self(0)
    }

    pub fn new(offset: usize) -> Self {
        Self(offset)
    }

    pub fn offset(self) -> usize {
        self.0
    }

    /// Returns the cursor moved `n` bytes forward.
    pub fn advance(self, n: usize) -> Self {
        Self(self.0 + n)
    }

    /// Moves past one byte without looking at it, stopping at the end of
    /// `text`.
    pub fn skip_one(self, text: &[u8]) -> Self {
        if self.is_at_end(text) {
            self
        } else {
            self.advance(1)
        }
    }

    /// The byte under the cursor, or `None` past the end of `text`.
    pub fn peek(self, text: &[u8]) -> Option<u8> {
        text.get(self.0).copied()
    }

    /// Span of the single byte under the cursor, clamped to the text.
    pub fn span(self, text: &[u8]) -> Span {
        if self.0 < text.len() {
            Span::at(self.0)
        } else {
            Span::new(text.len(), text.len())
        }
    }

    pub fn is_at_end(self, text: &[u8]) -> bool {
        self.0 >= text.len()
    }
}

/// The result of one parsing step: a value plus the cursor just past it.
pub type Parsed<T> = Result<(T, Cursor), TallyError>;
