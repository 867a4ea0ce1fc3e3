//! Byte-offset spans and source locations.
//!
//! Symbols never own syntax; they only remember where they were declared.
//! A `Location` pairs a syntax tree identifier with a `TextSpan` inside it.

use std::fmt;

/// Identifier of one syntax tree (one source document) within a compilation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxTreeId(pub u32);

/// Half-open byte range `[start, end)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextSpan {
    pub start: u32,
    pub end: u32,
}

impl TextSpan {
    pub const fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub const fn at(start: u32, length: u32) -> Self {
        Self {
            start,
            end: start + length,
        }
    }

    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub const fn contains(self, position: u32) -> bool {
        position >= self.start && position < self.end
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// Where a symbol was declared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// Declared in source: a span in a syntax tree.
    Source { tree: SyntaxTreeId, span: TextSpan },
    /// Loaded from metadata; there is no source position.
    Metadata,
}

impl Location {
    pub const fn source(tree: SyntaxTreeId, span: TextSpan) -> Self {
        Self::Source { tree, span }
    }

    pub const fn span(&self) -> Option<TextSpan> {
        match self {
            Self::Source { span, .. } => Some(*span),
            Self::Metadata => None,
        }
    }

    pub const fn tree(&self) -> Option<SyntaxTreeId> {
        match self {
            Self::Source { tree, .. } => Some(*tree),
            Self::Metadata => None,
        }
    }

    pub const fn is_in_source(&self) -> bool {
        matches!(self, Self::Source { .. })
    }
}
