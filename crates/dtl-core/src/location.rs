//! Source positions.
//!
//! Tokens, AST nodes, and trace snapshots carry byte-offset [`Span`]s.
//! Line/column information is recovered on demand through a [`LineIndex`],
//! so the hot path never pays for position bookkeeping.

use serde::{Deserialize, Serialize};

/// A half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both operands.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A resolved source position. Line and column are 1-based; column counts
/// bytes from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

/// Precomputed line-start table for offset to line/column resolution.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// Resolves a byte offset to a [`Location`]. Offsets past the end of
    /// the source resolve to the end of the last line.
    pub fn location(&self, offset: u32) -> Location {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };

        Location {
            offset,
            line: line as u32 + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}
