//! Source locations for points of use.
//!
//! Provides [`Span`], the location attached to every call, operator use and
//! instantiation request so diagnostics can point back at the source.

use std::fmt;

/// A source location, represented by its starting position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, 0 when unknown).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Location used when no source position is available.
    pub const UNKNOWN: Span = Span {
        line: 0,
        col: 0,
        len: 0,
    };

    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span carries a real position.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.line, self.col)
        } else {
            f.write_str("<unknown>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        assert_eq!(Span::new(3, 15, 5).to_string(), "3:15");
        assert_eq!(Span::UNKNOWN.to_string(), "<unknown>");
    }

    #[test]
    fn point_span_is_known() {
        let p = Span::point(2, 1);
        assert!(p.is_known());
        assert_eq!(p.len, 0);
        assert!(!Span::default().is_known());
    }
}
