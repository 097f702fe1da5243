//! Token positions for the emitted syntax tree.
//!
//! Positions are byte offsets into the source the decoder was created with.
//! Every position additionally carries a *relative* marker describing how
//! the token relates to the one emitted before it; a formatter uses it to
//! decide the whitespace between tokens that have no direct counterpart in
//! the YAML bytes.

/// How a token relates to the previous one.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RelPos {
    /// No relation known (the first token of a document).
    #[default]
    NoRel,
    /// Directly adjacent to the previous token.
    NoSpace,
    /// Separated by inline whitespace.
    Blank,
    /// On the following line.
    Newline,
    /// Separated by at least one blank line.
    NewSection,
}

/// A position in the decoded source.
///
/// An invalid position (see [`Pos::none`]) has `line == 0`. Its `rel` may
/// still be meaningful: the decoder hands out relation-only positions for
/// comments whose exact location the YAML layer does not report.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Pos {
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line, or 0 when the position is invalid.
    pub line: usize,
    /// 1-based byte column within the line.
    pub column: usize,
    /// Relation to the previously emitted token.
    pub rel: RelPos,
}

impl Pos {
    /// Create a position.
    #[must_use]
    pub fn new(offset: usize, line: usize, column: usize, rel: RelPos) -> Pos {
        Pos {
            offset,
            line,
            column,
            rel,
        }
    }

    /// The invalid position.
    #[must_use]
    pub fn none() -> Pos {
        Pos::default()
    }

    /// A relation-only position, not anchored in the source.
    #[must_use]
    pub fn relation(rel: RelPos) -> Pos {
        Pos {
            rel,
            ..Pos::default()
        }
    }

    /// Whether the position points into the source.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }

    /// Return the same position with another relation.
    #[must_use]
    pub fn with_rel(mut self, rel: RelPos) -> Pos {
        self.rel = rel;
        self
    }
}

#[cfg(test)]
mod test {
    use super::{Pos, RelPos};

    #[test]
    fn test_validity() {
        assert!(!Pos::none().is_valid());
        assert!(Pos::new(0, 1, 1, RelPos::NoRel).is_valid());
        assert_eq!(Pos::relation(RelPos::NewSection).rel, RelPos::NewSection);
    }
}
