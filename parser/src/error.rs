//! Parser error reporting.

use std::error::Error;
use std::fmt;

/// A location in a YAML document.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Default)]
pub struct Marker {
    /// The index (in bytes) in the input string.
    index: usize,
    /// The line (1-indexed).
    line: usize,
    /// The column (1-indexed, in bytes).
    col: usize,
}

impl Marker {
    /// Create a new [`Marker`] at the given position.
    #[must_use]
    pub fn new(index: usize, line: usize, col: usize) -> Marker {
        Marker { index, line, col }
    }

    /// Return the index (in bytes) of the marker in the source.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Return the line of the marker in the source.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Return the column of the marker in the source.
    #[must_use]
    pub fn col(&self) -> usize {
        self.col
    }
}

/// An error that occurred while scanning.
///
/// The error renders in the conventional YAML error shape, with the line
/// number when one is known:
///
/// ```text
/// yaml: line 3: did not find expected ',' or '}'
/// yaml: control characters are not allowed
/// ```
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct ScanError {
    /// The position at which the error happened in the source.
    mark: Option<Marker>,
    /// Human-readable details about the error.
    info: String,
}

impl ScanError {
    /// Create a new error from a location and an error string.
    #[must_use]
    pub fn new(loc: Marker, info: String) -> ScanError {
        ScanError {
            mark: Some(loc),
            info,
        }
    }

    /// Convenience alias for string slices.
    #[must_use]
    pub fn new_str(loc: Marker, info: &str) -> ScanError {
        ScanError::new(loc, info.to_owned())
    }

    /// Create an error that is not anchored to a position in the source.
    #[must_use]
    pub fn unmarked(info: String) -> ScanError {
        ScanError { mark: None, info }
    }

    /// Return the marker pointing to the error in the source, if any.
    #[must_use]
    pub fn marker(&self) -> Option<&Marker> {
        self.mark.as_ref()
    }

    /// Return the information string describing the error that happened.
    #[must_use]
    pub fn info(&self) -> &str {
        self.info.as_ref()
    }
}

impl Error for ScanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match &self.mark {
            Some(mark) => write!(formatter, "yaml: line {}: {}", mark.line(), self.info),
            None => write!(formatter, "yaml: {}", self.info),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Marker, ScanError};

    #[test]
    fn test_display() {
        let err = ScanError::new_str(Marker::new(12, 3, 4), "did not find expected key");
        assert_eq!(err.to_string(), "yaml: line 3: did not find expected key");
        let err = ScanError::unmarked("unexpected end of stream".into());
        assert_eq!(err.to_string(), "yaml: unexpected end of stream");
    }
}
