//! Decoder errors.
//!
//! Every error renders as `<filename>:<line>: <message>` (or without the
//! line when none is known). Once the decoder has returned an error it is
//! latched: all further calls return the same error.

use std::fmt;

/// The kinds of failure the decoder can report.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An opaque message from the YAML layer, already stripped of its
    /// `yaml:` prefix.
    #[error("{0}")]
    Parse(String),
    /// A node kind the decoder does not know. Defensive; a well-formed
    /// parser does not produce it.
    #[error("unknown yaml node kind: {0}")]
    UnknownNodeKind(String),
    /// A tag with no CUE counterpart.
    #[error("cannot unmarshal tag {0:?}")]
    UnsupportedTag(String),
    /// A scalar that does not parse under its tag.
    #[error("cannot decode {value:?} as {tag}: {reason}")]
    InvalidNumber {
        /// The raw scalar value.
        value: String,
        /// The short tag it was decoded under.
        tag: String,
        /// What went wrong.
        reason: String,
    },
    /// A `!!binary` scalar that does not hold base64 data.
    #[error("!!binary value contains invalid base64 data")]
    InvalidBase64,
    /// A mapping key of a kind that cannot become a label.
    #[error("invalid map key: {0}")]
    InvalidKey(String),
    /// A mapping key whose value cannot be written as a label.
    #[error("invalid label {0:?}")]
    InvalidLabel(String),
    /// A `<<` merge whose value is not a mapping or sequence of mappings.
    #[error("map merge requires map or sequence of maps as the value")]
    InvalidMerge,
    /// An anchor whose expansion reaches itself.
    #[error("anchor {0:?} value contains itself")]
    AnchorCycle(String),
    /// `unmarshal` was handed more than one document.
    #[error("expected a single YAML document")]
    MultipleDocuments,
}

/// A positioned decoder error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    filename: String,
    line: Option<usize>,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(filename: &str, line: Option<usize>, kind: ErrorKind) -> Error {
        Error {
            filename: filename.to_owned(),
            line,
            kind,
        }
    }

    /// The filename the decoder was created with.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The 1-based line the error points at, if known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.filename, line, self.kind),
            None => write!(f, "{}: {}", self.filename, self.kind),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::{Error, ErrorKind};

    #[test]
    fn test_display() {
        let err = Error::new("x.yaml", Some(3), ErrorKind::UnsupportedTag("!!python".into()));
        assert_eq!(err.to_string(), "x.yaml:3: cannot unmarshal tag \"!!python\"");
        let err = Error::new("x.yaml", None, ErrorKind::MultipleDocuments);
        assert_eq!(err.to_string(), "x.yaml: expected a single YAML document");
    }
}
