//! The source index: offset/line arithmetic over the buffered input.
//!
//! All position logic in the decoder reduces to arithmetic over this table,
//! which removes any dependency on the YAML layer's column reporting for
//! cross-line distance calculations.

/// A precomputed table of line-start offsets, with a trailing sentinel equal
/// to the source length.
pub(crate) struct LineIndex<'a> {
    src: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(src: &'a str) -> LineIndex<'a> {
        let mut starts = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        // Sentinel.
        if starts.last() != Some(&src.len()) {
            starts.push(src.len());
        } else if starts.len() == 1 {
            starts.push(src.len());
        }
        LineIndex { src, starts }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.starts.len() - 1
    }

    /// Map a byte offset to its 1-based line. Offsets at or past the end of
    /// the source map to the last line.
    pub fn offset_to_line(&self, offset: usize) -> usize {
        let idx = self.starts.partition_point(|&s| s <= offset);
        idx.clamp(1, self.line_count())
    }

    /// The byte offset at which the 1-based `line` starts. Lines past the
    /// end yield the source length.
    pub fn line_start(&self, line: usize) -> usize {
        if line == 0 {
            return 0;
        }
        self.starts
            .get(line - 1)
            .copied()
            .unwrap_or(self.src.len())
    }

    fn line_span(&self, line: usize) -> &str {
        let start = self.line_start(line);
        let end = self.line_start(line + 1);
        &self.src[start.min(self.src.len())..end.min(self.src.len())]
    }

    /// Whether the line holds only whitespace.
    pub fn is_blank_line(&self, line: usize) -> bool {
        self.line_span(line).trim().is_empty()
    }

    /// Whether the line holds only optional whitespace and a comment.
    pub fn is_comment_line(&self, line: usize) -> bool {
        self.line_span(line).trim_start().starts_with('#')
    }
}

/// Scan forward from `start` for the closing byte of a flow collection,
/// skipping quoted strings and comments.
pub(crate) fn scan_to_close(src: &str, start: usize, close: u8) -> usize {
    let bytes = src.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'\'' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        if bytes.get(i + 1) == Some(&b'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'#' if i == start || matches!(bytes[i - 1], b' ' | b'\t') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b if b == close => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

#[cfg(test)]
mod test {
    use super::{scan_to_close, LineIndex};

    #[test]
    fn test_line_index() {
        let idx = LineIndex::new("a: 1\nb: 2\n");
        assert_eq!(idx.line_count(), 2);
        assert_eq!(idx.offset_to_line(0), 1);
        assert_eq!(idx.offset_to_line(4), 1);
        assert_eq!(idx.offset_to_line(5), 2);
        assert_eq!(idx.offset_to_line(10), 2);
        assert_eq!(idx.line_start(2), 5);
        assert_eq!(idx.line_start(3), 10);
    }

    #[test]
    fn test_no_trailing_newline() {
        let idx = LineIndex::new("a: 1");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.offset_to_line(3), 1);
        assert_eq!(idx.line_start(2), 4);
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let idx = LineIndex::new("a: 1\n\n  # note\nb: 2\n");
        assert!(idx.is_blank_line(2));
        assert!(idx.is_comment_line(3));
        assert!(!idx.is_comment_line(4));
        assert!(!idx.is_blank_line(1));
    }

    #[test]
    fn test_scan_to_close() {
        let src = "{a: 1, b: 2}";
        assert_eq!(scan_to_close(src, 1, b'}'), 11);
        let src = r#"{a: "}", b: 1}"#;
        assert_eq!(scan_to_close(src, 1, b'}'), 13);
        let src = "{a: '}}', b: 1}";
        assert_eq!(scan_to_close(src, 1, b'}'), 14);
        let src = "[1, 2 # ]\n]";
        assert_eq!(scan_to_close(src, 1, b']'), 10);
        assert_eq!(scan_to_close("[1, 2", 1, b']'), 5);
    }
}
