//! A byte cursor over a fully buffered source.
//!
//! The parser works on byte offsets so that consumers can relate every
//! marker back to the original buffer with plain arithmetic. Columns count
//! bytes, not characters.

use crate::char_traits::is_blank;
use crate::error::Marker;

#[derive(Clone, Copy)]
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Cursor<'a> {
        Cursor {
            src,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn mark(&self) -> Marker {
        Marker::new(self.pos, self.line, self.col)
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + n).copied()
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    /// Skip spaces and tabulations, returning how many bytes were skipped.
    pub fn skip_blanks(&mut self) -> usize {
        let mut n = 0;
        while self.peek().is_some_and(is_blank) {
            self.bump();
            n += 1;
        }
        n
    }

    /// Whether the rest of the current line is blank (or a bare `\r`).
    pub fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n' | b'\r'))
    }

    /// The current line's remaining content, excluding the line break.
    pub fn rest_of_line(&self) -> &'a str {
        let rest = &self.src[self.pos..];
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].trim_end_matches('\r')
    }

    /// Advance past the end of the current line, consuming the line break.
    pub fn skip_line(&mut self) {
        while let Some(b) = self.bump() {
            if b == b'\n' {
                break;
            }
        }
    }

    /// Consume bytes while `f` holds, returning the consumed slice.
    pub fn take_while(&mut self, f: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&f) {
            self.bump();
        }
        &self.src[start..self.pos]
    }
}
