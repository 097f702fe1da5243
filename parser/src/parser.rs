//! The document parser.
//!
//! Parses a fully buffered source into [`Node`] trees, one document at a
//! time. The parser is indentation-driven: block collections are delimited by
//! the column of their first entry, flow collections by brackets. Comment
//! lines are collected while skipping between nodes and attributed as head,
//! line or foot comments.

use hashlink::LinkedHashMap;

use crate::char_traits::{is_anchor_char, is_blank, is_blank_or_break, is_tag_char};
use crate::cursor::Cursor;
use crate::error::{Marker, ScanError};
use crate::node::{long_tag, Node, NodeKind, Style, LONG_TAG_PREFIX};
use crate::resolve::resolve_plain_tag;

/// A run of consecutive comment lines, kept until attribution is decided.
struct CommentRun {
    lines: Vec<String>,
    start_line: usize,
    end_line: usize,
    col: usize,
}

/// What lies ahead of the cursor after skipping blank and comment lines.
struct Ahead {
    eof: bool,
    mark: Marker,
}

/// An `&anchor` / `!tag` prefix in front of a node.
#[derive(Default)]
struct Prefix {
    mark: Option<Marker>,
    anchor: String,
    tag: String,
}

impl Prefix {
    fn is_present(&self) -> bool {
        self.mark.is_some()
    }
}

/// A streaming YAML document parser.
///
/// Feed it a buffered source and pull [`Node`] document trees out of it with
/// [`Parser::next_document`] until it returns `None`.
pub struct Parser<'a> {
    cur: Cursor<'a>,
    /// Anchors defined so far in the current document, name to definition
    /// site. Redefinitions replace the previous entry, as in YAML.
    anchors: LinkedHashMap<String, Marker>,
    /// Pending comment runs awaiting attribution.
    runs: Vec<CommentRun>,
    /// Line of the last content byte consumed.
    last_content_line: usize,
    /// Whether the last parsed node already advanced the cursor past its own
    /// lines (multi-line constructs do; inline scalars do not).
    at_next_content: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser over the given source.
    #[must_use]
    pub fn new(src: &'a str) -> Parser<'a> {
        Parser {
            cur: Cursor::new(src),
            anchors: LinkedHashMap::new(),
            runs: Vec::new(),
            last_content_line: 0,
            at_next_content: false,
        }
    }

    /// The source this parser reads from.
    #[must_use]
    pub fn source(&self) -> &'a str {
        self.cur.src()
    }

    /// Parse all remaining documents.
    ///
    /// # Errors
    /// Returns the first [`ScanError`] encountered.
    pub fn parse_all(&mut self) -> Result<Vec<Node>, ScanError> {
        let mut docs = Vec::new();
        while let Some(doc) = self.next_document()? {
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Parse the next document, or return `None` at the end of the stream.
    ///
    /// # Errors
    /// Returns a [`ScanError`] when the source is malformed.
    pub fn next_document(&mut self) -> Result<Option<Node>, ScanError> {
        self.anchors.clear();
        loop {
            let ahead = self.peek_content();
            if ahead.eof {
                return Ok(None);
            }
            if self.cur.col() == 1 && self.cur.peek() == Some(b'%') {
                // Directives carry no content of interest here.
                self.cur.skip_line();
                continue;
            }
            break;
        }
        debug_print!("document start at line {}", self.cur.line());

        let mut root = if self.marker_is("---") {
            let marker_mark = self.cur.mark();
            self.cur.advance(3);
            self.last_content_line = marker_mark.line();
            self.cur.skip_blanks();
            if !self.cur.at_line_end() && self.cur.peek() != Some(b'#') {
                self.parse_block_node(0, true)?
            } else {
                let lc = self.take_line_comment();
                if !self.cur.is_eof() {
                    self.cur.skip_line();
                }
                let ahead = self.peek_content();
                if ahead.eof || self.at_document_marker() {
                    // An explicit `---` with no content is a null document.
                    let mut node = Node::new(NodeKind::Scalar, marker_mark.line(), 1);
                    node.tag = long_tag("!!null");
                    node.line_comment = lc;
                    node.head_comment = self.take_head_comment();
                    self.at_next_content = true;
                    node
                } else {
                    self.parse_block_node(0, true)?
                }
            }
        } else {
            self.parse_block_node(0, true)?
        };

        if !self.at_next_content {
            self.last_content_line = self.cur.line();
            let lc = self.take_line_comment();
            if root.line_comment.is_empty() {
                root.line_comment = lc;
            }
            if !self.cur.is_eof() {
                self.cur.skip_line();
            }
        }
        let ahead = self.peek_content();
        let next_line = if ahead.eof { None } else { Some(ahead.mark.line()) };
        let foot = self.extract_foot(self.last_content_line, 1, true, next_line);
        if !foot.is_empty() {
            append_comment(&mut root.foot_comment, &foot);
        }
        if !ahead.eof {
            if self.marker_is("...") {
                self.cur.skip_line();
            } else if !self.marker_is("---") {
                return Err(ScanError::new_str(
                    ahead.mark,
                    "did not find expected document separator",
                ));
            }
        }

        let mut doc = Node::new(NodeKind::Document, root.line, root.column);
        doc.content.push(root);
        Ok(Some(doc))
    }

    // ---- comment bookkeeping ----

    /// Skip blank and comment lines, collecting comment runs, and stop at the
    /// next content byte (or EOF). Idempotent when already at content.
    fn peek_content(&mut self) -> Ahead {
        loop {
            self.cur.skip_blanks();
            match self.cur.peek() {
                None => {
                    return Ahead {
                        eof: true,
                        mark: self.cur.mark(),
                    }
                }
                Some(b'\n' | b'\r') => self.cur.skip_line(),
                Some(b'#') => {
                    let mark = self.cur.mark();
                    let text = self.cur.rest_of_line().to_owned();
                    match self.runs.last_mut() {
                        Some(run) if run.end_line + 1 == mark.line() => {
                            run.lines.push(text);
                            run.end_line = mark.line();
                        }
                        _ => self.runs.push(CommentRun {
                            lines: vec![text],
                            start_line: mark.line(),
                            end_line: mark.line(),
                            col: mark.col(),
                        }),
                    }
                    self.cur.skip_line();
                }
                Some(_) => {
                    return Ahead {
                        eof: false,
                        mark: self.cur.mark(),
                    }
                }
            }
        }
    }

    /// Drain all pending comment runs into a head comment.
    fn take_head_comment(&mut self) -> String {
        if self.runs.is_empty() {
            return String::new();
        }
        let mut lines = Vec::new();
        for run in self.runs.drain(..) {
            lines.extend(run.lines);
        }
        lines.join("\n")
    }

    /// Decide whether the first pending run is the foot comment of the node
    /// that ended on `prev_line`.
    ///
    /// A run qualifies when it directly follows the node's last line, is not
    /// outdented below `min_col`, and is either separated from what follows
    /// by a blank line or sits at the end of its enclosing block.
    fn extract_foot(
        &mut self,
        prev_line: usize,
        min_col: usize,
        ends: bool,
        next_line: Option<usize>,
    ) -> String {
        let Some(first) = self.runs.first() else {
            return String::new();
        };
        if first.start_line != prev_line + 1 || first.col < min_col {
            return String::new();
        }
        let after = self.runs.get(1).map(|r| r.start_line).or(next_line);
        let separated = after.map_or(true, |l| l > first.end_line + 1);
        if separated || ends {
            let run = self.runs.remove(0);
            run.lines.join("\n")
        } else {
            String::new()
        }
    }

    /// Consume a trailing comment on the current line, if any.
    fn take_line_comment(&mut self) -> String {
        self.cur.skip_blanks();
        if self.cur.peek() == Some(b'#') {
            let text = self.cur.rest_of_line().to_owned();
            self.cur.advance(text.len());
            text
        } else {
            String::new()
        }
    }

    // ---- block context ----

    /// Parse a node in block context. `ctx_col` is the column of the
    /// enclosing construct; `allow_key` permits the node to open a mapping.
    fn parse_block_node(&mut self, ctx_col: usize, allow_key: bool) -> Result<Node, ScanError> {
        let head = self.take_head_comment();
        let prefix = self.parse_prefix()?;

        if prefix.is_present() && (self.cur.at_line_end() || self.cur.peek() == Some(b'#')) {
            // `&anchor` or `!tag` alone on the line; the content follows on
            // deeper lines, or there is none at all.
            let mark = prefix.mark.unwrap_or_else(|| self.cur.mark());
            let lc = self.take_line_comment();
            self.last_content_line = self.cur.line();
            if !self.cur.is_eof() {
                self.cur.skip_line();
            }
            let ahead = self.peek_content();
            if ahead.eof || self.at_document_marker() || ahead.mark.col() <= ctx_col {
                let mut node = Node::new(NodeKind::Scalar, mark.line(), mark.col());
                node.tag = long_tag("!!null");
                node.head_comment = head;
                node.line_comment = lc;
                self.apply_prefix(&mut node, &prefix);
                self.at_next_content = true;
                return Ok(node);
            }
            let mut node = self.parse_block_node(ctx_col, true)?;
            node.line = mark.line();
            node.column = mark.col();
            self.apply_prefix(&mut node, &prefix);
            prepend_comment(&mut node.head_comment, &head);
            prepend_comment(&mut node.line_comment, &lc);
            return Ok(node);
        }

        self.parse_block_node_content(ctx_col, allow_key, head, prefix)
    }

    fn parse_block_node_content(
        &mut self,
        ctx_col: usize,
        allow_key: bool,
        head: String,
        prefix: Prefix,
    ) -> Result<Node, ScanError> {
        let mark = prefix.mark.unwrap_or_else(|| self.cur.mark());
        let Some(b) = self.cur.peek() else {
            return Err(ScanError::new_str(mark, "unexpected end of stream"));
        };
        match b {
            b'{' | b'[' => {
                let mut node = if b == b'{' {
                    self.parse_flow_mapping()?
                } else {
                    self.parse_flow_sequence()?
                };
                node.line = mark.line();
                node.column = mark.col();
                node.head_comment = head;
                self.apply_prefix(&mut node, &prefix);
                self.maybe_block_mapping(node, allow_key, mark)
            }
            b'"' | b'\'' => {
                let mut node = self.parse_quoted(b)?;
                node.line = mark.line();
                node.column = mark.col();
                node.head_comment = head;
                self.apply_prefix(&mut node, &prefix);
                self.maybe_block_mapping(node, allow_key, mark)
            }
            b'*' => {
                let mut node = self.parse_alias()?;
                node.line = mark.line();
                node.column = mark.col();
                node.head_comment = head;
                self.maybe_block_mapping(node, allow_key, mark)
            }
            b'|' | b'>' => {
                let mut node = self.parse_block_scalar(b == b'>', ctx_col)?;
                node.line = mark.line();
                node.column = mark.col();
                node.head_comment = head;
                self.apply_prefix(&mut node, &prefix);
                Ok(node)
            }
            b'-' if matches!(self.cur.peek_at(1), None | Some(b' ' | b'\t' | b'\n' | b'\r')) => {
                let mut node = self.parse_block_sequence(self.cur.col())?;
                node.line = mark.line();
                node.column = mark.col();
                node.head_comment = head;
                self.apply_prefix(&mut node, &prefix);
                Ok(node)
            }
            b'?' if matches!(self.cur.peek_at(1), None | Some(b' ' | b'\t' | b'\n' | b'\r')) => {
                Err(ScanError::new_str(
                    mark,
                    "complex mapping keys are not supported",
                ))
            }
            _ => {
                let rest = self.cur.rest_of_line();
                let end = plain_end(rest);
                if allow_key {
                    if let Some(ci) = find_key_colon(&rest[..end]) {
                        let text = rest[..ci].trim_end().to_owned();
                        let mut key = self.make_plain_scalar(mark, text, &prefix);
                        key.head_comment = head;
                        self.cur.advance(ci);
                        return self.parse_block_mapping(key, mark.col());
                    }
                } else if let Some(ci) = find_key_colon(&rest[..end]) {
                    let colon = Marker::new(
                        self.cur.pos() + ci,
                        self.cur.line(),
                        self.cur.col() + ci,
                    );
                    return Err(ScanError::new_str(
                        colon,
                        "mapping values are not allowed in this context",
                    ));
                }
                let mut node = self.parse_plain_scalar(ctx_col, mark, &prefix)?;
                node.head_comment = head;
                Ok(node)
            }
        }
    }

    /// After an inline node in block context, check whether a `:` follows and
    /// turns the node into the first key of a block mapping.
    fn maybe_block_mapping(
        &mut self,
        node: Node,
        allow_key: bool,
        mark: Marker,
    ) -> Result<Node, ScanError> {
        self.at_next_content = false;
        if allow_key {
            self.cur.skip_blanks();
            if self.cur.peek() == Some(b':')
                && matches!(self.cur.peek_at(1), None | Some(b' ' | b'\t' | b'\n' | b'\r'))
            {
                return self.parse_block_mapping(node, mark.col());
            }
        }
        Ok(node)
    }

    /// Parse a block mapping whose first key has been parsed; the cursor
    /// stands on the `:` following it.
    fn parse_block_mapping(&mut self, first_key: Node, map_col: usize) -> Result<Node, ScanError> {
        let mut node = Node::new(NodeKind::Mapping, first_key.line, first_key.column);
        node.tag = long_tag("!!map");
        let mut key = first_key;
        loop {
            let colon_mark = self.cur.mark();
            if self.cur.peek() != Some(b':') {
                return Err(ScanError::new_str(colon_mark, "could not find expected ':'"));
            }
            self.cur.bump();
            self.cur.skip_blanks();

            let mut value;
            let descended;
            if self.cur.at_line_end() || self.cur.peek() == Some(b'#') {
                key.line_comment = self.take_line_comment();
                self.last_content_line = self.cur.line();
                if !self.cur.is_eof() {
                    self.cur.skip_line();
                }
                let ahead = self.peek_content();
                let seq_value = !ahead.eof
                    && ahead.mark.col() == map_col
                    && self.cur.peek() == Some(b'-')
                    && matches!(self.cur.peek_at(1), None | Some(b' ' | b'\t' | b'\n' | b'\r'));
                if !ahead.eof
                    && !self.at_document_marker()
                    && (ahead.mark.col() > map_col || seq_value)
                {
                    value = self.parse_block_node(map_col, true)?;
                    descended = true;
                } else {
                    // Empty value.
                    let mut null = Node::new(NodeKind::Scalar, colon_mark.line(), colon_mark.col() + 1);
                    null.tag = long_tag("!!null");
                    value = null;
                    descended = true;
                    self.at_next_content = true;
                }
            } else {
                value = self.parse_block_node(map_col, false)?;
                descended = false;
            }
            if !self.at_next_content {
                self.last_content_line = self.cur.line();
                let lc = self.take_line_comment();
                if !lc.is_empty() {
                    if descended {
                        append_comment(&mut value.line_comment, &lc);
                    } else {
                        append_comment(&mut key.line_comment, &lc);
                    }
                }
                if !self.cur.is_eof() {
                    self.cur.skip_line();
                }
            }
            node.content.push(key);
            node.content.push(value);

            let ahead = self.peek_content();
            let ends = ahead.eof || self.at_document_marker() || ahead.mark.col() < map_col;
            let next_line = if ahead.eof { None } else { Some(ahead.mark.line()) };
            let foot = self.extract_foot(self.last_content_line, map_col, ends, next_line);
            if !foot.is_empty() {
                if let Some(last) = node.content.last_mut() {
                    append_comment(&mut last.foot_comment, &foot);
                }
            }
            if ends {
                self.at_next_content = true;
                return Ok(node);
            }
            if ahead.mark.col() > map_col {
                return Err(ScanError::new_str(
                    ahead.mark,
                    "mapping values are not allowed in this context",
                ));
            }
            key = self.parse_inline_key()?;
        }
    }

    /// Parse the key of a (non-first) block mapping entry, leaving the cursor
    /// on the `:` that follows it.
    fn parse_inline_key(&mut self) -> Result<Node, ScanError> {
        let head = self.take_head_comment();
        let prefix = self.parse_prefix()?;
        let mark = prefix.mark.unwrap_or_else(|| self.cur.mark());
        let Some(b) = self.cur.peek() else {
            return Err(ScanError::new_str(mark, "could not find expected ':'"));
        };
        let mut key = match b {
            b'"' | b'\'' => self.parse_quoted(b)?,
            b'{' => self.parse_flow_mapping()?,
            b'[' => self.parse_flow_sequence()?,
            b'*' => self.parse_alias()?,
            b'?' if matches!(self.cur.peek_at(1), None | Some(b' ' | b'\t' | b'\n' | b'\r')) => {
                return Err(ScanError::new_str(
                    mark,
                    "complex mapping keys are not supported",
                ))
            }
            _ => {
                let rest = self.cur.rest_of_line();
                let end = plain_end(rest);
                let Some(ci) = find_key_colon(&rest[..end]) else {
                    return Err(ScanError::new_str(mark, "could not find expected ':'"));
                };
                let text = rest[..ci].trim_end().to_owned();
                let mut key = self.make_plain_scalar(mark, text, &prefix);
                key.head_comment = head;
                self.cur.advance(ci);
                return Ok(key);
            }
        };
        key.line = mark.line();
        key.column = mark.col();
        key.head_comment = head;
        self.apply_prefix(&mut key, &prefix);
        self.cur.skip_blanks();
        if self.cur.peek() != Some(b':') {
            return Err(ScanError::new_str(
                self.cur.mark(),
                "could not find expected ':'",
            ));
        }
        Ok(key)
    }

    /// Parse a block sequence; the cursor stands on the first `-`.
    fn parse_block_sequence(&mut self, seq_col: usize) -> Result<Node, ScanError> {
        let mut node = Node::new(NodeKind::Sequence, self.cur.line(), self.cur.col());
        node.tag = long_tag("!!seq");
        loop {
            let dash_mark = self.cur.mark();
            self.cur.bump();
            self.cur.skip_blanks();

            let mut item;
            if self.cur.at_line_end() || self.cur.peek() == Some(b'#') {
                let lc = self.take_line_comment();
                self.last_content_line = self.cur.line();
                if !self.cur.is_eof() {
                    self.cur.skip_line();
                }
                let ahead = self.peek_content();
                if !ahead.eof && !self.at_document_marker() && ahead.mark.col() > seq_col {
                    item = self.parse_block_node(seq_col, true)?;
                } else {
                    let mut null =
                        Node::new(NodeKind::Scalar, dash_mark.line(), dash_mark.col() + 1);
                    null.tag = long_tag("!!null");
                    item = null;
                    self.at_next_content = true;
                }
                if !lc.is_empty() {
                    prepend_comment(&mut item.line_comment, &lc);
                }
            } else {
                item = self.parse_block_node(seq_col, true)?;
                if !self.at_next_content {
                    self.last_content_line = self.cur.line();
                    let lc = self.take_line_comment();
                    if !lc.is_empty() {
                        append_comment(&mut item.line_comment, &lc);
                    }
                    if !self.cur.is_eof() {
                        self.cur.skip_line();
                    }
                }
            }
            node.content.push(item);

            let ahead = self.peek_content();
            let more = !ahead.eof
                && !self.at_document_marker()
                && ahead.mark.col() == seq_col
                && self.cur.peek() == Some(b'-')
                && matches!(self.cur.peek_at(1), None | Some(b' ' | b'\t' | b'\n' | b'\r'));
            let next_line = if ahead.eof { None } else { Some(ahead.mark.line()) };
            let foot = self.extract_foot(self.last_content_line, seq_col, !more, next_line);
            if !foot.is_empty() {
                if let Some(last) = node.content.last_mut() {
                    append_comment(&mut last.foot_comment, &foot);
                }
            }
            if !more {
                self.at_next_content = true;
                return Ok(node);
            }
        }
    }

    // ---- scalars ----

    fn make_plain_scalar(&mut self, mark: Marker, text: String, prefix: &Prefix) -> Node {
        let mut node = Node::new(NodeKind::Scalar, mark.line(), mark.col());
        node.tag = resolve_plain_tag(&text);
        node.value = text;
        self.apply_prefix(&mut node, prefix);
        node
    }

    /// Parse a plain scalar in block context, folding continuation lines.
    fn parse_plain_scalar(
        &mut self,
        ctx_col: usize,
        mark: Marker,
        prefix: &Prefix,
    ) -> Result<Node, ScanError> {
        let rest = self.cur.rest_of_line();
        let end = plain_end(rest);
        let mut text = rest[..end].trim_end().to_owned();
        let had_comment = end < rest.len();
        self.cur.advance(end);

        if !had_comment {
            loop {
                let snapshot = self.cur;
                if self.cur.is_eof() {
                    break;
                }
                self.cur.skip_line();
                let mut blanks = 0usize;
                loop {
                    self.cur.skip_blanks();
                    if self.cur.at_line_end() && !self.cur.is_eof() {
                        self.cur.skip_line();
                        blanks += 1;
                    } else {
                        break;
                    }
                }
                if self.cur.is_eof()
                    || self.cur.col() <= ctx_col
                    || self.cur.peek() == Some(b'#')
                    || self.at_document_marker()
                {
                    self.cur = snapshot;
                    break;
                }
                let line = self.cur.rest_of_line();
                let line_end = plain_end(line);
                if find_key_colon(&line[..line_end]).is_some()
                    || (self.cur.peek() == Some(b'-')
                        && matches!(
                            self.cur.peek_at(1),
                            None | Some(b' ' | b'\t' | b'\n' | b'\r')
                        ))
                {
                    self.cur = snapshot;
                    break;
                }
                if blanks > 0 {
                    for _ in 0..blanks {
                        text.push('\n');
                    }
                } else {
                    text.push(' ');
                }
                text.push_str(line[..line_end].trim_end());
                let stop = line_end < line.len();
                self.cur.advance(line_end);
                if stop {
                    break;
                }
            }
        }

        let mut node = Node::new(NodeKind::Scalar, mark.line(), mark.col());
        node.tag = resolve_plain_tag(&text);
        node.value = text;
        self.apply_prefix(&mut node, prefix);
        self.at_next_content = false;
        Ok(node)
    }

    /// Parse a quoted scalar; the cursor stands on the opening quote.
    fn parse_quoted(&mut self, quote: u8) -> Result<Node, ScanError> {
        let mark = self.cur.mark();
        self.cur.bump();
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let Some(b) = self.cur.bump() else {
                return Err(ScanError::new_str(
                    mark,
                    "while scanning a quoted scalar, found unexpected end of stream",
                ));
            };
            match b {
                b'\'' if quote == b'\'' => {
                    if self.cur.peek() == Some(b'\'') {
                        self.cur.bump();
                        buf.push(b'\'');
                    } else {
                        break;
                    }
                }
                b'"' if quote == b'"' => break,
                b'\\' if quote == b'"' => self.scan_escape(&mut buf, mark)?,
                b'\n' => {
                    // Fold the line break.
                    while buf.last().is_some_and(|&b| is_blank(b)) {
                        buf.pop();
                    }
                    self.cur.skip_blanks();
                    if self.cur.at_line_end() {
                        buf.push(b'\n');
                    } else {
                        buf.push(b' ');
                    }
                }
                b'\r' => {}
                _ => buf.push(b),
            }
        }
        let mut node = Node::new(NodeKind::Scalar, mark.line(), mark.col());
        node.style = if quote == b'"' {
            Style::DOUBLE_QUOTED
        } else {
            Style::SINGLE_QUOTED
        };
        node.tag = long_tag("!!str");
        node.value = String::from_utf8_lossy(&buf).into_owned();
        self.at_next_content = false;
        Ok(node)
    }

    fn scan_escape(&mut self, buf: &mut Vec<u8>, start: Marker) -> Result<(), ScanError> {
        let Some(b) = self.cur.bump() else {
            return Err(ScanError::new_str(
                start,
                "while scanning a quoted scalar, found unexpected end of stream",
            ));
        };
        let simple = match b {
            b'0' => Some('\0'),
            b'a' => Some('\x07'),
            b'b' => Some('\x08'),
            b't' | b'\t' => Some('\t'),
            b'n' => Some('\n'),
            b'v' => Some('\x0b'),
            b'f' => Some('\x0c'),
            b'r' => Some('\r'),
            b'e' => Some('\x1b'),
            b' ' => Some(' '),
            b'"' => Some('"'),
            b'/' => Some('/'),
            b'\\' => Some('\\'),
            b'N' => Some('\u{85}'),
            b'_' => Some('\u{a0}'),
            b'L' => Some('\u{2028}'),
            b'P' => Some('\u{2029}'),
            b'\n' => {
                // Escaped line break: continue without folding.
                self.cur.skip_blanks();
                return Ok(());
            }
            _ => None,
        };
        if let Some(c) = simple {
            let mut tmp = [0u8; 4];
            buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
            return Ok(());
        }
        let width = match b {
            b'x' => 2,
            b'u' => 4,
            b'U' => 8,
            _ => {
                return Err(ScanError::new_str(self.cur.mark(), "unknown escape character"));
            }
        };
        let mut value: u32 = 0;
        for _ in 0..width {
            let Some(h) = self.cur.bump() else {
                return Err(ScanError::new_str(
                    start,
                    "while scanning a quoted scalar, found unexpected end of stream",
                ));
            };
            let digit = (h as char).to_digit(16).ok_or_else(|| {
                ScanError::new_str(self.cur.mark(), "invalid hex escape")
            })?;
            value = value * 16 + digit;
        }
        let c = char::from_u32(value)
            .ok_or_else(|| ScanError::new_str(self.cur.mark(), "invalid unicode escape"))?;
        let mut tmp = [0u8; 4];
        buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        Ok(())
    }

    /// Parse a literal or folded block scalar; the cursor stands on the
    /// `|` or `>` header.
    fn parse_block_scalar(&mut self, folded: bool, parent_col: usize) -> Result<Node, ScanError> {
        let mark = self.cur.mark();
        self.cur.bump();
        let mut explicit: Option<usize> = None;
        let mut chomp = Chomp::Clip;
        while let Some(b) = self.cur.peek() {
            match b {
                b'1'..=b'9' => explicit = Some(usize::from(b - b'0')),
                b'-' => chomp = Chomp::Strip,
                b'+' => chomp = Chomp::Keep,
                _ => break,
            }
            self.cur.bump();
        }
        self.cur.skip_blanks();
        let line_comment = if self.cur.peek() == Some(b'#') {
            self.take_line_comment()
        } else {
            String::new()
        };
        if !self.cur.at_line_end() {
            return Err(ScanError::new_str(
                self.cur.mark(),
                "expected a comment or a line break",
            ));
        }
        if !self.cur.is_eof() {
            self.cur.skip_line();
        }

        let mut indent = explicit.map(|d| parent_col + d);
        let mut lines: Vec<String> = Vec::new();
        loop {
            if self.cur.is_eof() {
                break;
            }
            let line = self.cur.rest_of_line();
            let nspaces = line.len() - line.trim_start_matches(' ').len();
            if line.trim().is_empty() {
                lines.push(String::new());
                self.cur.skip_line();
                continue;
            }
            if indent.is_none() {
                if nspaces + 1 <= parent_col {
                    break;
                }
                indent = Some(nspaces + 1);
            }
            let ind = indent.unwrap_or(1);
            if nspaces + 1 < ind {
                break;
            }
            lines.push(line[ind - 1..].to_owned());
            self.last_content_line = self.cur.line();
            self.cur.skip_line();
        }
        let mut trailing = 0usize;
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
            trailing += 1;
        }
        let body = if folded {
            fold_lines(&lines)
        } else {
            lines.join("\n")
        };
        let value = match chomp {
            Chomp::Strip => body,
            Chomp::Clip => {
                if body.is_empty() {
                    String::new()
                } else {
                    body + "\n"
                }
            }
            Chomp::Keep => {
                let mut v = body;
                if !v.is_empty() {
                    v.push('\n');
                }
                for _ in 0..trailing {
                    v.push('\n');
                }
                v
            }
        };

        let mut node = Node::new(NodeKind::Scalar, mark.line(), mark.col());
        node.style = if folded { Style::FOLDED } else { Style::LITERAL };
        node.tag = long_tag("!!str");
        node.value = value;
        node.line_comment = line_comment;
        self.at_next_content = true;
        Ok(node)
    }

    /// Parse an alias; the cursor stands on the `*`.
    fn parse_alias(&mut self) -> Result<Node, ScanError> {
        let mark = self.cur.mark();
        self.cur.bump();
        let name = self.cur.take_while(is_anchor_char).to_owned();
        if name.is_empty() {
            return Err(ScanError::new_str(
                mark,
                "while scanning an alias, did not find expected alphabetic or numeric character",
            ));
        }
        if !self.anchors.contains_key(&name) {
            return Err(ScanError::new(
                mark,
                format!("unknown anchor '{name}' referenced"),
            ));
        }
        let mut node = Node::new(NodeKind::Alias, mark.line(), mark.col());
        node.value = name;
        self.at_next_content = false;
        Ok(node)
    }

    // ---- flow context ----

    fn parse_flow_node(&mut self) -> Result<Node, ScanError> {
        let head = self.take_head_comment();
        let prefix = self.parse_prefix()?;
        self.skip_flow_ws("node content")?;
        let mark = prefix.mark.unwrap_or_else(|| self.cur.mark());
        let b = self.cur.peek().unwrap_or(b'\0');
        let mut node = match b {
            b'{' => self.parse_flow_mapping()?,
            b'[' => self.parse_flow_sequence()?,
            b'"' | b'\'' => self.parse_quoted(b)?,
            b'*' => self.parse_alias()?,
            b'}' | b']' | b',' | b':' => {
                // Missing node, e.g. `{a: , b: 1}`.
                let mut null = Node::new(NodeKind::Scalar, mark.line(), mark.col());
                null.tag = long_tag("!!null");
                null
            }
            _ => self.parse_flow_plain()?,
        };
        node.line = mark.line();
        node.column = mark.col();
        node.head_comment = head;
        if node.kind != NodeKind::Alias {
            self.apply_prefix(&mut node, &prefix);
        }
        Ok(node)
    }

    fn parse_flow_plain(&mut self) -> Result<Node, ScanError> {
        let mark = self.cur.mark();
        let mut end = 0usize;
        let rest = self.cur.rest_of_line();
        let bytes = rest.as_bytes();
        while end < bytes.len() {
            let b = bytes[end];
            if matches!(b, b',' | b'[' | b']' | b'{' | b'}') {
                break;
            }
            if b == b':'
                && bytes.get(end + 1).map_or(true, |&n| {
                    is_blank_or_break(n) || matches!(n, b',' | b'[' | b']' | b'{' | b'}')
                })
            {
                break;
            }
            if b == b'#' && end > 0 && is_blank(bytes[end - 1]) {
                break;
            }
            end += 1;
        }
        let text = rest[..end].trim_end().to_owned();
        self.cur.advance(end);
        let mut node = Node::new(NodeKind::Scalar, mark.line(), mark.col());
        node.style = Style::FLOW;
        node.tag = resolve_plain_tag(&text);
        node.value = text;
        self.at_next_content = false;
        Ok(node)
    }

    fn parse_flow_mapping(&mut self) -> Result<Node, ScanError> {
        let mark = self.cur.mark();
        self.cur.bump();
        let mut node = Node::new(NodeKind::Mapping, mark.line(), mark.col());
        node.style = Style::FLOW;
        node.tag = long_tag("!!map");
        loop {
            self.skip_flow_ws("',' or '}'")?;
            if self.cur.peek() == Some(b'}') {
                self.cur.bump();
                break;
            }
            let key = self.parse_flow_node()?;
            self.skip_flow_ws("',' or '}'")?;
            let value = if self.cur.peek() == Some(b':') {
                self.cur.bump();
                self.skip_flow_ws("',' or '}'")?;
                self.parse_flow_node()?
            } else {
                let mut null = Node::new(NodeKind::Scalar, key.line, key.column);
                null.tag = long_tag("!!null");
                null
            };
            node.content.push(key);
            node.content.push(value);
            self.skip_flow_ws("',' or '}'")?;
            match self.cur.peek() {
                Some(b',') => {
                    self.cur.bump();
                }
                Some(b'}') => {
                    self.cur.bump();
                    break;
                }
                _ => {
                    return Err(ScanError::new_str(
                        self.cur.mark(),
                        "did not find expected ',' or '}'",
                    ))
                }
            }
        }
        self.last_content_line = self.cur.line();
        self.at_next_content = false;
        Ok(node)
    }

    fn parse_flow_sequence(&mut self) -> Result<Node, ScanError> {
        let mark = self.cur.mark();
        self.cur.bump();
        let mut node = Node::new(NodeKind::Sequence, mark.line(), mark.col());
        node.style = Style::FLOW;
        node.tag = long_tag("!!seq");
        loop {
            self.skip_flow_ws("',' or ']'")?;
            if self.cur.peek() == Some(b']') {
                self.cur.bump();
                break;
            }
            let item = self.parse_flow_node()?;
            node.content.push(item);
            self.skip_flow_ws("',' or ']'")?;
            match self.cur.peek() {
                Some(b',') => {
                    self.cur.bump();
                }
                Some(b']') => {
                    self.cur.bump();
                    break;
                }
                _ => {
                    return Err(ScanError::new_str(
                        self.cur.mark(),
                        "did not find expected ',' or ']'",
                    ))
                }
            }
        }
        self.last_content_line = self.cur.line();
        self.at_next_content = false;
        Ok(node)
    }

    /// Skip whitespace, line breaks and comments inside a flow collection.
    fn skip_flow_ws(&mut self, expected: &str) -> Result<(), ScanError> {
        loop {
            self.cur.skip_blanks();
            match self.cur.peek() {
                None => {
                    return Err(ScanError::new(
                        self.cur.mark(),
                        format!("did not find expected {expected}"),
                    ))
                }
                Some(b'\n' | b'\r') => self.cur.skip_line(),
                Some(b'#') => {
                    let mark = self.cur.mark();
                    let text = self.cur.rest_of_line().to_owned();
                    self.runs.push(CommentRun {
                        lines: vec![text],
                        start_line: mark.line(),
                        end_line: mark.line(),
                        col: mark.col(),
                    });
                    self.cur.skip_line();
                }
                Some(_) => return Ok(()),
            }
        }
    }

    // ---- prefixes ----

    /// Parse any `&anchor` / `!tag` prefix in front of a node.
    fn parse_prefix(&mut self) -> Result<Prefix, ScanError> {
        let mut prefix = Prefix::default();
        loop {
            match self.cur.peek() {
                Some(b'&') => {
                    let mark = self.cur.mark();
                    if prefix.mark.is_none() {
                        prefix.mark = Some(mark);
                    }
                    self.cur.bump();
                    let name = self.cur.take_while(is_anchor_char).to_owned();
                    if name.is_empty() {
                        return Err(ScanError::new_str(
                            mark,
                            "while scanning an anchor, did not find expected alphabetic or numeric character",
                        ));
                    }
                    self.anchors.insert(name.clone(), mark);
                    prefix.anchor = name;
                    self.cur.skip_blanks();
                }
                Some(b'!') => {
                    let mark = self.cur.mark();
                    if prefix.mark.is_none() {
                        prefix.mark = Some(mark);
                    }
                    self.cur.bump();
                    prefix.tag = match self.cur.peek() {
                        Some(b'<') => {
                            self.cur.bump();
                            let verbatim = self.cur.take_while(|b| b != b'>').to_owned();
                            if self.cur.peek() != Some(b'>') {
                                return Err(ScanError::new_str(
                                    mark,
                                    "while scanning a tag, did not find expected '>'",
                                ));
                            }
                            self.cur.bump();
                            verbatim
                        }
                        Some(b'!') => {
                            self.cur.bump();
                            let suffix = self.cur.take_while(is_tag_char);
                            format!("{LONG_TAG_PREFIX}{suffix}")
                        }
                        _ => {
                            let suffix = self.cur.take_while(is_tag_char);
                            if suffix.is_empty() {
                                "!".to_owned()
                            } else {
                                format!("!{suffix}")
                            }
                        }
                    };
                    self.cur.skip_blanks();
                }
                _ => break,
            }
        }
        Ok(prefix)
    }

    /// Apply an anchor/tag prefix to a freshly parsed node.
    fn apply_prefix(&mut self, node: &mut Node, prefix: &Prefix) {
        if !prefix.anchor.is_empty() {
            node.anchor = prefix.anchor.clone();
        }
        if prefix.tag.is_empty() {
            return;
        }
        node.style |= Style::TAGGED;
        node.tag = if prefix.tag == "!" {
            // The non-specific tag resolves to the kind's default, except on
            // `<<` where it must stay distinguishable for merge handling.
            if node.kind == NodeKind::Scalar && node.value == "<<" {
                "!".to_owned()
            } else {
                match node.kind {
                    NodeKind::Mapping => long_tag("!!map"),
                    NodeKind::Sequence => long_tag("!!seq"),
                    _ => long_tag("!!str"),
                }
            }
        } else {
            prefix.tag.clone()
        };
    }

    // ---- document markers ----

    fn marker_is(&self, marker: &str) -> bool {
        self.cur.col() == 1
            && self.cur.starts_with(marker)
            && matches!(self.cur.peek_at(3), None | Some(b' ' | b'\t' | b'\n' | b'\r'))
    }

    fn at_document_marker(&self) -> bool {
        self.marker_is("---") || self.marker_is("...")
    }
}

#[derive(Clone, Copy)]
enum Chomp {
    Strip,
    Clip,
    Keep,
}

/// Find the `:` that separates a key from its value on this line, if any.
fn find_key_colon(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' && bytes.get(i + 1).map_or(true, |&n| is_blank(n)) {
            return Some(i);
        }
        if b == b'#' && i > 0 && is_blank(bytes[i - 1]) {
            return None;
        }
    }
    None
}

/// Where plain-scalar content on this line stops: at a ` #` comment or the
/// end of the line.
fn plain_end(line: &str) -> usize {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && i > 0 && is_blank(bytes[i - 1]) {
            return i;
        }
    }
    bytes.len()
}

/// Folding for `>` block scalars: single breaks between regular lines become
/// spaces, blank lines and more-indented lines keep their breaks.
fn fold_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut prev_empty = true;
    let mut prev_more_indented = false;
    for (i, line) in lines.iter().enumerate() {
        let more = line.starts_with(' ') || line.starts_with('\t');
        if i > 0 {
            if line.is_empty() {
                out.push('\n');
            } else if prev_empty {
                // The blank run already emitted its breaks.
            } else if more || prev_more_indented {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(line);
        prev_empty = line.is_empty();
        prev_more_indented = more;
    }
    out
}

fn append_comment(slot: &mut String, comment: &str) {
    if slot.is_empty() {
        *slot = comment.to_owned();
    } else {
        slot.push('\n');
        slot.push_str(comment);
    }
}

fn prepend_comment(slot: &mut String, comment: &str) {
    if comment.is_empty() {
        return;
    }
    if slot.is_empty() {
        *slot = comment.to_owned();
    } else {
        *slot = format!("{comment}\n{slot}");
    }
}

#[cfg(test)]
mod test {
    use super::{find_key_colon, fold_lines, plain_end};

    #[test]
    fn test_find_key_colon() {
        assert_eq!(find_key_colon("a: 1"), Some(1));
        assert_eq!(find_key_colon("foo bar: 1"), Some(7));
        assert_eq!(find_key_colon("a:b: c"), Some(3));
        assert_eq!(find_key_colon("http://x"), None);
        assert_eq!(find_key_colon("a:"), Some(1));
        assert_eq!(find_key_colon("a #b: c"), None);
    }

    #[test]
    fn test_plain_end() {
        assert_eq!(plain_end("value # comment"), 6);
        assert_eq!(plain_end("value#nocomment"), 15);
    }

    #[test]
    fn test_fold() {
        let lines: Vec<String> = ["a", "b"].iter().map(|s| (*s).to_owned()).collect();
        assert_eq!(fold_lines(&lines), "a b");
        let lines: Vec<String> = ["a", "", "b"].iter().map(|s| (*s).to_owned()).collect();
        assert_eq!(fold_lines(&lines), "a\nb");
    }
}
