//! Decoding YAML documents into CUE-like expressions.
//!
//! The decoder pulls one document at a time from the YAML layer and walks
//! its node tree, building expressions that a formatter can print as
//! natural-looking CUE: scalar tags become typed literals, `<<` merge keys
//! are expanded, anchors are materialized at their alias sites, comments are
//! re-attached, and every token is given a position with a relative
//! whitespace classification, including the braces and brackets that have no
//! counterpart in the YAML bytes.

#![allow(clippy::cast_possible_wrap)]

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;

use base64::Engine as _;
use hashlink::LinkedHashMap;
use regex::Regex;

use cueyaml_parser::{Node, NodeKind, Parser, ScanError};

use crate::ast::{
    BasicLit, BinaryExpr, Comment, CommentGroup, Expr, Field, Ident, Label, ListLit, LitKind, Op,
    StructLit, UnaryExpr,
};
use crate::errors::{Error, ErrorKind};
use crate::literal;
use crate::source::{scan_to_close, LineIndex};
use crate::token::{Pos, RelPos};

/// A decoding session over one buffered YAML source.
///
/// A decoder is owned by one caller; it is not safe for concurrent use, as
/// the position cursor and comment queue are mutated during the walk.
pub struct Decoder<'a> {
    filename: String,
    src: &'a str,
    lines: LineIndex<'a>,
    parser: Parser<'a>,
    /// Whether any document has been pulled from the parser.
    yaml_non_empty: bool,
    /// Sticky terminal error.
    decode_err: Option<Error>,
    /// Latched end of stream.
    eof: bool,
    /// Head comments waiting for the next created node.
    pending: Vec<CommentGroup>,
    /// Aliases currently being expanded, for cycle detection.
    extracting_aliases: HashSet<String>,
    /// Anchor values seen so far in the current document.
    anchors: LinkedHashMap<String, Node>,
    /// Highest byte offset a position has been emitted for; -1 before the
    /// first one.
    last_offset: isize,
    /// The next emitted position must carry `Newline`.
    force_newline: bool,
    /// Exclusive byte offset bounding the current node's extent.
    scope_end: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder for `src`, which must be UTF-8 text without a BOM.
    /// `filename` is used in error messages.
    #[must_use]
    pub fn new(filename: &str, src: &'a str) -> Decoder<'a> {
        Decoder {
            filename: filename.to_owned(),
            src,
            lines: LineIndex::new(src),
            parser: Parser::new(src),
            yaml_non_empty: false,
            decode_err: None,
            eof: false,
            pending: Vec::new(),
            extracting_aliases: HashSet::new(),
            anchors: LinkedHashMap::new(),
            last_offset: -1,
            force_newline: false,
            scope_end: src.len(),
        }
    }

    /// Decode the next document.
    ///
    /// Returns `Ok(None)` at the end of the stream; the end is latched, as
    /// is the first error. An empty stream yields one synthetic `*null | _`
    /// expression before the end.
    ///
    /// # Errors
    /// Returns a positioned [`Error`] when the document cannot be decoded.
    pub fn decode(&mut self) -> Result<Option<Expr>, Error> {
        if let Some(err) = &self.decode_err {
            return Err(err.clone());
        }
        if self.eof {
            return Ok(None);
        }
        match self.parser.next_document() {
            Err(scan) => {
                let err = self.scan_error(&scan);
                self.decode_err = Some(err.clone());
                Err(err)
            }
            Ok(None) => {
                self.eof = true;
                if self.yaml_non_empty {
                    Ok(None)
                } else {
                    Ok(Some(empty_stream_expr()))
                }
            }
            Ok(Some(doc)) => {
                self.yaml_non_empty = true;
                self.anchors.clear();
                self.scope_end = self.src.len();
                match self.extract(&doc) {
                    Ok(mut expr) => {
                        self.flush_leftovers(expr.comments_mut());
                        Ok(Some(expr))
                    }
                    Err(err) => {
                        self.decode_err = Some(err.clone());
                        Err(err)
                    }
                }
            }
        }
    }

    // ---- errors ----

    fn node_error(&self, yn: &Node, kind: ErrorKind) -> Error {
        Error::new(&self.filename, Some(yn.line), kind)
    }

    /// Re-prefix an error from the YAML layer with the filename, keeping the
    /// reported line when the message carries one.
    fn scan_error(&self, err: &ScanError) -> Error {
        let msg = err.to_string();
        if let Some(rest) = msg.strip_prefix("yaml: line ") {
            if let Some((num, tail)) = rest.split_once(": ") {
                if let Ok(line) = num.parse::<usize>() {
                    return Error::new(&self.filename, Some(line), ErrorKind::Parse(tail.to_owned()));
                }
            }
        }
        if let Some(rest) = msg.strip_prefix("yaml: ") {
            return Error::new(&self.filename, None, ErrorKind::Parse(rest.to_owned()));
        }
        Error::new(&self.filename, None, ErrorKind::Parse(msg))
    }

    // ---- positions ----

    fn offset_of(&self, yn: &Node) -> usize {
        self.lines.line_start(yn.line) + yn.column - 1
    }

    /// Emit a position for `offset`, classifying its relation to the
    /// previously emitted one. Offsets behind the cursor yield the invalid
    /// position and leave the cursor untouched.
    fn pos(&mut self, offset: usize) -> Pos {
        if (offset as isize) < self.last_offset {
            debug_print!("cueyaml: position regression to offset {offset}");
            return Pos::none();
        }
        let line = self.lines.offset_to_line(offset);
        let rel = if self.force_newline {
            self.force_newline = false;
            RelPos::Newline
        } else if self.last_offset < 0 {
            RelPos::NoRel
        } else {
            #[allow(clippy::cast_sign_loss)]
            let prev = self.lines.offset_to_line(self.last_offset as usize);
            if line >= prev + 2 {
                RelPos::NewSection
            } else if line == prev + 1 {
                RelPos::Newline
            } else if offset as isize > self.last_offset {
                RelPos::Blank
            } else {
                RelPos::NoSpace
            }
        };
        self.last_offset = offset as isize;
        let column = offset - self.lines.line_start(line) + 1;
        Pos::new(offset, line, column, rel)
    }

    /// Emit a position and force its relation.
    fn pos_forced(&mut self, offset: usize, rel: RelPos) -> Pos {
        let p = self.pos(offset);
        if p.is_valid() {
            p.with_rel(rel)
        } else {
            p
        }
    }

    /// Construct a position at `offset` without moving the cursor. Used when
    /// rebasing braces onto an alias site.
    fn pos_at(&self, offset: usize, rel: RelPos) -> Pos {
        let line = self.lines.offset_to_line(offset);
        let column = offset - self.lines.line_start(line) + 1;
        Pos::new(offset, line, column, rel)
    }

    /// Where a node's syntactic content starts, bypassing any `&name` anchor
    /// prefix. For flow nodes this scans for the opening delimiter.
    fn content_offset(&self, yn: &Node, open: u8) -> usize {
        let bytes = self.src.as_bytes();
        let mut off = self.offset_of(yn);
        if yn.style.is_flow() {
            while off < bytes.len() && bytes[off] != open {
                off += 1;
            }
            return off;
        }
        if bytes.get(off) == Some(&b'&') {
            off += 1;
            while off < bytes.len() && is_anchor_byte(bytes[off]) {
                off += 1;
            }
        }
        while off < bytes.len() && matches!(bytes[off], b' ' | b'\t') {
            off += 1;
        }
        if off < bytes.len() && matches!(bytes[off], b'\n' | b'\r') {
            while off < bytes.len() && bytes[off].is_ascii_whitespace() {
                off += 1;
            }
        }
        off
    }

    /// The exclusive offset at which the node preceding `yn` ends: the start
    /// of the first line that is neither a blank line directly above `yn`
    /// nor one of its head-comment lines. Keeps the next sibling's head
    /// comments out of the current node's closing-brace extent.
    fn scope_end_before(&self, yn: &Node) -> usize {
        let mut line = yn.line;
        while line > 1
            && (self.lines.is_comment_line(line - 1) || self.lines.is_blank_line(line - 1))
        {
            line -= 1;
        }
        self.lines.line_start(line)
    }

    // ---- comments ----

    /// Comments are suppressed while expanding aliases: the anchor site
    /// already received them, and each comment must appear exactly once.
    fn comments_suppressed(&self) -> bool {
        !self.extracting_aliases.is_empty()
    }

    /// Queue a node's head comments for the next created node, marking a
    /// section break when the comment block sits apart from its predecessor.
    fn queue_head_comments(&mut self, yn: &Node) {
        if yn.head_comment.is_empty() || self.comments_suppressed() {
            return;
        }
        let mut list = comment_list(&yn.head_comment);
        if self.pending.is_empty() && self.last_offset >= 0 {
            #[allow(clippy::cast_sign_loss)]
            let prev_line = self.lines.offset_to_line(self.last_offset as usize);
            // The YAML layer does not report comment positions; the first
            // comment line is approximated from the node's own line.
            let first_line = yn.line.saturating_sub(list.len());
            if first_line >= prev_line + 2 {
                list[0].slash = Pos::relation(RelPos::NewSection);
            }
        }
        self.pending.push(CommentGroup {
            doc: true,
            line: false,
            position: 0,
            list,
        });
    }

    /// Flush queued head comments onto a freshly created node.
    fn flush_pending(&mut self, target: &mut Vec<CommentGroup>) {
        target.append(&mut self.pending);
    }

    /// Flush comments that were queued during a container's children but
    /// never claimed; they can only sit after the container's contents.
    fn flush_leftovers(&mut self, target: &mut Vec<CommentGroup>) {
        for mut group in self.pending.drain(..) {
            group.doc = false;
            group.position = 100;
            target.push(group);
        }
    }

    fn attach_line_comment(&self, yn: &Node, target: &mut Vec<CommentGroup>, position: i8) {
        if yn.line_comment.is_empty() || self.comments_suppressed() {
            return;
        }
        target.push(CommentGroup {
            doc: false,
            line: true,
            position,
            list: comment_list(&yn.line_comment),
        });
    }

    /// Foot comments have an after-node slot only on struct literals; for
    /// every other node they ride along to the next node's head.
    fn route_foot(&mut self, yn: &Node, expr: &mut Expr) {
        if yn.foot_comment.is_empty() || self.comments_suppressed() {
            return;
        }
        let list = comment_list(&yn.foot_comment);
        if let Expr::Struct(st) = expr {
            st.comments.push(CommentGroup {
                doc: false,
                line: false,
                position: 100,
                list,
            });
        } else {
            self.pending.push(CommentGroup {
                doc: true,
                line: false,
                position: 0,
                list,
            });
        }
    }

    fn route_key_foot(&mut self, key: &Node) {
        if key.foot_comment.is_empty() || self.comments_suppressed() {
            return;
        }
        let list = comment_list(&key.foot_comment);
        self.pending.push(CommentGroup {
            doc: true,
            line: false,
            position: 0,
            list,
        });
    }

    // ---- the tree walk ----

    fn extract(&mut self, yn: &Node) -> Result<Expr, Error> {
        self.queue_head_comments(yn);
        if !yn.anchor.is_empty() {
            self.anchors.insert(yn.anchor.clone(), yn.clone());
        }
        match yn.kind {
            NodeKind::Document => match yn.content.first() {
                Some(root) => self.extract(root),
                None => Err(self.node_error(yn, ErrorKind::Parse("empty document node".into()))),
            },
            NodeKind::Mapping => self.mapping(yn),
            NodeKind::Sequence => self.sequence(yn),
            NodeKind::Scalar => {
                let mut expr = self.scalar(yn)?;
                self.flush_pending(expr.comments_mut());
                self.attach_line_comment(yn, expr.comments_mut(), 1);
                self.route_foot(yn, &mut expr);
                Ok(expr)
            }
            NodeKind::Alias => self.alias(yn),
        }
    }

    // ---- scalars ----

    fn scalar(&mut self, yn: &Node) -> Result<Expr, Error> {
        let mut tag = yn.short_tag();
        let v = yn.value.as_str();
        // A YAML 1.1 parser types `01289` as a float because it is not
        // valid octal. Reclassify such scalars as strings.
        if !yn.style.is_tagged() && tag == "!!float" && octal_like(v) {
            tag = "!!str".to_owned();
        }
        let pos = self.pos(self.offset_of(yn));
        match tag.as_str() {
            "!!str" | "!!timestamp" => Ok(Expr::BasicLit(BasicLit::new(
                LitKind::Str,
                pos,
                literal::quote_str(v),
            ))),
            "!!binary" => {
                let stripped: String = v.chars().filter(|c| !c.is_whitespace()).collect();
                let data = base64::engine::general_purpose::STANDARD
                    .decode(stripped)
                    .map_err(|_| self.node_error(yn, ErrorKind::InvalidBase64))?;
                Ok(Expr::BasicLit(BasicLit::new(
                    LitKind::Str,
                    pos,
                    literal::quote_bytes(&data),
                )))
            }
            "!!bool" => {
                if matches!(v, "true" | "True" | "TRUE") {
                    Ok(Expr::BasicLit(BasicLit::new(LitKind::True, pos, "true")))
                } else {
                    Ok(Expr::BasicLit(BasicLit::new(LitKind::False, pos, "false")))
                }
            }
            "!!int" => self.int_value(yn, pos, v),
            "!!float" => self.float_value(yn, pos, v),
            "!!null" => Ok(Expr::BasicLit(BasicLit::new(LitKind::Null, pos, "null"))),
            _ => Err(self.node_error(yn, ErrorKind::UnsupportedTag(tag))),
        }
    }

    fn int_value(&self, yn: &Node, pos: Pos, v: &str) -> Result<Expr, Error> {
        if let Some(rest) = v.strip_prefix('-') {
            let x = self.int_lit(yn, pos, rest)?;
            return Ok(negate(pos, x));
        }
        let v = v.strip_prefix('+').unwrap_or(v);
        self.int_lit(yn, pos, v)
    }

    fn int_lit(&self, yn: &Node, pos: Pos, v: &str) -> Result<Expr, Error> {
        // YAML 1.1 writes octals with a bare leading zero.
        let text = match v.as_bytes() {
            [b'0', d, ..] if d.is_ascii_digit() => format!("0o{}", &v[1..]),
            _ => v.to_owned(),
        };
        match literal::parse_num(&text) {
            Ok(info) if info.is_int => Ok(Expr::BasicLit(BasicLit::new(LitKind::Int, pos, text))),
            Ok(_) => Err(self.number_error(yn, "!!int", "value is not an integer")),
            Err(reason) => Err(self.number_error(yn, "!!int", &reason)),
        }
    }

    fn float_value(&self, yn: &Node, pos: Pos, v: &str) -> Result<Expr, Error> {
        let (expr, integral) = self.float_body(yn, pos, v)?;
        if integral && yn.style.is_tagged() {
            // An explicit `!!float 1` stays a float-typed number while
            // keeping its textual value. The wrap goes around the whole
            // (possibly negated) literal; a unary operand must stay a basic
            // literal.
            return Ok(Expr::Binary(BinaryExpr {
                x: Box::new(Expr::Ident(Ident::new(pos, "number"))),
                op: Op::And,
                op_pos: pos,
                y: Box::new(expr),
                comments: Vec::new(),
            }));
        }
        Ok(expr)
    }

    /// The literal (or sign-wrapped literal) for a float scalar, plus
    /// whether its text is integral.
    fn float_body(&self, yn: &Node, pos: Pos, v: &str) -> Result<(Expr, bool), Error> {
        match v {
            ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
                return Ok((Expr::BasicLit(BasicLit::new(LitKind::Float, pos, "+Inf")), false));
            }
            "-.inf" | "-.Inf" | "-.INF" => {
                return Ok((Expr::BasicLit(BasicLit::new(LitKind::Float, pos, "-Inf")), false));
            }
            ".nan" | ".NaN" | ".NAN" => {
                return Ok((Expr::BasicLit(BasicLit::new(LitKind::Float, pos, "NaN")), false));
            }
            _ => {}
        }
        if let Some(rest) = v.strip_prefix('-') {
            let (x, integral) = self.float_body(yn, pos, rest)?;
            return Ok((negate(pos, x), integral));
        }
        if let Some(rest) = v.strip_prefix('+') {
            return self.float_body(yn, pos, rest);
        }
        let info = literal::parse_num(v)
            .map_err(|reason| self.number_error(yn, "!!float", &reason))?;
        Ok((
            Expr::BasicLit(BasicLit::new(LitKind::Float, pos, v)),
            info.is_int,
        ))
    }

    fn number_error(&self, yn: &Node, tag: &str, reason: &str) -> Error {
        self.node_error(
            yn,
            ErrorKind::InvalidNumber {
                value: yn.value.clone(),
                tag: tag.to_owned(),
                reason: reason.to_owned(),
            },
        )
    }

    // ---- labels ----

    fn label(&mut self, yn: &Node) -> Result<Label, Error> {
        if yn.kind != NodeKind::Scalar {
            let what = {
                let tag = yn.short_tag();
                if tag.is_empty() {
                    yn.kind.name().to_owned()
                } else {
                    tag
                }
            };
            return Err(self.node_error(yn, ErrorKind::InvalidKey(what)));
        }
        // Keys are always normalized to string labels; a null key reads as
        // the literal label "null".
        let text = if yn.short_tag() == "!!null" {
            "null".to_owned()
        } else {
            yn.value.clone()
        };
        if text.contains('\n') {
            return Err(self.node_error(yn, ErrorKind::InvalidLabel(text)));
        }
        let pos = self.pos(self.offset_of(yn));
        if literal::is_valid_ident(&text) {
            Ok(Label::Ident(Ident::new(pos, text)))
        } else {
            Ok(Label::String(BasicLit::new(
                LitKind::Str,
                pos,
                literal::quote_str(&text),
            )))
        }
    }

    // ---- containers ----

    fn mapping(&mut self, yn: &Node) -> Result<Expr, Error> {
        let lbrace = {
            let off = self.content_offset(yn, b'{');
            self.pos_forced(off, RelPos::Blank)
        };
        let multiline = yn.content.last().map_or(false, |last| yn.line < last.line);
        if multiline {
            self.force_newline = true;
        }
        let mut st = StructLit {
            lbrace,
            elts: Vec::new(),
            rbrace: Pos::none(),
            comments: Vec::new(),
        };
        self.insert_map(yn, &mut st, false)?;

        if yn.style.is_flow() {
            #[allow(clippy::cast_sign_loss)]
            let start = if st.elts.is_empty() {
                lbrace.offset + 1
            } else {
                self.last_offset.max(0) as usize
            };
            let close = scan_to_close(self.src, start, b'}');
            st.rbrace = self.pos(close);
            self.last_offset = (close + 1) as isize;
        } else if st.elts.is_empty() {
            st.rbrace = lbrace;
        } else {
            let rel = if multiline {
                RelPos::Newline
            } else {
                RelPos::Blank
            };
            st.rbrace = self.pos_forced(self.scope_end.saturating_sub(1), rel);
        }

        let empty = st.elts.is_empty();
        let mut expr = Expr::Struct(st);
        if empty {
            self.flush_pending(expr.comments_mut());
        } else {
            self.flush_leftovers(expr.comments_mut());
        }
        self.attach_line_comment(yn, expr.comments_mut(), 1);
        self.route_foot(yn, &mut expr);
        Ok(expr)
    }

    /// Insert the pairs of `yn` into `st`.
    ///
    /// `merge_values` is set once a `<<` key has been seen (and from the
    /// start for entries arriving through a merge): under it, a key whose
    /// label already exists replaces the existing field's value in place.
    /// Combined with the reverse iteration in [`Decoder::merge`], earlier
    /// entries of a merged sequence take precedence, and explicit keys
    /// following a `<<` override what the merge brought in.
    fn insert_map(
        &mut self,
        yn: &Node,
        st: &mut StructLit,
        mut merge_values: bool,
    ) -> Result<(), Error> {
        let parent_end = self.scope_end;
        let content = &yn.content;
        let mut i = 0;
        while i + 1 < content.len() {
            let key = &content[i];
            let value = &content[i + 1];
            i += 2;

            if key.is_merge_key() {
                merge_values = true;
                self.merge(value, st)?;
                continue;
            }

            // Comment routing self-suppresses while an alias is being
            // expanded, so merged-in entries do not duplicate the comments
            // already attached at the anchor site.
            self.queue_head_comments(key);
            let label = self.label(key)?;
            let mut fcomments = Vec::new();
            self.flush_pending(&mut fcomments);
            self.attach_line_comment(key, &mut fcomments, 2);

            if let Some(next_key) = content.get(i) {
                self.scope_end = self.scope_end_before(next_key);
            } else {
                self.scope_end = parent_end;
            }
            let value_expr = self.extract(value)?;
            self.scope_end = parent_end;

            let field = Field {
                label,
                value: value_expr,
                comments: fcomments,
            };
            self.route_key_foot(key);

            let existing = if merge_values {
                st.elts
                    .iter()
                    .position(|f| f.label.text() == field.label.text())
            } else {
                None
            };
            match existing {
                Some(idx) => st.elts[idx].value = field.value,
                None => st.elts.push(field),
            }
        }
        self.scope_end = parent_end;
        Ok(())
    }

    /// Expand a `<<` merge value into `st`.
    fn merge(&mut self, yn: &Node, st: &mut StructLit) -> Result<(), Error> {
        match yn.kind {
            NodeKind::Mapping => self.insert_map(yn, st, true),
            NodeKind::Alias => {
                let name = yn.value.clone();
                if self.extracting_aliases.contains(&name) {
                    return Err(self.node_error(yn, ErrorKind::AnchorCycle(name)));
                }
                let Some(target) = self.anchors.get(&name).cloned() else {
                    return Err(self.node_error(
                        yn,
                        ErrorKind::Parse(format!("unknown anchor '{name}' referenced")),
                    ));
                };
                if target.kind != NodeKind::Mapping {
                    return Err(self.node_error(yn, ErrorKind::InvalidMerge));
                }
                self.extracting_aliases.insert(name.clone());
                // The anchor definition lies earlier in the source; as in
                // `alias`, expand it with a fresh position cursor so the
                // merged fields keep valid anchor-site positions.
                let saved_offset = self.last_offset;
                let saved_newline = self.force_newline;
                let saved_scope = self.scope_end;
                self.last_offset = -1;
                self.force_newline = false;
                let result = self.insert_map(&target, st, true);
                self.last_offset = saved_offset;
                self.force_newline = saved_newline;
                self.scope_end = saved_scope;
                self.extracting_aliases.remove(&name);
                result
            }
            NodeKind::Sequence => {
                // Earlier entries take precedence, so merge in reverse.
                for item in yn.content.iter().rev() {
                    self.merge(item, st)?;
                }
                Ok(())
            }
            _ => Err(self.node_error(yn, ErrorKind::InvalidMerge)),
        }
    }

    fn sequence(&mut self, yn: &Node) -> Result<Expr, Error> {
        let lbrack = {
            let off = self.content_offset(yn, b'[');
            self.pos_forced(off, RelPos::Blank)
        };
        let multiline = yn.content.last().map_or(false, |last| yn.line < last.line);
        if multiline {
            self.force_newline = true;
        }
        let parent_end = self.scope_end;
        let mut elts = Vec::new();
        for (i, item) in yn.content.iter().enumerate() {
            if let Some(next) = yn.content.get(i + 1) {
                self.scope_end = self.scope_end_before(next);
            } else {
                self.scope_end = parent_end;
            }
            elts.push(self.extract(item)?);
        }
        self.scope_end = parent_end;

        let mut list = ListLit {
            lbrack,
            elts,
            rbrack: Pos::none(),
            comments: Vec::new(),
        };
        if yn.style.is_flow() {
            #[allow(clippy::cast_sign_loss)]
            let start = if list.elts.is_empty() {
                lbrack.offset + 1
            } else {
                self.last_offset.max(0) as usize
            };
            let close = scan_to_close(self.src, start, b']');
            list.rbrack = self.pos(close);
            self.last_offset = (close + 1) as isize;
        } else if list.elts.is_empty() {
            list.rbrack = lbrack;
        } else {
            // `[{…}]` closes on the struct's line; everything else gets its
            // own line in multi-line form.
            let close_same_line = matches!(list.elts.last(), Some(Expr::Struct(_)));
            let rel = if multiline && !close_same_line {
                RelPos::Newline
            } else {
                RelPos::Blank
            };
            list.rbrack = self.pos_forced(self.scope_end.saturating_sub(1), rel);
        }

        let empty = list.elts.is_empty();
        let mut expr = Expr::List(list);
        if empty {
            self.flush_pending(expr.comments_mut());
        } else {
            self.flush_leftovers(expr.comments_mut());
        }
        self.attach_line_comment(yn, expr.comments_mut(), 1);
        self.route_foot(yn, &mut expr);
        Ok(expr)
    }

    // ---- aliases ----

    fn alias(&mut self, yn: &Node) -> Result<Expr, Error> {
        let name = yn.value.clone();
        if self.extracting_aliases.contains(&name) {
            return Err(self.node_error(yn, ErrorKind::AnchorCycle(name)));
        }
        let Some(target) = self.anchors.get(&name).cloned() else {
            return Err(self.node_error(
                yn,
                ErrorKind::Parse(format!("unknown anchor '{name}' referenced")),
            ));
        };
        self.extracting_aliases.insert(name.clone());
        // The anchor definition lies earlier in the source; expand it with a
        // fresh position cursor so the target's own extents are used, then
        // restore the outer frame.
        let saved_offset = self.last_offset;
        let saved_newline = self.force_newline;
        let saved_scope = self.scope_end;
        self.last_offset = -1;
        self.force_newline = false;
        let result = self.extract(&target);
        self.last_offset = saved_offset;
        self.force_newline = saved_newline;
        self.scope_end = saved_scope;
        self.extracting_aliases.remove(&name);

        let mut expr = result?;
        // Containers keep their shape but are repositioned at the `*name`
        // use site.
        let alias_off = self.offset_of(yn);
        match &mut expr {
            Expr::Struct(st) => {
                st.lbrace = self.pos_at(alias_off, RelPos::Blank);
                st.rbrace = self.pos_at(alias_off + name.len(), RelPos::Blank);
            }
            Expr::List(list) => {
                list.lbrack = self.pos_at(alias_off, RelPos::Blank);
                list.rbrack = self.pos_at(alias_off + name.len(), RelPos::Blank);
            }
            _ => {}
        }
        Ok(expr)
    }
}

/// `*null | _`, the representation of an entirely empty stream.
fn empty_stream_expr() -> Expr {
    let pos = Pos::new(0, 1, 1, RelPos::NoRel);
    Expr::Binary(BinaryExpr {
        x: Box::new(Expr::Unary(UnaryExpr {
            op: Op::Mul,
            op_pos: pos,
            x: Box::new(Expr::BasicLit(BasicLit::new(LitKind::Null, pos, "null"))),
            comments: Vec::new(),
        })),
        op: Op::Or,
        op_pos: pos,
        y: Box::new(Expr::Ident(Ident::new(pos, "_"))),
        comments: Vec::new(),
    })
}

fn negate(pos: Pos, x: Expr) -> Expr {
    Expr::Unary(UnaryExpr {
        op: Op::Sub,
        op_pos: pos,
        x: Box::new(x),
        comments: Vec::new(),
    })
}

fn is_anchor_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b',' | b'[' | b']' | b'{' | b'}')
}

/// Turn a block of `#` comment lines into `//` comments.
fn comment_list(text: &str) -> Vec<Comment> {
    text.split('\n')
        .map(|line| {
            let line = line.trim_start();
            let body = line.strip_prefix('#').unwrap_or(line);
            Comment {
                slash: Pos::none(),
                text: format!("//{body}"),
            }
        })
        .collect()
}

fn octal_like(v: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?0[0-9_]+$").expect("octal pattern is valid"))
        .is_match(v)
}

/// Decode a buffer expected to hold exactly one YAML document.
///
/// An empty buffer decodes to `*null | _`.
///
/// # Errors
/// Returns an error when the input is malformed or holds more than one
/// document.
pub fn unmarshal(filename: &str, data: &[u8]) -> Result<Expr, Error> {
    let src = input_to_str(filename, data)?;
    let mut decoder = Decoder::new(filename, &src);
    let Some(expr) = decoder.decode()? else {
        // The first pull either yields a document, synthesizes the
        // empty-stream expression, or errors.
        return Err(Error::new(
            filename,
            None,
            ErrorKind::Parse("unexpected end of stream".into()),
        ));
    };
    match decoder.decode()? {
        None => Ok(expr),
        Some(second) => {
            let pos = second.pos();
            let line = if pos.is_valid() { Some(pos.line) } else { None };
            Err(Error::new(filename, line, ErrorKind::MultipleDocuments))
        }
    }
}

/// Decode every document in the buffer.
///
/// An empty buffer decodes to a single `*null | _` expression.
///
/// # Errors
/// Returns the first decoding error.
pub fn decode_all(filename: &str, data: &[u8]) -> Result<Vec<Expr>, Error> {
    let src = input_to_str(filename, data)?;
    let mut decoder = Decoder::new(filename, &src);
    let mut exprs = Vec::new();
    while let Some(expr) = decoder.decode()? {
        exprs.push(expr);
    }
    Ok(exprs)
}

#[cfg(feature = "encoding")]
fn input_to_str<'b>(filename: &str, data: &'b [u8]) -> Result<Cow<'b, str>, Error> {
    crate::encoding::decode_bytes(data)
        .map_err(|msg| Error::new(filename, None, ErrorKind::Parse(msg)))
}

#[cfg(not(feature = "encoding"))]
fn input_to_str<'b>(filename: &str, data: &'b [u8]) -> Result<Cow<'b, str>, Error> {
    match std::str::from_utf8(data) {
        Ok(s) => Ok(Cow::Borrowed(s.strip_prefix('\u{feff}').unwrap_or(s))),
        Err(e) => Err(Error::new(
            filename,
            None,
            ErrorKind::Parse(format!("invalid UTF-8 at byte {}", e.valid_up_to())),
        )),
    }
}
