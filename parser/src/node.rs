//! The YAML node tree.
//!
//! A [`Node`] keeps, next to its resolved contents, everything about the way
//! the value was written down: representation style, tag, anchor name,
//! position and surrounding comments. Consumers that translate YAML to
//! another surface syntax rely on all of these.

/// Prefix of the tags defined by the YAML specification.
pub(crate) const LONG_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// The kind of a YAML node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// A document node. Its `content` holds exactly the root node.
    Document,
    /// A sequence. Its `content` holds the items in order.
    Sequence,
    /// A mapping. Its `content` interleaves keys and values.
    Mapping,
    /// A scalar leaf.
    Scalar,
    /// An alias (`*name`). The referenced anchor name is in `value`.
    Alias,
}

impl NodeKind {
    /// A short human-readable name for error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
            NodeKind::Scalar => "scalar",
            NodeKind::Alias => "alias",
        }
    }
}

/// The representation style of a node, as a set of bit flags.
///
/// Styles combine: a flow mapping with an explicit tag carries both
/// [`Style::FLOW`] and [`Style::TAGGED`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Style(u8);

impl Style {
    /// The node was written in flow style (`{..}` / `[..]`).
    pub const FLOW: Style = Style(1 << 0);
    /// The node carried an explicit tag in the source.
    pub const TAGGED: Style = Style(1 << 1);
    /// A single-quoted scalar.
    pub const SINGLE_QUOTED: Style = Style(1 << 2);
    /// A double-quoted scalar.
    pub const DOUBLE_QUOTED: Style = Style(1 << 3);
    /// A literal (`|`) block scalar.
    pub const LITERAL: Style = Style(1 << 4);
    /// A folded (`>`) block scalar.
    pub const FOLDED: Style = Style(1 << 5);

    /// Return whether all flags of `other` are set in `self`.
    #[must_use]
    pub fn contains(self, other: Style) -> bool {
        self.0 & other.0 == other.0
    }

    /// Return whether the node was written in flow style.
    #[must_use]
    pub fn is_flow(self) -> bool {
        self.contains(Style::FLOW)
    }

    /// Return whether the node carried an explicit tag.
    #[must_use]
    pub fn is_tagged(self) -> bool {
        self.contains(Style::TAGGED)
    }

    /// Return whether the scalar was quoted or written as a block scalar.
    #[must_use]
    pub fn is_quoted_or_block(self) -> bool {
        self.0 & (Style::SINGLE_QUOTED.0 | Style::DOUBLE_QUOTED.0 | Style::LITERAL.0 | Style::FOLDED.0)
            != 0
    }
}

impl std::ops::BitOr for Style {
    type Output = Style;

    fn bitor(self, rhs: Style) -> Style {
        Style(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Style {
    fn bitor_assign(&mut self, rhs: Style) {
        self.0 |= rhs.0;
    }
}

/// A node of the YAML tree, with styles, tag, anchor, position and comments.
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// The node kind.
    pub kind: NodeKind,
    /// Representation style flags.
    pub style: Style,
    /// The resolved long tag (e.g. `tag:yaml.org,2002:int`).
    pub tag: String,
    /// The scalar value, or the anchor name for [`NodeKind::Alias`].
    pub value: String,
    /// The anchor name if the node was anchored with `&name`, else empty.
    pub anchor: String,
    /// Child nodes. Mappings interleave keys and values.
    pub content: Vec<Node>,
    /// 1-based line of the node start, including any `&anchor`/`!tag` prefix.
    pub line: usize,
    /// 1-based byte column of the node start within its line.
    pub column: usize,
    /// Comment lines immediately preceding the node, joined with `\n`.
    pub head_comment: String,
    /// Trailing comment on the node's own line.
    pub line_comment: String,
    /// Comment block following the node.
    pub foot_comment: String,
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Scalar
    }
}

impl Node {
    /// Create a bare node of the given kind at a position.
    #[must_use]
    pub fn new(kind: NodeKind, line: usize, column: usize) -> Node {
        Node {
            kind,
            line,
            column,
            ..Node::default()
        }
    }

    /// Return the short form of the node's tag.
    ///
    /// Tags under `tag:yaml.org,2002:` shorten to `!!` form (`!!int`);
    /// anything else is returned verbatim.
    #[must_use]
    pub fn short_tag(&self) -> String {
        short_tag(&self.tag)
    }

    /// Return whether this node is a `<<` merge key.
    ///
    /// A merge key is the scalar `<<` carrying the `!!merge` tag, the
    /// non-specific `!` tag, or no tag at all.
    #[must_use]
    pub fn is_merge_key(&self) -> bool {
        self.kind == NodeKind::Scalar
            && self.value == "<<"
            && matches!(self.short_tag().as_str(), "" | "!" | "!!merge")
    }
}

/// Shorten a long tag to its `!!` form where possible.
#[must_use]
pub(crate) fn short_tag(tag: &str) -> String {
    match tag.strip_prefix(LONG_TAG_PREFIX) {
        Some(suffix) => format!("!!{suffix}"),
        None => tag.to_owned(),
    }
}

/// Expand a `!!` short tag to its long form where possible.
#[must_use]
pub(crate) fn long_tag(tag: &str) -> String {
    match tag.strip_prefix("!!") {
        Some(suffix) => format!("{LONG_TAG_PREFIX}{suffix}"),
        None => tag.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::{long_tag, short_tag, Node, NodeKind, Style};

    #[test]
    fn test_tag_round_trip() {
        assert_eq!(short_tag("tag:yaml.org,2002:str"), "!!str");
        assert_eq!(long_tag("!!str"), "tag:yaml.org,2002:str");
        assert_eq!(short_tag("!custom"), "!custom");
    }

    #[test]
    fn test_style_flags() {
        let style = Style::FLOW | Style::TAGGED;
        assert!(style.is_flow());
        assert!(style.is_tagged());
        assert!(!style.is_quoted_or_block());
    }

    #[test]
    fn test_merge_key() {
        let mut node = Node::new(NodeKind::Scalar, 1, 1);
        node.value = "<<".into();
        node.tag = long_tag("!!merge");
        assert!(node.is_merge_key());
        node.tag = long_tag("!!str");
        assert!(!node.is_merge_key());
    }
}
