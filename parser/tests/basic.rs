#![allow(clippy::bool_assert_comparison)]

use cueyaml_parser::{Node, NodeKind, Parser, Style};

fn doc(src: &str) -> Node {
    Parser::new(src)
        .next_document()
        .expect("parse error")
        .expect("empty stream")
}

fn root(src: &str) -> Node {
    doc(src).content.into_iter().next().expect("empty document")
}

fn pairs(node: &Node) -> Vec<(&Node, &Node)> {
    assert_eq!(node.kind, NodeKind::Mapping);
    node.content.chunks(2).map(|c| (&c[0], &c[1])).collect()
}

#[test]
fn test_scalar_root() {
    let node = root("42");
    assert_eq!(node.kind, NodeKind::Scalar);
    assert_eq!(node.value, "42");
    assert_eq!(node.short_tag(), "!!int");
    assert_eq!((node.line, node.column), (1, 1));
}

#[test]
fn test_simple_mapping() {
    let node = root("a: 1\nb: 2\n");
    let entries = pairs(&node);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0.value, "a");
    assert_eq!(entries[0].1.value, "1");
    assert_eq!(entries[0].1.short_tag(), "!!int");
    assert_eq!(entries[1].0.value, "b");
    assert_eq!((entries[1].0.line, entries[1].0.column), (2, 1));
    assert_eq!((entries[1].1.line, entries[1].1.column), (2, 4));
}

#[test]
fn test_nested_mapping() {
    let node = root("a:\n  b: 1\n");
    let entries = pairs(&node);
    assert_eq!(entries.len(), 1);
    let inner = entries[0].1;
    assert_eq!(inner.kind, NodeKind::Mapping);
    assert_eq!((inner.line, inner.column), (2, 3));
    assert_eq!(pairs(inner)[0].0.value, "b");
}

#[test]
fn test_empty_value_is_null() {
    let node = root("a:\nb: 2\n");
    let entries = pairs(&node);
    assert_eq!(entries[0].1.short_tag(), "!!null");
    assert_eq!(entries[1].1.value, "2");
}

#[test]
fn test_block_sequence() {
    let node = root("- 1\n- two\n");
    assert_eq!(node.kind, NodeKind::Sequence);
    assert_eq!(node.content.len(), 2);
    assert_eq!(node.content[0].short_tag(), "!!int");
    assert_eq!(node.content[1].short_tag(), "!!str");
}

#[test]
fn test_sequence_of_mappings() {
    let node = root("- a: 1\n  b: 2\n- c: 3\n");
    assert_eq!(node.content.len(), 2);
    let first = pairs(&node.content[0]);
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].0.value, "b");
    assert_eq!(pairs(&node.content[1])[0].0.value, "c");
}

#[test]
fn test_sequence_under_key_at_same_column() {
    let node = root("k:\n- 1\n- 2\n");
    let entries = pairs(&node);
    let seq = entries[0].1;
    assert_eq!(seq.kind, NodeKind::Sequence);
    assert_eq!(seq.content.len(), 2);
}

#[test]
fn test_flow_collections() {
    let node = root("x: {a: 1, b: [1, 2]}\n");
    let value = pairs(&node)[0].1;
    assert_eq!(value.kind, NodeKind::Mapping);
    assert!(value.style.is_flow());
    let inner = pairs(value);
    assert_eq!(inner[0].0.value, "a");
    let list = inner[1].1;
    assert_eq!(list.kind, NodeKind::Sequence);
    assert!(list.style.is_flow());
    assert_eq!(list.content[1].value, "2");
}

#[test]
fn test_quoted_scalars() {
    let node = root("a: \"hi\\nthere\"\nb: 'it''s'\n");
    let entries = pairs(&node);
    assert_eq!(entries[0].1.value, "hi\nthere");
    assert!(entries[0].1.style.contains(Style::DOUBLE_QUOTED));
    assert_eq!(entries[0].1.short_tag(), "!!str");
    assert_eq!(entries[1].1.value, "it's");
    assert!(entries[1].1.style.contains(Style::SINGLE_QUOTED));
}

#[test]
fn test_literal_block_scalar() {
    let node = root("a: |\n  line1\n  line2\n");
    let value = pairs(&node)[0].1;
    assert_eq!(value.value, "line1\nline2\n");
    assert!(value.style.contains(Style::LITERAL));
}

#[test]
fn test_folded_block_scalar() {
    let node = root("a: >\n  one\n  two\n");
    let value = pairs(&node)[0].1;
    assert_eq!(value.value, "one two\n");
    assert!(value.style.contains(Style::FOLDED));
}

#[test]
fn test_block_scalar_chomping() {
    let value = pairs(&root("a: |-\n  text\n"))[0].1.value.clone();
    assert_eq!(value, "text");
    let value = pairs(&root("a: |+\n  text\n\n\n"))[0].1.value.clone();
    assert_eq!(value, "text\n\n\n");
}

#[test]
fn test_multiline_plain_scalar() {
    let node = root("a: foo\n  bar\n");
    assert_eq!(pairs(&node)[0].1.value, "foo bar");
}

#[test]
fn test_anchor_and_alias() {
    let node = root("a: &x 1\nb: *x\n");
    let entries = pairs(&node);
    assert_eq!(entries[0].1.anchor, "x");
    assert_eq!(entries[0].1.value, "1");
    // The anchored node's position covers the `&x` prefix.
    assert_eq!((entries[0].1.line, entries[0].1.column), (1, 4));
    let alias = entries[1].1;
    assert_eq!(alias.kind, NodeKind::Alias);
    assert_eq!(alias.value, "x");
}

#[test]
fn test_unknown_alias_errors() {
    let err = Parser::new("a: *nope\n").next_document().unwrap_err();
    assert!(err.to_string().contains("unknown anchor 'nope' referenced"));
}

#[test]
fn test_explicit_tags() {
    let node = root("a: !!str 123\nb: !!float 1\n");
    let entries = pairs(&node);
    assert_eq!(entries[0].1.short_tag(), "!!str");
    assert!(entries[0].1.style.is_tagged());
    assert_eq!(entries[1].1.short_tag(), "!!float");
    assert_eq!(entries[1].1.value, "1");
}

#[test]
fn test_merge_key() {
    let node = root("base: &b {a: 1}\nchild:\n  <<: *b\n");
    let entries = pairs(&node);
    let merge = pairs(entries[1].1)[0].0;
    assert!(merge.is_merge_key());
}

#[test]
fn test_multiple_documents() {
    let mut parser = Parser::new("---\na: 1\n---\nb: 2\n");
    let one = parser.next_document().unwrap().unwrap();
    let two = parser.next_document().unwrap().unwrap();
    assert!(parser.next_document().unwrap().is_none());
    assert_eq!(pairs(&one.content[0])[0].0.value, "a");
    assert_eq!(pairs(&two.content[0])[0].0.value, "b");
}

#[test]
fn test_bare_document_marker_is_null_document() {
    let node = root("---\n");
    assert_eq!(node.kind, NodeKind::Scalar);
    assert_eq!(node.short_tag(), "!!null");
}

#[test]
fn test_empty_stream() {
    assert!(Parser::new("").next_document().unwrap().is_none());
    assert!(Parser::new("\n\n").next_document().unwrap().is_none());
}

#[test]
fn test_missing_colon_errors() {
    let err = Parser::new("a: 1\nb\n").next_document().unwrap_err();
    assert!(err.to_string().contains("could not find expected ':'"));
    assert!(err.to_string().starts_with("yaml: line 2:"));
}

#[test]
fn test_value_on_value_errors() {
    let err = Parser::new("a: b: c\n").next_document().unwrap_err();
    assert!(err
        .to_string()
        .contains("mapping values are not allowed in this context"));
}

#[test]
fn test_complex_key_rejected() {
    let err = Parser::new("? a\n: b\n").next_document().unwrap_err();
    assert!(err
        .to_string()
        .contains("complex mapping keys are not supported"));
}

#[test]
fn test_null_key() {
    let node = root("null: 1\n");
    assert_eq!(pairs(&node)[0].0.short_tag(), "!!null");
}
