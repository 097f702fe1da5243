// Copyright 2024, the cueyaml contributors.
// See the LICENSE file at the top-level directory of this distribution.

//! Comment- and position-preserving YAML parser producing node trees.
//!
//! **If you want to translate YAML into CUE syntax trees, use `cueyaml`
//! instead of `cueyaml-parser`. This crate contains only the YAML layer.**
//!
//! Unlike event-stream YAML parsers, this crate parses a fully buffered
//! source into [`Node`] trees that keep everything a source-to-source
//! translator needs: node kinds, representation styles, resolved tags,
//! anchors and aliases, 1-based line/column markers, and head, line and foot
//! comments.
//!
//! # Usage
//!
//! ```
//! use cueyaml_parser::{NodeKind, Parser};
//!
//! let mut parser = Parser::new("a: 1\nb: 2\n");
//! let doc = parser.next_document().unwrap().unwrap();
//! assert_eq!(doc.kind, NodeKind::Document);
//! assert_eq!(doc.content[0].kind, NodeKind::Mapping);
//! ```
//!
//! # Supported YAML
//!
//! The parser covers the YAML used by configuration documents: block and flow
//! collections, plain/quoted/literal/folded scalars, anchors, aliases, tags,
//! multiple documents and directives. Explicit `?` complex mapping keys are
//! rejected with a [`ScanError`].
//!
//! # Features
//!
//! #### `debug_prints`
//! Enables debug prints in the parser. Do not enable if you are consuming the
//! crate rather than working on it as this can significantly decrease
//! performance.

#![warn(missing_docs, clippy::pedantic)]

mod char_traits;
#[macro_use]
mod debug;
mod cursor;
mod error;
mod node;
mod parser;
mod resolve;

pub use crate::error::{Marker, ScanError};
pub use crate::node::{Node, NodeKind, Style};
pub use crate::parser::Parser;
pub use crate::resolve::resolve_plain_tag;
