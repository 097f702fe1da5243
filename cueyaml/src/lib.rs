// Copyright 2024, the cueyaml contributors.
// See the LICENSE file at the top-level directory of this distribution.

//! Translate YAML documents into CUE syntax trees.
//!
//! Given a byte buffer holding one or more YAML documents, the decoder
//! produces [`ast::Expr`] trees that, printed by a CUE formatter, are
//! semantically equivalent to the input and keep its source positions,
//! comments and blank-line sections, so the result reads like hand-written
//! CUE.
//!
//! The YAML layer itself lives in the sibling `cueyaml-parser` crate; this
//! crate holds the semantic and positional translation on top of it: scalar
//! tag interpretation (YAML 1.1 octals, `!!binary`, timestamps, infinities),
//! `<<` merge expansion, anchor materialization with cycle detection,
//! comment re-attachment, and relative-whitespace classification for tokens
//! that have no counterpart in the YAML bytes.
//!
//! # Usage
//!
//! ```
//! let expr = cueyaml::unmarshal("example.yaml", b"a: 1\nb: 2\n").unwrap();
//! assert_eq!(expr.to_string(), "{a: 1, b: 2}");
//! ```
//!
//! Streaming over several documents:
//!
//! ```
//! use cueyaml::Decoder;
//!
//! let mut decoder = Decoder::new("example.yaml", "---\na: 1\n---\nb: 2\n");
//! let mut count = 0;
//! while let Some(_expr) = decoder.decode().unwrap() {
//!     count += 1;
//! }
//! assert_eq!(count, 2);
//! ```
//!
//! # Features
//!
//! #### `encoding` (_enabled by default_)
//! Accept UTF-16 byte input (with BOM or endianness detection) in
//! [`unmarshal`] and [`decode_all`]. Without it, byte input must be UTF-8.
//!
//! #### `debug_prints`
//! Enables debug prints in the decoder. Do not enable if you are consuming
//! the crate rather than working on it.

#![warn(missing_docs, clippy::pedantic)]

#[macro_use]
mod debug;

pub mod ast;
mod decode;
mod errors;
mod literal;
mod source;
pub mod token;

#[cfg(feature = "encoding")]
mod encoding;

pub use crate::decode::{decode_all, unmarshal, Decoder};
pub use crate::errors::{Error, ErrorKind};
pub use crate::literal::{is_valid_ident, parse_num, quote_bytes, quote_str, NumInfo};

// Re-export the YAML layer's error type: it is part of the decoder's input
// contract and callers may want to inspect it.
pub use cueyaml_parser::ScanError;
