//! Declarative parsing of binary formats into a queryable parse graph
//!
//! # Overview
//!
//! A format is described as a tree of [`Token`]s: fixed-size fields,
//! sequences, choices, repetitions, jumps to computed offsets and parses
//! over derived data. Field sizes, repetition counts and offsets are
//! [`ValueExpression`]s evaluated against everything parsed so far, so a
//! length read early in the input can size a field read later.
//!
//! Parsing produces a [`ParseGraph`]: an immutable tree of named values,
//! branches (one per composite token that committed) and references
//! (revisits of input already parsed under the same definition). Graphs
//! are persistent. Every step of a parse derives a new graph from the
//! previous one while sharing its storage, which is what lets a choice
//! backtrack for free: a refused alternative leaves nothing behind.
//!
//! ```
//! use ferrite::shorthand::*;
//! use ferrite::{parse, Encoding, Source};
//!
//! // A count followed by that many 2-byte entries.
//! let table = seq("table", def("count", con(1)), repn("entries", def("entry", con(2)), last(name_ref("count"))));
//! let state = parse(&table, Source::from_bytes([2, 0, 1, 0, 2]), 0, Encoding::DEFAULT).unwrap();
//! let entries = state.graph().values_named("entry", None);
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0].as_u64(), Some(2));
//! ```
//!
//! # Refusal and errors
//!
//! A token that does not match returns `Ok(None)` from [`Token::parse`];
//! only the top-level [`parse`] turns that into [`ParseError::NoMatch`].
//! `Err` values report malformed grammars, invalid expression operands
//! and broken invariants, and are never swallowed by choices or
//! repetitions.
//!
//! # Feature flags
//!
//! * `check_complete_parse`: top-level parses that leave input unread are
//!   refused.
//! * `serde_impls`: `Serialize`/`Deserialize` for the encoding types.
//! * `smallvec_framestack`: keep the open-branch stack of a graph inline.
//! * `expose_internal`: make the [`internal`] storage types public.

pub mod encoding;
pub mod error;
pub mod expression;
pub mod graph;
#[cfg(feature = "expose_internal")]
pub mod internal;
#[cfg(not(feature = "expose_internal"))]
mod internal;
pub mod parse;
pub mod shorthand;
pub mod source;
pub mod token;
pub mod value;

pub use crate::encoding::{ByteOrder, Charset, Encoding, Sign};
pub use crate::error::ArgumentError;
pub use crate::expression::{Expression, ValueExpression};
pub use crate::graph::{ParseBranch, ParseGraph, ParseItem, ParseReference, ParseState, ParseValue};
pub use crate::parse::{
    error::{InternalError, ParseError, ParseResult},
    parse, parse_with, ParseConfig,
};
pub use crate::source::{ByteStream, InMemoryByteStream, Slice, Source};
pub use crate::token::{Callbacks, Environment, Token, TokenKind};
pub use crate::value::{Value, ValueList};
