//! Error types reported by a parse
//!
//! A token that does not match its input does *not* produce an error:
//! refusal is an ordinary `Ok(None)` outcome inside the engine, and only
//! becomes [`ParseError::NoMatch`] when it reaches the top-level entry
//! points in [`crate::parse`]. Everything else in this module signals a
//! broken grammar or a broken invariant.
//!
//! # Layout
//!
//! This module defines the primary type `ParseError` and the alias
//! `ParseResult<T>`; it additionally defines `InternalError` for
//! violated invariants. Argument-validation failures live in
//! [`crate::error::ArgumentError`] and are wrapped here.

use thiserror::Error;

pub use crate::error::ArgumentError;

/// Enumeration type over all errors that may be returned by a parse,
/// by token construction or by expression evaluation.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The root token refused the input at the given offset.
    #[error("no match for {token} at offset {offset}")]
    NoMatch { token: String, offset: u64 },

    /// Error class for grammars or expressions given invalid arguments.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Error class for violated invariants of the graph or the sources.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// A byte stream failed while producing a range it claimed to hold.
    #[error("failed to read {length} bytes at offset {offset}")]
    Stream {
        offset: u64,
        length: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Returns `true` if this error is a top-level refusal rather than
    /// a hard failure.
    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self, ParseError::NoMatch { .. })
    }
}

/// Type alias for Result with an error type of [`ParseError`]
///
/// Token parsing, graph mutation and expression evaluation all
/// return `ParseResult<T>` for various `T`.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Violations of the invariants maintained by the parse graph and the
/// byte sources.
///
/// These are never expected for a well-formed grammar; their presence
/// indicates a defect either in the grammar or in this library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// A reference node has no matching branch anywhere in the graph.
    #[error("unresolvable reference to {definition} at offset {offset}")]
    UnresolvableReference { definition: String, offset: u64 },

    /// `close_branch` or `discard_branch` was called with no open branch.
    #[error("no open branch to close")]
    CloseWithoutBranch,

    /// The innermost open branch was opened by a different token than
    /// the one attempting to close it.
    #[error("cannot close branch of {found} on behalf of {expected}")]
    CloseMismatch { expected: String, found: String },

    /// A derived source no longer yields a value at its index.
    #[error("derived source `{expression}` has no value at index {index}")]
    DataIndexAbsent { expression: String, index: usize },

    /// The parse state captured by a derived source has been dropped.
    #[error("derived source `{expression}` outlived the parse that created it")]
    DetachedSnapshot { expression: String },

    /// A source produced fewer bytes than it reported available.
    #[error("source yielded {actual} bytes for a {length}-byte read at offset {offset}")]
    UnavailableData {
        offset: u64,
        length: u64,
        actual: usize,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn argument_errors_convert() {
        let err: ParseError = ArgumentError::EmptyReference.into();
        assert!(matches!(err, ParseError::Argument(ArgumentError::EmptyReference)));
        assert!(!err.is_no_match());
    }

    #[test]
    fn no_match_display() {
        let err = ParseError::NoMatch {
            token: "Def(len)".to_owned(),
            offset: 4,
        };
        assert!(err.is_no_match());
        assert_eq!(err.to_string(), "no match for Def(len) at offset 4");
    }
}
