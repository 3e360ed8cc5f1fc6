//! Top-level entry points
//!
//! [`parse`] and [`parse_with`] run a root [`Token`] over a [`Source`]
//! and turn the engine's refusal into [`ParseError::NoMatch`]. Everything
//! below this level reports refusal as `Ok(None)`; see [`Token::parse`]
//! for driving the engine directly.

pub mod error;

use tracing::{event, Level};

use crate::encoding::Encoding;
use crate::graph::ParseState;
use crate::source::Source;
use crate::token::{Callbacks, Environment, Token};

pub use error::{ParseError, ParseResult};

/// Settings for a single call to [`parse_with`].
#[derive(Clone, Debug, Default)]
pub struct ParseConfig {
    /// Encoding of values read by tokens without an override.
    pub encoding: Encoding,
    pub callbacks: Callbacks,
    /// Named tokens resolvable by token references in addition to those
    /// reachable from the root.
    pub definitions: Vec<Token>,
}

impl ParseConfig {
    #[must_use]
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_callbacks(self, callbacks: Callbacks) -> Self {
        Self { callbacks, ..self }
    }

    #[must_use]
    pub fn with_definitions(self, definitions: impl IntoIterator<Item = Token>) -> Self {
        Self {
            definitions: definitions.into_iter().collect(),
            ..self
        }
    }
}

/// Parses `root` over `source` starting at `offset`.
///
/// On success the returned state holds the complete graph and the cursor
/// just past the last byte consumed.
///
/// # Errors
///
/// Returns [`ParseError::NoMatch`] if `root` refuses the input, and
/// propagates any argument or invariant error raised along the way.
pub fn parse(root: &Token, source: Source, offset: u64, encoding: Encoding) -> ParseResult<ParseState> {
    parse_with(root, source, offset, &ParseConfig::new(encoding))
}

/// Like [`parse`], with callbacks and extra named definitions.
///
/// If the feature-flag `check_complete_parse` is enabled, a parse that
/// stops before the end of `source` is also reported as
/// [`ParseError::NoMatch`].
///
/// # Errors
///
/// As [`parse`].
pub fn parse_with(root: &Token, source: Source, offset: u64, config: &ParseConfig) -> ParseResult<ParseState> {
    let env = Environment::new(
        config.encoding,
        config.callbacks.clone(),
        std::iter::once(root).chain(config.definitions.iter()),
    );
    let outcome = root.parse(&env, &ParseState::new(source, offset))?;
    #[cfg(feature = "check_complete_parse")]
    let outcome = match outcome {
        Some(done) if done.source().is_available(done.offset(), 1)? => {
            event!(Level::DEBUG, token = %root, offset = done.offset(), "input not fully consumed");
            None
        }
        other => other,
    };
    match outcome {
        Some(done) => {
            event!(Level::DEBUG, token = %root, offset = done.offset(), "parse complete");
            Ok(done)
        }
        None => {
            event!(Level::DEBUG, token = %root, offset, "no match");
            Err(ParseError::NoMatch {
                token: root.to_string(),
                offset,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::shorthand::*;

    #[test]
    fn refusal_becomes_no_match() {
        let root = def("a", con(4));
        let err = parse(&root, Source::from_bytes([1, 2]), 0, Encoding::DEFAULT).unwrap_err();
        assert!(err.is_no_match());
        assert_eq!(err.to_string(), "no match for Def(a) at offset 0");
    }

    #[test]
    fn hard_errors_propagate() {
        let root = def("a", div(con(1), con(0)));
        let err = parse(&root, Source::from_bytes([1, 2]), 0, Encoding::DEFAULT).unwrap_err();
        assert!(matches!(err, ParseError::Argument(crate::error::ArgumentError::DivisionByZero { .. })));
    }

    #[test]
    fn starts_at_offset() {
        let root = def("a", con(1));
        let state = parse(&root, Source::from_bytes([1, 2]), 1, Encoding::DEFAULT).unwrap();
        assert_eq!(state.graph().current().unwrap().bytes(), vec![2]);
    }

    #[test]
    fn extra_definitions_resolve() {
        let root = seq("s", token("shared"), token("shared"));
        let shared = def("shared", con(1));
        let config = ParseConfig::default().with_definitions([shared]);
        let state = parse_with(&root, Source::from_bytes([1, 2]), 0, &config).unwrap();
        assert_eq!(state.offset(), 2);
        assert!(parse(&root, Source::from_bytes([1, 2]), 0, Encoding::DEFAULT).is_err());
    }

    #[test]
    fn callbacks_see_every_attempt() {
        let attempts = Rc::new(Cell::new(0));
        let refusals = Rc::new(Cell::new(0));
        let (a, r) = (attempts.clone(), refusals.clone());
        let callbacks = Callbacks::new().on_every(move |_, outcome, _| {
            a.set(a.get() + 1);
            if outcome.is_none() {
                r.set(r.get() + 1);
            }
        });
        let root = crate::cho!("c", def("x", con(3)), def("y", con(1)));
        let config = ParseConfig::default().with_callbacks(callbacks);
        parse_with(&root, Source::from_bytes([1]), 0, &config).unwrap();
        assert_eq!(attempts.get(), 3);
        assert_eq!(refusals.get(), 1);
    }

    #[cfg(feature = "check_complete_parse")]
    #[test]
    fn leftover_input_is_refused() {
        let root = def("a", con(1));
        assert!(parse(&root, Source::from_bytes([1, 2]), 0, Encoding::DEFAULT)
            .unwrap_err()
            .is_no_match());
    }
}
