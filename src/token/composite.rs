//! Sequences and choices

use super::{Environment, Token};
use crate::graph::ParseState;
use crate::parse::error::ParseResult;

/// Parses every token in order; refuses as soon as one refuses.
pub(crate) fn parse_seq(tokens: &[Token], env: &Environment, opened: &ParseState) -> ParseResult<Option<ParseState>> {
    let mut current = opened.clone();
    for token in tokens {
        match token.parse(env, &current)? {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Parses the first alternative that commits. Each alternative starts
/// from `opened`, so nothing a refused alternative did is visible to the
/// next one.
pub(crate) fn parse_cho(tokens: &[Token], env: &Environment, opened: &ParseState) -> ParseResult<Option<ParseState>> {
    for token in tokens {
        if let Some(next) = token.parse(env, opened)? {
            return Ok(Some(next));
        }
    }
    Ok(None)
}
