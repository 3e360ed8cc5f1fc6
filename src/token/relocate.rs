//! Tokens that parse somewhere other than the cursor
//!
//! [`parse_sub`] jumps to computed offsets and back, [`parse_tie`] parses
//! over bytes produced by an expression, and [`parse_ref`] resolves a
//! definition by name, which is what makes recursive formats expressible.

use std::rc::Rc;

use tracing::{event, Level};

use super::field::field_length;
use super::{within_branch, Environment, Token};
use crate::expression::ValueExpression;
use crate::graph::{ParseReference, ParseState};
use crate::parse::error::ParseResult;
use crate::source::{DataExpressionSource, Source};

/// Parses `body` at every offset yielded by `offsets`, head first, then
/// restores the cursor.
///
/// An offset at which the same definition has already been parsed in the
/// same source records a [`ParseReference`] instead of parsing again.
/// Refuses on an empty or absent offset, or when any parse refuses.
pub(crate) fn parse_sub(
    token: &Token,
    body: &Token,
    offsets: &ValueExpression,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    let targets = offsets.eval(state, &env.encoding())?;
    if targets.is_empty() {
        return Ok(None);
    }
    let Some(canonical) = body.canonical(env, state) else {
        event!(Level::DEBUG, body = %body, "sub-parse body does not resolve");
        return Ok(None);
    };
    let result = within_branch(token, state, |opened| {
        let mut current = opened.clone();
        for target in targets.iter() {
            let Some(offset) = target.as_ref().and_then(field_length) else {
                return Ok(None);
            };
            if current.graph().find_branch(&canonical, current.source(), offset).is_some() {
                event!(Level::DEBUG, definition = %canonical, offset, "already parsed, adding reference");
                current = current.add_reference(ParseReference::new(current.source().clone(), offset, canonical.clone()));
                continue;
            }
            match body.parse(env, &current.seek(offset))? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    })?;
    Ok(result.map(|done| done.seek(state.offset())))
}

/// Parses the definition named `target`; refuses if there is none.
pub(crate) fn parse_ref(target: &str, env: &Environment, state: &ParseState) -> ParseResult<Option<ParseState>> {
    match env.resolve(target, state) {
        Some(definition) => definition.parse(env, state),
        None => {
            event!(Level::DEBUG, target, "unresolved token reference");
            Ok(None)
        }
    }
}

/// Parses `body` once over the bytes of every value `data` yields, head
/// first, then returns to the original source and cursor.
///
/// Refuses if any of the values is absent; with no values at all it
/// commits an empty branch.
pub(crate) fn parse_tie(
    token: &Token,
    body: &Token,
    data: &ValueExpression,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    let encoding = env.encoding();
    let values = data.eval(state, &encoding)?;
    if values.contains_absent() {
        return Ok(None);
    }
    let result = within_branch(token, state, |opened| {
        let mut current = opened.clone();
        for (index, value) in values.values().enumerate() {
            let source = DataExpressionSource::with_value(data.clone(), index, state, encoding, value.clone());
            match body.parse(env, &current.with_source(Source::Data(Rc::new(source))))? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    })?;
    Ok(result.map(|done| done.with_source(state.source().clone()).seek(state.offset())))
}
