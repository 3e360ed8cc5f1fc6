//! Fixed-size fields

use num_bigint::Sign as BigSign;
use tracing::{event, Level};

use super::{Environment, Token};
use crate::expression::{Expression, ValueExpression};
use crate::graph::{ParseState, ParseValue};
use crate::parse::error::ParseResult;
use crate::value::Value;

/// Reads `size` bytes at the cursor as a single value named after the
/// current scope.
///
/// Refuses when `size` is not one present, non-negative value, when the
/// source has too few bytes, or when `predicate` rejects the result.
/// A zero-size field commits without recording a value; its predicate is
/// still checked.
pub(crate) fn parse_def(
    token: &Token,
    size: &ValueExpression,
    predicate: Option<&Expression>,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    let encoding = env.encoding();
    let sizes = size.eval(state, &encoding)?;
    let Some(length) = sizes.single_value().and_then(field_length) else {
        event!(Level::TRACE, token = %token, sizes = %sizes, "unusable size");
        return Ok(None);
    };
    let next = if length == 0 {
        state.clone()
    } else {
        let Some(slice) = state.slice(length)? else {
            return Ok(None);
        };
        let value = Value::from_slice(slice, encoding)?;
        state
            .add_value(ParseValue::new(env.scope(), token.clone(), value))
            .seek(state.offset() + length)
    };
    match predicate {
        Some(predicate) if !predicate.eval(&next, &encoding)? => Ok(None),
        _ => Ok(Some(next)),
    }
}

/// Length denoted by `value`, if it is a non-negative number that fits.
pub(crate) fn field_length(value: &Value) -> Option<u64> {
    let n = value.as_numeric();
    match n.sign() {
        BigSign::Minus => None,
        _ => u64::try_from(n).ok(),
    }
}
