//! Operators that reshape value lists

use std::fmt::{Display, Formatter};

use super::{Reducer, ValueExpression, MAX_DERIVED_LEN};
use crate::encoding::Encoding;
use crate::error::ArgumentError;
use crate::graph::ParseState;
use crate::parse::error::ParseResult;
use crate::value::{Value, ValueList};

/// Associativity of a fold over chronological order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FoldDirection {
    /// `f(f(x0, x1), x2)`, oldest value first.
    Left,
    /// `f(x0, f(x1, x2))`, newest value first.
    Right,
}

impl Display for FoldDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FoldDirection::Left => "FoldLeft",
            FoldDirection::Right => "FoldRight",
        })
    }
}

/// Splits every present value into single-byte values, as though each
/// byte had been parsed in storage order: the head of the result is the
/// last byte of the newest value.
pub(crate) fn bytes(list: &ValueList, encoding: &Encoding) -> ValueList {
    list.values()
        .flat_map(|value| (0..value.len()).rev().map(move |i| Some(value.byte_at(i, *encoding))))
        .collect()
}

/// Repeats `base` as a whole `count` times; a negative count gives an
/// empty list.
pub(crate) fn expand(
    owner: &ValueExpression,
    base: &ValueExpression,
    count: &ValueExpression,
    state: &ParseState,
    encoding: &Encoding,
) -> ParseResult<ValueList> {
    let base = base.eval(state, encoding)?;
    let list = count.eval(state, encoding)?;
    let count = list.single_value().ok_or_else(|| ArgumentError::NotSingleValue {
        context: "expand count",
        expression: owner.to_string(),
        found: list.to_string(),
    })?;
    let count = count.as_numeric();
    if count.sign() == num_bigint::Sign::Minus || base.is_empty() {
        return Ok(ValueList::new());
    }
    let total: usize = base.iter().flatten().map(Value::len).sum();
    let times = usize::try_from(count)
        .ok()
        .filter(|&times| {
            let fits = |n: usize| n.checked_mul(times).is_some_and(|len| len <= MAX_DERIVED_LEN);
            fits(base.len()) && fits(total)
        })
        .ok_or_else(|| ArgumentError::ExpansionTooLarge {
            expression: owner.to_string(),
            limit: MAX_DERIVED_LEN,
        })?;
    Ok(repeat(&base, times))
}

pub(crate) fn repeat(base: &ValueList, times: usize) -> ValueList {
    let mut out = Vec::with_capacity(base.len().saturating_mul(times));
    for _ in 0..times {
        out.extend(base.iter().cloned());
    }
    ValueList::from(out)
}

/// Per position from the head, the left entry if present, else the right
/// one. The longer operand supplies the positions the shorter one lacks.
pub(crate) fn elvis(left: ValueList, right: ValueList) -> ValueList {
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| match left.get(i) {
            Some(Some(value)) => Some(value.clone()),
            _ => right.get(i).cloned().flatten(),
        })
        .collect()
}

/// Concatenates all values oldest first into one value.
pub(crate) fn fold_cat(list: &ValueList, encoding: &Encoding) -> ValueList {
    if list.is_empty() || list.contains_absent() {
        return ValueList::absent();
    }
    let joined: Vec<u8> = list.values().rev().flat_map(|v| v.bytes_ref().iter().copied()).collect();
    ValueList::single(Value::from_bytes(joined, *encoding))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fold(
    owner: &ValueExpression,
    direction: FoldDirection,
    values: &ValueExpression,
    reducer: &Reducer,
    initial: Option<&ValueExpression>,
    state: &ParseState,
    encoding: &Encoding,
) -> ParseResult<ValueList> {
    let seed = match initial {
        Some(initial) => {
            let list = initial.eval(state, encoding)?;
            if list.len() > 1 {
                return Err(ArgumentError::NotSingleValue {
                    context: "fold seed",
                    expression: owner.to_string(),
                    found: list.to_string(),
                }
                .into());
            }
            list.into_iter().next()
        }
        None => None,
    };
    let values = values.eval(state, encoding)?;
    if values.is_empty() {
        return Ok(seed.into_iter().collect());
    }
    if values.contains_absent() || matches!(seed, Some(None)) {
        return Ok(ValueList::absent());
    }
    let ordered: Vec<Value> = match direction {
        FoldDirection::Left => values.values().rev().cloned().collect(),
        FoldDirection::Right => values.values().cloned().collect(),
    };
    let mut rest = ordered.into_iter();
    let mut acc = match seed.flatten() {
        Some(seed) => seed,
        None => match rest.next() {
            Some(first) => first,
            None => return Ok(ValueList::new()),
        },
    };
    for next in rest {
        let (left, right) = match direction {
            FoldDirection::Left => (acc, next),
            FoldDirection::Right => (next, acc),
        };
        let step = reducer(ValueExpression::constant(left), ValueExpression::constant(right));
        let reduced = step.eval(state, encoding)?;
        match reduced.into_vec().as_slice() {
            [Some(value)] => acc = value.clone(),
            [None] => return Ok(ValueList::absent()),
            other => {
                return Err(ArgumentError::NotSingleValue {
                    context: "fold reducer",
                    expression: step.to_string(),
                    found: ValueList::from(other.to_vec()).to_string(),
                }
                .into())
            }
        }
    }
    Ok(ValueList::single(acc))
}
