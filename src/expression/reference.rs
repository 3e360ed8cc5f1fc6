//! Graph lookups and positional operators

use num_bigint::{BigInt, Sign};

use super::ValueExpression;
use crate::encoding::Encoding;
use crate::error::ArgumentError;
use crate::graph::{ParseState, ParseValue};
use crate::parse::error::ParseResult;
use crate::value::{Value, ValueList};

fn numeric(n: impl Into<BigInt>, encoding: &Encoding) -> Value {
    Value::from_numeric(&n.into(), *encoding)
}

pub(crate) fn to_list(values: Vec<ParseValue>) -> ValueList {
    values.into_iter().map(|pv| Some(pv.value().clone())).collect()
}

pub(crate) fn self_value(state: &ParseState) -> ValueList {
    match state.graph().current() {
        Some(pv) => ValueList::single(pv.value().clone()),
        None => ValueList::absent(),
    }
}

pub(crate) fn current_offset(state: &ParseState, encoding: &Encoding) -> ValueList {
    ValueList::single(numeric(state.offset(), encoding))
}

pub(crate) fn current_iteration(state: &ParseState, level: usize, encoding: &Encoding) -> ValueList {
    match state.iteration(level) {
        Some(n) => ValueList::single(numeric(n, encoding)),
        None => ValueList::absent(),
    }
}

/// Evaluates the optional limit of a reference; negative limits select nothing.
pub(crate) fn eval_limit(
    owner: &ValueExpression,
    limit: Option<&ValueExpression>,
    state: &ParseState,
    encoding: &Encoding,
) -> ParseResult<Option<usize>> {
    let Some(limit) = limit else {
        return Ok(None);
    };
    let list = limit.eval(state, encoding)?;
    let value = list.single_value().ok_or_else(|| ArgumentError::NotSingleValue {
        context: "reference limit",
        expression: owner.to_string(),
        found: list.to_string(),
    })?;
    let n = value.as_numeric();
    Ok(Some(match n.sign() {
        Sign::Minus => 0,
        _ => usize::try_from(n).unwrap_or(usize::MAX),
    }))
}

/// Oldest entry.
pub(crate) fn first(list: ValueList) -> ValueList {
    list.into_iter().last().into_iter().collect()
}

/// Newest entry.
pub(crate) fn last(list: ValueList) -> ValueList {
    list.into_iter().next().into_iter().collect()
}

/// For every index (in index-list order), the value at that chronological
/// position, or absent if the index is absent or out of range.
pub(crate) fn nth(values: ValueList, indices: &ValueList) -> ValueList {
    let len = values.len();
    indices
        .iter()
        .map(|index| {
            let ix = index.as_ref()?.as_numeric();
            let ix = usize::try_from(ix).ok().filter(|&ix| ix < len)?;
            values[len - 1 - ix].clone()
        })
        .collect()
}

pub(crate) fn count(list: &ValueList, encoding: &Encoding) -> ValueList {
    ValueList::single(numeric(list.len(), encoding))
}

pub(crate) fn len(list: &ValueList, encoding: &Encoding) -> ValueList {
    list.iter()
        .map(|entry| entry.as_ref().map(|value| numeric(value.len(), encoding)))
        .collect()
}

pub(crate) fn offset(list: &ValueList, encoding: &Encoding) -> ValueList {
    list.iter()
        .map(|entry| entry.as_ref().map(|value| numeric(value.slice().offset(), encoding)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn bytes(list: &ValueList) -> Vec<Option<u8>> {
        list.iter().map(|e| e.as_ref().map(|v| v.bytes()[0])).collect()
    }

    fn chrono(items: &[u8]) -> ValueList {
        ValueList::from_chronological(
            items
                .iter()
                .map(|&b| Some(Value::from_bytes(vec![b], Encoding::DEFAULT)))
                .collect(),
        )
    }

    #[test]
    fn first_is_oldest_last_is_newest() {
        let list = chrono(&[1, 2, 3]);
        assert_eq!(bytes(&first(list.clone())), vec![Some(1)]);
        assert_eq!(bytes(&last(list)), vec![Some(3)]);
        assert!(first(ValueList::new()).is_empty());
        assert!(last(ValueList::new()).is_empty());
    }

    #[test]
    fn nth_counts_chronologically() {
        let list = chrono(&[10, 20, 30]);
        let indices = ValueList::from(vec![
            Some(Value::from_bytes(vec![0], Encoding::DEFAULT)),
            Some(Value::from_bytes(vec![2], Encoding::DEFAULT)),
            Some(Value::from_bytes(vec![3], Encoding::DEFAULT)),
            Some(Value::from_bytes(vec![0xff], Encoding::signed())),
            None,
        ]);
        assert_eq!(bytes(&nth(list, &indices)), vec![Some(10), Some(30), None, None, None]);
    }

    #[test]
    fn count_and_len() {
        let list = ValueList::from(vec![Some(Value::from_bytes(vec![1, 2], Encoding::DEFAULT)), None]);
        assert_eq!(count(&list, &Encoding::DEFAULT).single_value().unwrap().as_u64(), Some(2));
        assert_eq!(bytes(&len(&list, &Encoding::DEFAULT)), vec![Some(2), None]);
        assert_eq!(count(&ValueList::new(), &Encoding::DEFAULT).single_value().unwrap().as_u64(), Some(0));
    }
}
