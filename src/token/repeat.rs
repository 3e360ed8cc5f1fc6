//! Repetition: unbounded, counted and size-searching

use num_bigint::{BigInt, Sign as BigSign};
use tracing::{event, Level};

use super::{within_branch, Environment, Token};
use crate::expression::{Expression, ValueExpression};
use crate::graph::{ParseState, ParseValue};
use crate::parse::error::ParseResult;
use crate::value::Value;

/// Parses `body` until it refuses or `condition` no longer holds.
///
/// Always commits, possibly with zero iterations. Without a condition, an
/// iteration that leaves the cursor where it was ends the repetition
/// after being kept.
pub(crate) fn parse_rep(
    body: &Token,
    condition: Option<&Expression>,
    env: &Environment,
    opened: &ParseState,
) -> ParseResult<Option<ParseState>> {
    let encoding = env.encoding();
    let mut current = opened.clone();
    loop {
        if let Some(condition) = condition {
            if !condition.eval(&current, &encoding)? {
                break;
            }
        }
        let Some(next) = body.parse(env, &current)? else {
            break;
        };
        let stalled = next.offset() == current.offset();
        current = next.iterate();
        if stalled && condition.is_none() {
            event!(Level::DEBUG, body = %body, offset = current.offset(), "repetition made no progress");
            break;
        }
    }
    Ok(Some(current))
}

/// Parses `body` exactly as many times as `count` says.
///
/// `count` is evaluated before the branch opens and must be a single
/// present value; zero or a negative count commits an empty branch.
pub(crate) fn parse_repn(
    token: &Token,
    body: &Token,
    count: &ValueExpression,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    let counts = count.eval(state, &env.encoding())?;
    let Some(times) = counts.single_value().map(Value::as_numeric) else {
        event!(Level::TRACE, token = %token, counts = %counts, "unusable count");
        return Ok(None);
    };
    within_branch(token, state, |opened| {
        let mut current = opened.clone();
        let mut remaining = times;
        while remaining.sign() == BigSign::Plus {
            match body.parse(env, &current)? {
                Some(next) => current = next.iterate(),
                None => return Ok(None),
            }
            remaining -= 1;
        }
        Ok(Some(current))
    })
}

/// Tries `body` after each counter value `1..=max` in turn.
///
/// The counter is recorded under the token's scope before `body` runs, so
/// `body` can size itself by it. `max` is evaluated before the branch
/// opens and must be a single present value.
pub(crate) fn parse_range(
    token: &Token,
    body: &Token,
    max: &ValueExpression,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    let encoding = env.encoding();
    let maxes = max.eval(state, &encoding)?;
    let Some(max) = maxes.single_value().map(Value::as_numeric) else {
        event!(Level::TRACE, token = %token, maxes = %maxes, "unusable range bound");
        return Ok(None);
    };
    within_branch(token, state, |opened| {
        let mut counter = BigInt::from(1);
        while counter <= max {
            let marked = opened.add_value(ParseValue::new(
                env.scope(),
                token.clone(),
                Value::from_numeric(&counter, encoding),
            ));
            if let Some(done) = body.parse(env, &marked)? {
                return Ok(Some(done));
            }
            counter += 1;
        }
        Ok(None)
    })
}

/// Searches for the size of a value that `terminator` accepts right
/// after it.
///
/// `initial`, `step` and `max` are evaluated up front and paired by
/// position; each triple is tried in turn in its own branch and the first
/// one that finds a size commits. Within a triple the size starts at
/// `initial` and moves by `step` until it passes `max`, the source runs
/// out, or (with a zero step) after one attempt. A zero step makes that
/// single attempt regardless of `max`.
pub(crate) fn parse_until(
    token: &Token,
    initial: &ValueExpression,
    step: &ValueExpression,
    max: Option<&ValueExpression>,
    terminator: &Token,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    let encoding = env.encoding();
    let initials = initial.eval(state, &encoding)?;
    let steps = step.eval(state, &encoding)?;
    let maxes = max.map(|max| max.eval(state, &encoding)).transpose()?;
    let triples = initials
        .len()
        .min(steps.len())
        .min(maxes.as_ref().map_or(usize::MAX, |m| m.len()));
    for ix in 0..triples {
        let (Some(initial), Some(step)) = (&initials[ix], &steps[ix]) else {
            continue;
        };
        let limit = match &maxes {
            Some(maxes) => match &maxes[ix] {
                Some(max) => Some(max.as_numeric()),
                None => continue,
            },
            None => None,
        };
        let search = Search {
            token,
            terminator,
            step: step.as_numeric(),
            limit,
        };
        if let Some(done) = within_branch(token, state, |opened| search.run(initial.as_numeric(), env, opened))? {
            return Ok(Some(done));
        }
    }
    Ok(None)
}

struct Search<'a> {
    token: &'a Token,
    terminator: &'a Token,
    step: BigInt,
    limit: Option<BigInt>,
}

impl Search<'_> {
    fn past_limit(&self, size: &BigInt) -> bool {
        match &self.limit {
            Some(_) if self.step.sign() == BigSign::NoSign => false,
            Some(max) if self.step.sign() == BigSign::Minus => size < max,
            Some(max) => size > max,
            None => false,
        }
    }

    fn run(&self, mut size: BigInt, env: &Environment, opened: &ParseState) -> ParseResult<Option<ParseState>> {
        let encoding = env.encoding();
        loop {
            if self.past_limit(&size) {
                return Ok(None);
            }
            let Ok(length) = u64::try_from(&size) else {
                return Ok(None);
            };
            let Some(slice) = opened.slice(length)? else {
                return Ok(None);
            };
            let candidate = if length == 0 {
                opened.clone()
            } else {
                let value = Value::from_slice(slice, encoding)?;
                opened
                    .add_value(ParseValue::new(env.scope(), self.token.clone(), value))
                    .seek(opened.offset() + length)
            };
            if let Some(done) = self.terminator.parse(env, &candidate)? {
                return Ok(Some(done));
            }
            if self.step.sign() == BigSign::NoSign {
                return Ok(None);
            }
            size += &self.step;
        }
    }
}

#[cfg(test)]
mod test {
    use crate::encoding::Encoding;
    use crate::graph::ParseState;
    use crate::shorthand::*;
    use crate::source::Source;
    use crate::token::{Environment, Token};

    fn run(token: &Token, bytes: &[u8]) -> Option<ParseState> {
        let env = Environment::new(Encoding::DEFAULT, Default::default(), [token]);
        token
            .parse(&env, &ParseState::new(Source::from_bytes(bytes.to_vec()), 0))
            .unwrap()
    }

    fn sizes(state: &ParseState) -> Vec<usize> {
        state.graph().flatten().iter().map(|v| v.len()).collect()
    }

    #[test]
    fn rep_stops_at_refusal() {
        let root = rep("r", def_if("x", con(1), eq(con(7))));
        let state = run(&root, &[7, 7, 7, 8]).unwrap();
        assert_eq!(state.offset(), 3);
        assert_eq!(sizes(&state), vec![1, 1, 1]);
    }

    #[test]
    fn rep_commits_zero_iterations() {
        let root = rep("r", def("x", con(2)));
        let state = run(&root, &[1]).unwrap();
        assert_eq!(state.offset(), 0);
        assert_eq!(state.graph().items().len(), 1);
    }

    #[test]
    fn rep_without_progress_terminates() {
        let root = rep("r", def("x", con(0)));
        assert_eq!(run(&root, &[1]).unwrap().offset(), 0);
    }

    #[test]
    fn rep_while_checks_before_each_iteration() {
        let root = rep_while("r", def("x", con(1)), not(eq(con(3))));
        let state = run(&root, &[1, 2, 3, 4]).unwrap();
        assert_eq!(state.offset(), 3);
    }

    #[test]
    fn repn_counts() {
        assert_eq!(run(&repn("r", def("x", con(1)), con(3)), &[1, 2, 3, 4]).unwrap().offset(), 3);
        assert!(run(&repn("r", def("x", con(1)), con(5)), &[1, 2, 3, 4]).is_none());
        assert_eq!(run(&repn("r", def("x", con(1)), con(0)), &[1]).unwrap().offset(), 0);
        assert_eq!(run(&repn("r", def("x", con(1)), con(-2)), &[1]).unwrap().offset(), 0);
        assert!(run(&repn("r", def("x", con(1)), name_ref("n")), &[1]).is_none());
    }

    #[test]
    fn until_grows_to_terminator() {
        let root = until("text", def_if("nul", con(1), eq(con(0))));
        let state = run(&root, b"ab\0c").unwrap();
        assert_eq!(state.offset(), 3);
        let flat = state.graph().flatten();
        assert_eq!(flat[0].name(), "text");
        assert_eq!(flat[0].bytes(), b"ab".to_vec());
        assert_eq!(flat[1].name(), "text.nul");
    }

    #[test]
    fn until_empty_prefix() {
        let root = until("text", def_if("nul", con(1), eq(con(0))));
        let state = run(&root, b"\0").unwrap();
        assert_eq!(sizes(&state), vec![1]);
    }

    #[test]
    fn until_respects_bounds() {
        let terminator = def_if("nul", con(1), eq(con(0)));
        assert!(run(&until_bounded("t", con(0), con(1), con(1), terminator.clone()), b"ab\0").is_none());
        assert!(run(&until("t", terminator.clone()), b"abc").is_none());
        let state = run(&until_bounded("t", con(1), con(0), con(5), terminator.clone()), b"a\0").unwrap();
        assert_eq!(state.offset(), 2);
        assert!(run(&until_bounded("t", con(2), con(0), con(5), terminator.clone()), b"a\0").is_none());
        let state = run(&until_bounded("t", con(2), con(0), con(1), terminator), b"ab\0").unwrap();
        assert_eq!(state.offset(), 3);
        assert_eq!(sizes(&state), vec![2, 1]);
    }

    #[test]
    fn range_keeps_first_counter_that_fits() {
        let body = def_if("x", last(name_ref("r")), eq_num(con(0x0102)));
        let root = range("r", body, con(4));
        let state = run(&root, &[1, 2, 3]).unwrap();
        assert_eq!(state.offset(), 2);
        let flat = state.graph().flatten();
        assert_eq!(flat[0].name(), "r");
        assert_eq!(flat[0].as_u64(), Some(2));
        assert_eq!(flat[1].name(), "r.x");
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn range_refuses_past_bound() {
        let body = def_if("x", last(name_ref("r")), eq_num(con(0x010203)));
        assert!(run(&range("r", body.clone(), con(2)), &[1, 2, 3]).is_none());
        assert!(run(&range("r", body.clone(), con(0)), &[1, 2, 3]).is_none());
        assert!(run(&range("r", body, name_ref("missing")), &[1, 2, 3]).is_none());
    }

    #[test]
    fn until_shrinks_with_negative_step() {
        let terminator = def_if("nul", con(1), eq(con(0)));
        let root = until_bounded("t", con(3), con(-1), con(0), terminator);
        let state = run(&root, b"a\0b\0").unwrap();
        assert_eq!(state.offset(), 4);
        assert_eq!(state.graph().flatten()[0].bytes(), b"a\0b".to_vec());
    }
}
