//! Predicate guards around a token

use super::{Environment, Token};
use crate::expression::Expression;
use crate::graph::ParseState;
use crate::parse::error::ParseResult;

/// Parses `body` only if `predicate` holds on the incoming state.
pub(crate) fn parse_pre(
    body: &Token,
    predicate: &Expression,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    if predicate.eval(state, &env.encoding())? {
        body.parse(env, state)
    } else {
        Ok(None)
    }
}

/// Parses `body`, keeping the result only if `predicate` holds on it.
pub(crate) fn parse_post(
    body: &Token,
    predicate: &Expression,
    env: &Environment,
    state: &ParseState,
) -> ParseResult<Option<ParseState>> {
    match body.parse(env, state)? {
        Some(next) if predicate.eval(&next, &env.encoding())? => Ok(Some(next)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use crate::encoding::Encoding;
    use crate::expression::Expression;
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

    #[test]
    fn pre_sees_earlier_values() {
        let flag = def("flag", con(1));
        let guarded = pre(def("body", con(1)), eq_of(last(name_ref("flag")), con(1)));
        assert!(run(&seq("s", flag.clone(), guarded.clone()), &[1, 9]).is_some());
        assert!(run(&seq("s", flag, guarded), &[0, 9]).is_none());
    }

    #[test]
    fn post_sees_own_value() {
        let checked = post(def("v", con(1)), gt_num(con(4)));
        assert!(run(&checked, &[5]).is_some());
        assert!(run(&checked, &[4]).is_none());
    }

    #[test]
    fn when_and_opt() {
        let body = def("b", con(1));
        let state = run(&when(body.clone(), Expression::True), &[1]).unwrap();
        assert_eq!(state.offset(), 1);
        let skipped = run(&when(body.clone(), not(Expression::True)), &[1]).unwrap();
        assert_eq!(skipped.offset(), 0);
        assert!(run(&opt(def("b", con(2))), &[1]).is_some());
    }
}
