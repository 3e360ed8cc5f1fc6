//! Property-based tests for the parse engine and the expression evaluator

use ferrite::shorthand::*;
use ferrite::{parse, Encoding, ParseItem, ParseState, Source, Token};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    }
}

fn try_run(root: &Token, bytes: &[u8]) -> Option<ParseState> {
    match parse(root, Source::from_bytes(bytes.to_vec()), 0, Encoding::DEFAULT) {
        Ok(state) => Some(state),
        Err(err) if err.is_no_match() => None,
        Err(err) => panic!("hard error: {}", err),
    }
}

fn root_branch_len(state: &ParseState) -> usize {
    match state.graph().items().first() {
        Some(ParseItem::Branch(branch)) => branch.len(),
        _ => 0,
    }
}

/// `[n, x1 .. xn, rest..]` as a count followed by that many bytes.
fn counted() -> Token {
    seq("counted", def("n", con(1)), repn("xs", def("x", con(1)), last(name_ref("n"))))
}

proptest! {
    #![proptest_config(config())]

    /// Every value's recorded offset and length point back at its bytes.
    #[test]
    fn values_reproduce_their_input(input in prop::collection::vec(any::<u8>(), 1..64)) {
        prop_assume!(!cfg!(feature = "check_complete_parse"));
        if let Some(state) = try_run(&counted(), &input) {
            for value in state.graph().flatten() {
                let start = value.offset() as usize;
                prop_assert_eq!(value.bytes(), input[start..start + value.len()].to_vec());
            }
        }
    }

    /// A counted list commits exactly when enough bytes follow the count.
    #[test]
    fn counted_list_needs_count_bytes(input in prop::collection::vec(any::<u8>(), 1..64)) {
        prop_assume!(!cfg!(feature = "check_complete_parse"));
        let n = input[0] as usize;
        match try_run(&counted(), &input) {
            Some(state) => {
                prop_assert!(input.len() > n);
                prop_assert_eq!(state.offset() as usize, n + 1);
                prop_assert_eq!(state.graph().values_named("x", None).len(), n);
            }
            None => prop_assert!(input.len() <= n),
        }
    }

    /// Bounded repetition of a fixed-size body advances by count * size.
    #[test]
    fn repn_advances_exactly(count in 0i64..24, size in 1i64..6, slack in 0usize..8) {
        prop_assume!(!cfg!(feature = "check_complete_parse") || slack == 0);
        let root = repn("r", def("x", con(size)), con(count));
        let input = vec![0u8; (count * size) as usize + slack];
        let state = try_run(&root, &input).unwrap();
        prop_assert_eq!(state.offset(), (count * size) as u64);
        prop_assert_eq!(root_branch_len(&state), count as usize);
    }

    /// Reversal preserves the count, and out-of-range positions are absent.
    #[test]
    fn count_and_nth(input in prop::collection::vec(any::<u8>(), 0..48), ix in -4i64..64) {
        let root = rep("r", def("x", con(1)));
        let state = try_run(&root, &input).unwrap();
        let eval = |expr: ferrite::ValueExpression| expr.eval(&state, &Encoding::DEFAULT).unwrap();
        let xs = eval(name_ref("x"));
        prop_assert_eq!(xs.len(), input.len());
        prop_assert_eq!(eval(count(rev(name_ref("x")))), eval(count(name_ref("x"))));
        let picked = eval(nth(name_ref("x"), con(ix)));
        prop_assert_eq!(picked.len(), 1);
        match picked.head() {
            Some(Some(v)) => {
                prop_assert!(ix >= 0 && (ix as usize) < input.len());
                prop_assert_eq!(v.bytes(), vec![input[ix as usize]]);
            }
            _ => prop_assert!(ix < 0 || ix as usize >= input.len()),
        }
    }

    /// Choice picks the first alternative that fits, leaving no trace of the others.
    #[test]
    fn choice_is_ordered(input in prop::collection::vec(any::<u8>(), 0..6)) {
        prop_assume!(!cfg!(feature = "check_complete_parse"));
        let root = ferrite::cho!(
            "c",
            seq("four", def("a", con(2)), def("b", con(2))),
            def("two", con(2)),
            def("one", con(1)),
        );
        let expected = match input.len() {
            0 => None,
            1 => Some(1),
            2 | 3 => Some(2),
            _ => Some(4),
        };
        let state = try_run(&root, &input);
        prop_assert_eq!(state.as_ref().map(ParseState::offset), expected);
        if let Some(state) = state {
            let flat = state.graph().flatten();
            let names: Vec<_> = flat.iter().map(|v| v.name().to_owned()).collect();
            let expected_names: Vec<&str> = match expected {
                Some(4) => vec!["c.four.a", "c.four.b"],
                Some(2) => vec!["c.two"],
                _ => vec!["c.one"],
            };
            prop_assert_eq!(names, expected_names);
        }
    }

    /// Continuation-bit decoding of any 64-bit number.
    #[test]
    fn varint_decodes(n in any::<u64>()) {
        let mut encoded = Vec::new();
        let mut rest = n;
        loop {
            let low = (rest & 0x7f) as u8;
            rest >>= 7;
            if rest == 0 {
                encoded.push(low);
                break;
            }
            encoded.push(low | 0x80);
        }
        let terminated = post(empty(), eq_num_of(bit_and(last(bytes_of(last(name_ref("v")))), con(0x80)), con(0)));
        let root = until_bounded("v", con(1), con(1), con(10), terminated);
        let state = try_run(&root, &encoded).unwrap();
        let value = fold_left(rev(bytes_of(last(name_ref("v")))), |l, r| bit_or(shl(l, con(7)), bit_and(r, con(0x7f))))
            .eval(&state, &Encoding::DEFAULT)
            .unwrap();
        prop_assert_eq!(value.single_value().and_then(|v| v.as_u64()), Some(n));
    }
}
