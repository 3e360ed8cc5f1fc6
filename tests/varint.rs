//! A continuation-bit integer format built from the public combinators,
//! the way a client crate would describe it.

#![cfg(not(feature = "check_complete_parse"))]

use ferrite::shorthand::*;
use ferrite::{parse, Encoding, ParseState, Source, Token, ValueExpression};

/// 1 to 10 bytes, ending at the first byte with its high bit clear.
fn varint(name: &str) -> Token {
    let last_byte = last(bytes_of(last(name_ref(name))));
    until_bounded(
        name,
        con(1),
        con(1),
        con(10),
        post(empty(), eq_num_of(bit_and(last_byte, con(0x80)), con(0))),
    )
}

/// Value of the most recent varint called `name`.
fn decoded(name: &str) -> ValueExpression {
    fold_left(rev(bytes_of(last(name_ref(name)))), |l, r| {
        bit_or(shl(l, con(7)), bit_and(r, con(0x7f)))
    })
}

fn decode_at(state: &ParseState, name: &str) -> Option<u64> {
    decoded(name)
        .eval(state, &Encoding::DEFAULT)
        .unwrap()
        .single_value()
        .and_then(|v| v.as_u64())
}

fn run(root: &Token, bytes: &[u8]) -> ParseState {
    parse(root, Source::from_bytes(bytes.to_vec()), 0, Encoding::DEFAULT).unwrap()
}

#[test]
fn single_byte() {
    let state = run(&varint("v"), &[0x05, 0xff]);
    assert_eq!(state.offset(), 1);
    assert_eq!(decode_at(&state, "v"), Some(5));
}

#[test]
fn multi_byte() {
    let state = run(&varint("v"), &[0x96, 0x01, 0x05]);
    assert_eq!(state.offset(), 2);
    assert_eq!(decode_at(&state, "v"), Some(150));
    assert_eq!(decode_at(&run(&varint("v"), &[0xac, 0x02]), "v"), Some(300));
    assert_eq!(decode_at(&run(&varint("v"), &[0x80, 0x80, 0x01]), "v"), Some(16384));
}

#[test]
fn unterminated_is_refused() {
    let err = parse(&varint("v"), Source::from_bytes([0x80, 0x80]), 0, Encoding::DEFAULT).unwrap_err();
    assert!(err.is_no_match());
}

#[test]
fn consecutive_varints() {
    let root = seq("pair", varint("a"), varint("b"));
    let state = run(&root, &[0xac, 0x02, 0x01]);
    assert_eq!(state.offset(), 3);
    assert_eq!(decode_at(&state, "a"), Some(300));
    assert_eq!(decode_at(&state, "b"), Some(1));
}

#[test]
fn length_delimited_record() {
    let record = ferrite::seq!(
        "record",
        varint("key"),
        varint("size"),
        def("payload", decoded("size")),
    );
    let mut input = vec![0x0a, 0x82, 0x01];
    input.extend(std::iter::repeat(0x61).take(130));
    input.push(0x00);
    let state = run(&record, &input);
    assert_eq!(state.offset(), 133);
    assert_eq!(decode_at(&state, "key"), Some(10));
    let payload = &state.graph().values_named("payload", None)[0];
    assert_eq!(payload.len(), 130);
    assert_eq!(payload.offset(), 3);
}

#[test]
fn repeated_records() {
    let entry = seq("entry", varint("size"), def("data", decoded("size")));
    let root = rep("entries", entry);
    let state = run(&root, &[0x01, 0xaa, 0x02, 0xbb, 0xcc, 0x00]);
    assert_eq!(state.offset(), 6);
    let sizes: Vec<_> = state.graph().values_named("data", None).iter().map(|v| v.len()).collect();
    // the empty third payload records no value
    assert_eq!(sizes, vec![2, 1]);
}

#[test]
fn decoded_bytes_reparsed_through_tie() {
    // each byte of the payload is stored with its high bit flipped
    let unmasked = transform("Unmask", last(name_ref("payload")), |value, encoding| {
        let bytes: Vec<u8> = value.bytes().iter().map(|b| b ^ 0x80).collect();
        Some(ferrite::Value::from_bytes(bytes, *encoding))
    });
    let root = seq("msg", def("payload", con(3)), tie(repn("chars", def("c", con(1)), con(3)), unmasked));
    let state = run(&root, &[0xe1, 0xe2, 0xe3]);
    assert_eq!(state.offset(), 3);
    let text: String = state.graph().values_named("c", None).iter().rev().map(|v| v.as_text()).collect();
    assert_eq!(text, "abc");
}
