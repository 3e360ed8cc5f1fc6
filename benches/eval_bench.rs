use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ferrite::shorthand::*;
use ferrite::{parse, Encoding, ParseState, Source};

fn parsed(len: usize) -> ParseState {
    let root = rep("bytes", def("b", con(1)));
    let input: Vec<u8> = (0..len).map(|n| (n % 251) as u8).collect();
    parse(&root, Source::from_bytes(input), 0, Encoding::DEFAULT).unwrap()
}

fn name_lookup(c: &mut Criterion) {
    let state = parsed(50_000);
    let expr = count(name_ref("b"));
    c.bench_function("count_name_ref_50k", |b| {
        b.iter(|| black_box(expr.eval(&state, &Encoding::DEFAULT).unwrap()))
    });
}

fn folds(c: &mut Criterion) {
    let state = parsed(10_000);
    let sum = fold_left(name_ref("b"), add);
    c.bench_function("fold_left_add_10k", |b| {
        b.iter(|| black_box(sum.eval(&state, &Encoding::DEFAULT).unwrap()))
    });
    let joined = bytes_of(cat_all(name_ref("b")));
    c.bench_function("bytes_of_cat_all_10k", |b| {
        b.iter(|| black_box(joined.eval(&state, &Encoding::DEFAULT).unwrap()))
    });
}

fn broadcast(c: &mut Criterion) {
    let state = parsed(10_000);
    let masked = bit_and(name_ref("b"), con(0x0f));
    c.bench_function("broadcast_and_10k", |b| {
        b.iter(|| black_box(masked.eval(&state, &Encoding::DEFAULT).unwrap()))
    });
}

criterion_group! {
    name = eval_benches;
    config = Criterion::default().sample_size(20);
    targets = name_lookup, folds, broadcast
}

criterion_main!(eval_benches);
