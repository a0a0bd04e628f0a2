use criterion::{criterion_group, criterion_main, Criterion};
use kel::{lexer, parser};
use std::hint::black_box;

static INPUT: &str = include_str!("../data/big.kel");

fn criterion_benchmark(c: &mut Criterion) {
    let lexed = lexer::lex(INPUT);
    assert!(!lexed.had_error, "bench input must lex cleanly");

    c.bench_function("parser", |b| {
        b.iter(|| {
            let parsed = parser::parse(black_box(&lexed.tokens));
            black_box(parsed);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
