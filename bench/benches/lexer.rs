use criterion::{criterion_group, criterion_main, Criterion};
use kel::{lexer::Lexer, token::TokenKind};
use std::hint::black_box;

static INPUT: &str = include_str!("../data/big.kel");

fn lexer(lexer: &mut Lexer<'static>, input: &'static str) {
    let lexed = lexer.scan(input);
    let i = lexed
        .tokens
        .iter()
        .filter(|token| token.kind != TokenKind::Eof)
        .count();
    black_box(i);
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut scanner = Lexer::default();
    c.bench_function("lexer", |b| {
        b.iter(|| {
            lexer(&mut scanner, black_box(INPUT));
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
