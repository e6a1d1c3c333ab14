use criterion::{criterion_group, criterion_main, Criterion};
use sift_core::tokenizer::Analyzer;

fn bench_tokenize(c: &mut Criterion) {
    let text =
        "The quick brown fox jumps over the lazy dog, again and again; 42 times! ".repeat(200);
    let plain = Analyzer::new();
    let stopped = Analyzer::new().with_stopwords(true);
    c.bench_function("analyze_plain", |b| b.iter(|| plain.analyze(&text).count()));
    c.bench_function("analyze_stopwords", |b| b.iter(|| stopped.analyze(&text).count()));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
