use criterion::{black_box, criterion_group, criterion_main, Criterion};
use veritas_core::config::VectorizerConfig;
use veritas_core::text::Vectorizer;

fn corpus() -> Vec<String> {
    let headlines = [
        "BREAKING: Trump is dead, says outrageous report",
        "Senate passes the budget bill after a long debate",
        "Pope endorses candidate in shocking video",
        "Markets close higher as tech stocks rally",
        "Scientists confirm aliens built the pyramids",
    ];
    (0..2_000)
        .map(|i| format!("{} {} {}", headlines[i % headlines.len()], i, headlines[(i * 7) % headlines.len()]))
        .collect()
}

fn bench_vectorizer(c: &mut Criterion) {
    let texts = corpus();

    c.bench_function("vectorizer_fit_2000_docs", |b| {
        b.iter(|| {
            Vectorizer::fit(VectorizerConfig::default(), black_box(texts.iter().map(String::as_str)))
                .unwrap()
        });
    });

    let vectorizer = Vectorizer::fit(VectorizerConfig::default(), texts.iter().map(String::as_str)).unwrap();

    c.bench_function("vectorizer_encode_single", |b| {
        b.iter(|| vectorizer.encode(black_box("this is outrageous, trump is dead!")));
    });

    c.bench_function("vectorizer_encode_batch_2000", |b| {
        b.iter(|| vectorizer.encode_batch(black_box(texts.iter().map(String::as_str))));
    });
}

criterion_group!(benches, bench_vectorizer);
criterion_main!(benches);
