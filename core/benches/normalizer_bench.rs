use criterion::{criterion_group, criterion_main, Criterion};
use search_core::normalizer::normalize;
use search_core::{query, Index, IndexConfig};

const TWEET: &str = "Just met with @GovPenceIN. We will make America SAFE and GREAT again! \
                     Jobs are coming back, the border will be strong. https://t.co/xyz #Trump2016";

fn synthetic_corpus(n: usize) -> Vec<String> {
    let words = ["border", "wall", "jobs", "economy", "trade", "china", "fake", "news", "media", "great", "america", "tax", "rally", "vote"];
    (0..n)
        .map(|i| (0..12).map(|j| words[(i * 7 + j * 3 + i / 5) % words.len()]).collect::<Vec<_>>().join(" "))
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_tweet", |b| b.iter(|| normalize(TWEET)));
}

fn bench_query(c: &mut Criterion) {
    let docs = synthetic_corpus(7000);
    let index = Index::build(&docs, IndexConfig::default()).expect("bench corpus builds");
    c.bench_function("query_7000_docs", |b| b.iter(|| query(&index, "strong border jobs", 10)));
}

criterion_group!(benches, bench_normalize, bench_query);
criterion_main!(benches);
