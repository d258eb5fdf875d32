//! Benchmarks for the mention heuristic and URL filter.

#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mentionscout::config::BrandConfig;
use mentionscout::discovery::{evaluate_url, ExclusionList, KnownUrls, MentionDetector};

fn sample_page() -> String {
    let filler = "<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>\n".repeat(400);
    format!("<html><body>{filler}<p>Picked up these sneakers on Myntra during the sale.</p>{filler}</body></html>")
}

fn classifier_benchmark(c: &mut Criterion) {
    let detector = MentionDetector::new(&BrandConfig::new("Myntra", "myntra.com"))
        .expect("valid brand");
    let page = sample_page();

    c.bench_function("detect", |b| b.iter(|| detector.detect(black_box(&page))));
    c.bench_function("analyze", |b| b.iter(|| detector.analyze(black_box(&page))));
}

fn filter_benchmark(c: &mut Criterion) {
    let exclusions = ExclusionList::parse("foo.com, amazon.in, flipkart.com, reddit.com");
    let known: KnownUrls = (0..5_000).map(|i| format!("https://blog{i}.example.com/post")).collect();

    c.bench_function("evaluate_url", |b| {
        b.iter(|| {
            evaluate_url(
                black_box("https://www.Blog42.example.com:8080/review?ref=1"),
                &exclusions,
                &known,
            )
        })
    });
}

criterion_group!(benches, classifier_benchmark, filter_benchmark);
criterion_main!(benches);
