//! Performance benchmarks for response normalization.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench normalizer_bench
//! ```

use cardlink_bridge::normalizer::{normalize, normalize_document};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

/// A scan response as a card SDK returns it.
fn create_card_document() -> Value {
    json!({
        "cardId": "CB79000000018201",
        "batchId": "0017",
        "health": 0,
        "isActivated": false,
        "manufacturerName": "TANGEM",
        "settingsMask": ["AllowSetPIN1", "AllowSetPIN2", "AllowUnencrypted"],
        "signingMethods": ["SignHash"],
        "walletRemainingSignatures": 100,
        "firmwareVersion": { "major": 4, "minor": 12, "hotFix": 0, "type": "r" },
        "ratio": 0.75,
        "issuer": null,
    })
}

/// A sign response carrying `count` signatures.
fn create_sign_document(count: usize) -> Value {
    let signatures: Vec<String> = (0..count).map(|i| format!("{i:0128X}")).collect();
    json!({
        "cardId": "CB79000000018201",
        "signature": signatures,
        "walletSignedHashes": count,
        "walletRemainingSignatures": 100 - count.min(100),
    })
}

fn bench_normalize_card(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_card");
    group.throughput(Throughput::Elements(1));

    let document = create_card_document();
    group.bench_function("normalize_card_document", |b| {
        b.iter(|| black_box(normalize(black_box(&document))));
    });

    let text = document.to_string();
    group.bench_function("parse_and_normalize_card_document", |b| {
        b.iter(|| black_box(normalize_document(black_box(&text)).unwrap()));
    });

    group.finish();
}

/// Benchmark normalization as the signature list grows.
fn bench_normalize_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_sign");

    for count in [1usize, 10, 100] {
        let document = create_sign_document(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &document, |b, document| {
            b.iter(|| black_box(normalize(black_box(document))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize_card, bench_normalize_sign);
criterion_main!(benches);
