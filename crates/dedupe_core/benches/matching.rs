// benches/matching.rs - Performance benchmarks
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dedupe_core::config::Config;
use dedupe_core::ids::canonicalize;
use dedupe_core::model::Record;
use dedupe_core::normalize::normalize;
use dedupe_core::pipeline::{self, CancellationToken};

// ============================================================================
// ID Canonicalization
// ============================================================================

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");

    let test_cases = vec![
        ("15_char", "001A000000BcDeF"),
        ("18_char", "001A000000BcDeFAA"),
    ];

    for (name, id) in test_cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), id, |b, id| {
            b.iter(|| canonicalize(black_box(id)));
        });
    }

    group.finish();
}

// ============================================================================
// Normalization
// ============================================================================

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let names = vec![
        ("simple", "Acme Inc"),
        ("with_alias", "Foo Corp; Bar Corp; Baz LLC"),
        ("with_numeric_style", "7-Eleven Store #123 Inc"),
    ];

    for (name, account_name) in names {
        let record = Record {
            account_id: "001A000000BcDeFAA".to_string(),
            account_id_src: "001A000000BcDeF".to_string(),
            account_name: account_name.to_string(),
            created_date: Some(Utc::now()),
            relationship: "Customer".to_string(),
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &record, |b, record| {
            b.iter(|| normalize(black_box(record)));
        });
    }

    group.finish();
}

// ============================================================================
// Full pipeline
// ============================================================================

fn bench_pipeline_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_run");

    for size in [10usize, 100, 500] {
        let records: Vec<Record> = (0..size)
            .map(|i| Record {
                account_id: format!("{i:0>18}"),
                account_id_src: format!("{i:0>15}"),
                account_name: format!("Acme Holdings {} Inc", i % 20),
                created_date: Some(Utc::now()),
                relationship: "Customer".to_string(),
            })
            .collect();
        let config = Config::default();

        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                pipeline::run(black_box(records), &config, None, None, &CancellationToken::new())
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_canonicalize, bench_normalize, bench_pipeline_run);
criterion_main!(benches);
