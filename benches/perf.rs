use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use scout_rank::config::{FeatureGroup, RankingConfig};
use scout_rank::normalize::normalize_populations;
use scout_rank::pipeline::{rank_normalized, rank_populations};
use scout_rank::reference::build_working_table;
use scout_rank::similarity::run_battery;
use scout_rank::synthetic::{DEFAULT_METRICS, synthetic_regions};

fn bench_normalize(c: &mut Criterion) {
    let regions = synthetic_regions(1, &["A", "B", "C", "D"], 500, &DEFAULT_METRICS);
    c.bench_function("normalize_populations_2000", |b| {
        b.iter(|| {
            let table = normalize_populations(black_box(&regions));
            black_box(table.len());
        })
    });
}

fn bench_battery(c: &mut Criterion) {
    let regions = synthetic_regions(2, &["A", "B"], 1000, &DEFAULT_METRICS);
    let table = normalize_populations(&regions);
    let working = build_working_table(&table).expect("non-empty table");
    let config = RankingConfig::new(DEFAULT_METRICS);
    c.bench_function("similarity_battery_2000", |b| {
        b.iter(|| {
            let results = run_battery(black_box(&working), &config.weights);
            black_box(results.len());
        })
    });
}

fn bench_full_ranking(c: &mut Criterion) {
    let regions = synthetic_regions(3, &["A", "B", "C"], 400, &DEFAULT_METRICS);
    let plain = RankingConfig::new(DEFAULT_METRICS);
    let grouped = RankingConfig::new(DEFAULT_METRICS)
        .with_group(FeatureGroup::new("Attack", ["Goals", "Expected goals", "Assists"]))
        .with_group(FeatureGroup::new("Defence", ["Tackles won", "Interceptions"]));

    c.bench_function("rank_populations_1200", |b| {
        b.iter(|| {
            let report = rank_populations(black_box(&regions), &plain).unwrap();
            black_box(report.rows.len());
        })
    });

    let normalized = normalize_populations(&regions);
    c.bench_function("rank_normalized_grouped_1200", |b| {
        b.iter(|| {
            let report = rank_normalized(black_box(&normalized), &grouped).unwrap();
            black_box(report.rows.len());
        })
    });
}

criterion_group!(benches, bench_normalize, bench_battery, bench_full_ranking);
criterion_main!(benches);
