//! FILENAME: pivot-engine/benches/pivot_calculations.rs
//! Pivot throughput for single and composite row keys.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pivot_engine::{aggregate, to_rows, to_table, AggregationType, PivotDefinition, RowSelector};

struct Sale {
    region: u32,
    product: u32,
    month: u32,
    amount: f64,
}

fn generate(rows: usize) -> Vec<Sale> {
    (0..rows)
        .map(|i| Sale {
            region: (i % 50) as u32,
            product: ((i / 50) % 20) as u32,
            month: ((i * 7) % 12) as u32 + 1,
            amount: (i % 1000) as f64 * 0.5,
        })
        .collect()
}

fn single_key<'a>() -> PivotDefinition<'a, Sale> {
    PivotDefinition::new(
        |s: &Sale| s.month,
        RowSelector::single("region", |s: &Sale| s.region),
        aggregate(AggregationType::Sum, |s: &Sale| s.amount),
    )
}

fn composite_key<'a>() -> PivotDefinition<'a, Sale> {
    PivotDefinition::new(
        |s: &Sale| s.month,
        RowSelector::composite()
            .field("region", |s: &Sale| s.region)
            .field("product", |s: &Sale| s.product),
        aggregate(AggregationType::Average, |s: &Sale| s.amount),
    )
}

fn bench_to_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_table");
    for rows in [1_000usize, 10_000, 100_000] {
        let source = generate(rows);
        let single = single_key();
        let composite = composite_key();

        group.bench_with_input(BenchmarkId::new("single", rows), &source, |b, source| {
            b.iter(|| to_table(black_box(source), &single))
        });
        group.bench_with_input(BenchmarkId::new("composite", rows), &source, |b, source| {
            b.iter(|| to_table(black_box(source), &composite))
        });
    }
    group.finish();
}

fn bench_to_rows(c: &mut Criterion) {
    let source = generate(10_000);
    let definition = composite_key();
    c.bench_function("to_rows/composite/10000", |b| {
        b.iter(|| to_rows(black_box(&source), &definition))
    });
}

criterion_group!(benches, bench_to_table, bench_to_rows);
criterion_main!(benches);
