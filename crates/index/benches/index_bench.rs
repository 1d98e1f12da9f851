//! Benchmarks for tally-index.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tally_core::{AggMode, Snapshot};
use tally_index::{CountIndex, FieldComparator, Order, OrderedIndex};

fn bench_count_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_index");

    for size in [100, 1_000, 10_000] {
        // Few distinct values: most inserts only bump a counter
        group.bench_with_input(BenchmarkId::new("insert_dup_heavy", size), &size, |b, &size| {
            b.iter(|| {
                let mut index = CountIndex::new();
                for i in 0..size {
                    index.insert(black_box(i as i64 % 16));
                }
                index.top(AggMode::Min).copied()
            })
        });

        group.bench_with_input(BenchmarkId::new("replace_value", size), &size, |b, &size| {
            let mut index = CountIndex::new();
            for i in 0..size {
                index.insert(i as i64);
            }
            let mut i = 0i64;
            b.iter(|| {
                index.erase_one(i % size as i64);
                index.insert(i % size as i64);
                i += 1;
                index.top(AggMode::Max).copied()
            })
        });
    }

    group.finish();
}

fn bench_ordered_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_index");

    for size in [100, 1_000, 10_000] {
        let cmp = Arc::new(FieldComparator::field2(Order::Asc));
        let mut index: OrderedIndex<f64, i64> = OrderedIndex::new(cmp);
        for i in 0..size {
            index.insert(i as u64, Snapshot::new(0.0f64, i as i64));
        }

        group.bench_with_input(BenchmarkId::new("reposition", size), &size, |b, &size| {
            let mut flip = false;
            b.iter(|| {
                let id = (size / 2) as u64;
                let (old, new) = if flip {
                    (Snapshot::new(0.0, -1), Snapshot::new(0.0, id as i64))
                } else {
                    (Snapshot::new(0.0, id as i64), Snapshot::new(0.0, -1))
                };
                flip = !flip;
                index.reposition(black_box(id), &old, &new)
            })
        });

        group.bench_with_input(BenchmarkId::new("top_10", size), &size, |b, _| {
            b.iter(|| index.top_k(black_box(10)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_count_index, bench_ordered_index);
criterion_main!(benches);
