//! Benchmark for PersistentVector vs standard Vec.
//!
//! Compares append, indexed access, iteration and construction against
//! Rust's standard Vec.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use persistent_trie::persistent::{PersistentVector, factory};
use std::hint::black_box;

// =============================================================================
// add Benchmark
// =============================================================================

fn benchmark_add(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("add");

    for size in [100, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("PersistentVector", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut vector = PersistentVector::new();
                    for index in 0..size {
                        vector = vector.add(black_box(index));
                    }
                    black_box(vector)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("Vec", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut vector = Vec::new();
                for index in 0..size {
                    vector.push(black_box(index));
                }
                black_box(vector)
            });
        });
    }

    group.finish();
}

// =============================================================================
// get Benchmark (Random Access)
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100, 1000, 10000] {
        let persistent_vector: PersistentVector<i32> = (0..size).collect();
        let standard_vector: Vec<i32> = (0..size).collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentVector", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut sum = 0;
                    for index in 0..size as usize {
                        if let Ok(&value) = persistent_vector.get(black_box(index)) {
                            sum += value;
                        }
                    }
                    black_box(sum)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("Vec", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut sum = 0;
                for index in 0..size as usize {
                    if let Some(&value) = standard_vector.get(black_box(index)) {
                        sum += value;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Iteration Benchmark
// =============================================================================

fn benchmark_iteration(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("iteration");

    for size in [1000, 10000, 100_000] {
        let persistent_vector: PersistentVector<i64> = (0..size).collect();
        let standard_vector: Vec<i64> = (0..size).collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentVector", size),
            &persistent_vector,
            |bencher, vector| {
                bencher.iter(|| black_box(vector.iter().sum::<i64>()));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("Vec", size),
            &standard_vector,
            |bencher, vector| {
                bencher.iter(|| black_box(vector.iter().sum::<i64>()));
            },
        );
    }

    group.finish();
}

// =============================================================================
// Construction Benchmark
// =============================================================================

fn benchmark_construction(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("construction");

    for size in [1000, 10000, 100_000] {
        let source: Vec<i32> = (0..size).collect();

        group.bench_with_input(
            BenchmarkId::new("sequence_from_slice", size),
            &source,
            |bencher, source| {
                bencher.iter(|| black_box(factory::sequence_from_slice(source)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sequence_from_iter", size),
            &source,
            |bencher, source| {
                bencher.iter(|| black_box(factory::sequence_from_iter(source.iter().copied())));
            },
        );
    }

    group.finish();
}

// =============================================================================
// append Benchmark
// =============================================================================

fn benchmark_append(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("append");

    for size in [100, 1000, 10000] {
        let left: PersistentVector<i32> = (0..size).collect();
        let right: PersistentVector<i32> = (size..size * 2).collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentVector", size),
            &(left, right),
            |bencher, (left, right)| {
                bencher.iter(|| black_box(left.append(black_box(right))));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_add,
    benchmark_get,
    benchmark_iteration,
    benchmark_construction,
    benchmark_append
);

criterion_main!(benches);
