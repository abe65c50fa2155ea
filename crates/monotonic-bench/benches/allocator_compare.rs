//! Criterion benchmarks: arena versus global allocator on container
//! workloads, with one arena reset per iteration.

use std::hint::black_box;

use allocator_api2::alloc::Global;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use monotonic_arena::{MonotonicAllocator, Storage};
use monotonic_bench::{fill_and_sort, nested_rows, pair_list, random_numbers};

const SEED: u64 = 42;

fn bench_fill_and_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_and_sort");
    for len in [100usize, 10_000, 100_000] {
        let input = random_numbers(len, SEED);

        group.bench_with_input(BenchmarkId::new("global", len), &input, |b, input| {
            b.iter(|| black_box(fill_and_sort(Global, black_box(input))))
        });

        let mut storage: Storage = Storage::new();
        group.bench_with_input(BenchmarkId::new("arena", len), &input, |b, input| {
            b.iter(|| {
                let alloc: MonotonicAllocator<'_, u32> = MonotonicAllocator::new(&storage);
                let out = fill_and_sort(alloc, black_box(input));
                storage.reset();
                black_box(out)
            })
        });
    }
    group.finish();
}

fn bench_nested_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_rows");
    for rows in [16usize, 256] {
        group.bench_function(BenchmarkId::new("global", rows), |b| {
            b.iter(|| black_box(nested_rows(Global, black_box(rows), 64)))
        });

        let mut storage: Storage = Storage::new();
        group.bench_function(BenchmarkId::new("arena", rows), |b| {
            b.iter(|| {
                let alloc: MonotonicAllocator<'_, u32> = MonotonicAllocator::new(&storage);
                let out = nested_rows(alloc, black_box(rows), 64);
                storage.reset();
                black_box(out)
            })
        });
    }
    group.finish();
}

fn bench_pair_list(c: &mut Criterion) {
    let input = random_numbers(20_000, SEED);
    let mut group = c.benchmark_group("pair_list");

    group.bench_function("global", |b| {
        b.iter(|| black_box(pair_list(Global, black_box(&input))))
    });

    let mut storage: Storage = Storage::new();
    group.bench_function("arena", |b| {
        b.iter(|| {
            let alloc: MonotonicAllocator<'_, u32> = MonotonicAllocator::new(&storage);
            let out = pair_list(alloc, black_box(&input));
            storage.reset();
            black_box(out)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_fill_and_sort,
    bench_nested_rows,
    bench_pair_list
);
criterion_main!(benches);
