//! Criterion benchmarks: the three access strategies on one workload.
//!
//! Exclusive and thread-local never lock; shared takes the mutex on every
//! allocation. All three reset through the registry after each iteration.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use monotonic_arena::{Access, ExclusiveAccess, Registry, SharedAccess, ThreadLocalAccess};
use monotonic_bench::nested_rows;

enum Bench {}

fn run<A: Access>(registry: &mut Registry) -> usize {
    let out = nested_rows(registry.allocator::<u32, Bench, A>(), 128, 32);
    registry.reset::<Bench, A>();
    out
}

fn bench_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_strategy");
    let mut registry = Registry::new();

    group.bench_function("exclusive", |b| {
        b.iter(|| black_box(run::<ExclusiveAccess>(&mut registry)))
    });
    group.bench_function("thread_local", |b| {
        b.iter(|| black_box(run::<ThreadLocalAccess>(&mut registry)))
    });
    group.bench_function("shared", |b| {
        b.iter(|| black_box(run::<SharedAccess>(&mut registry)))
    });
    group.finish();
}

criterion_group!(benches, bench_access);
criterion_main!(benches);
