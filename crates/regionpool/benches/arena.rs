//! Criterion benchmarks for arena operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use regionpool::{Arena, TransferMode};

const CAPACITY: usize = 1024 * 1024;

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_until_full");
    for &size in &[8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut arena = Arena::new(CAPACITY).unwrap();
            b.iter(|| {
                while let Ok(alloc) = arena.fill(black_box(size)) {
                    black_box(alloc);
                }
                arena.reset();
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("fill_until_full_instrumented");
    for &size in &[8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut arena = Arena::with_diagnostics(CAPACITY).unwrap();
            b.iter(|| {
                while let Ok(alloc) = arena.fill(black_box(size)) {
                    black_box(alloc);
                }
                arena.reset();
            });
        });
    }
    group.finish();
}

fn bench_construct(c: &mut Criterion) {
    c.bench_function("construct_destroy_1m", |b| {
        b.iter(|| {
            let mut arena = Arena::new(black_box(CAPACITY)).unwrap();
            arena.destroy();
        });
    });
}

fn bench_resize(c: &mut Criterion) {
    c.bench_function("grow_shrink_with_live_data", |b| {
        let mut seed = Arena::new(CAPACITY).unwrap();
        seed.fill(CAPACITY / 2).unwrap();
        let mut slot = Some(seed);
        b.iter(|| {
            let Some(arena) = slot.take() else { return };
            let capacity = arena.capacity();
            let arena = arena.resize(capacity * 4).unwrap();
            slot = Some(arena.resize(capacity).unwrap());
        });
    });
}

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer");
    for &bytes in &[4 * 1024usize, 256 * 1024] {
        let mut source = Arena::new(bytes).unwrap();
        source.fill(bytes).unwrap();
        let mut dest = Arena::new(bytes).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(bytes), &bytes, |b, _| {
            b.iter(|| dest.copy_from(&source, TransferMode::Overwrite).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fill, bench_construct, bench_resize, bench_transfer);
criterion_main!(benches);
