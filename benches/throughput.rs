use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weir::WorkPool;

fn bench_submit_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_drain");

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, &workers| {
                b.iter(|| {
                    let mut pool = WorkPool::new(workers).unwrap();
                    let counter = Arc::new(AtomicUsize::new(0));

                    for _ in 0..1_000 {
                        let counter = counter.clone();
                        pool.submit(move || {
                            counter.fetch_add(1, Ordering::Relaxed);
                            Ok(())
                        });
                    }

                    pool.wait().unwrap();
                    black_box(counter.load(Ordering::Relaxed))
                });
            },
        );
    }

    group.finish();
}

fn bench_submit_wait_roundtrip(c: &mut Criterion) {
    c.bench_function("submit_wait_roundtrip", |b| {
        let pool = WorkPool::new(2).unwrap();
        b.iter(|| {
            pool.submit_wait(|| Ok(black_box(())));
        });
    });
}

criterion_group!(benches, bench_submit_drain, bench_submit_wait_roundtrip);
criterion_main!(benches);
