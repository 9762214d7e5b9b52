use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use prime_pool::core::sieve_of_atkin;
use prime_pool::prelude::*;
use std::time::Duration;

fn benchmark_sieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("sieve_of_atkin");

    for end in [1_000i64, 100_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(end), &end, |b, &end| {
            b.iter(|| sieve_of_atkin(black_box(1), black_box(end)).expect("valid range"));
        });
    }

    // Narrow window near the top still sieves from zero
    group.bench_function("window_near_1m", |b| {
        b.iter(|| sieve_of_atkin(black_box(999_000), black_box(1_000_000)).expect("valid range"));
    });

    group.finish();
}

fn benchmark_pool_creation(c: &mut Criterion) {
    c.bench_function("prime_pool_creation", |b| {
        b.iter(|| {
            let pool = PrimePool::with_workers(4).expect("Failed to create pool");
            pool.start().expect("Failed to start pool");
            pool.shutdown().expect("Failed to shutdown pool");
        });
    });
}

fn benchmark_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("small_ranges_1000", |b| {
        b.iter_batched(
            || {
                let pool = PrimePool::with_workers(8).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                pool
            },
            |pool| {
                for i in 0..1000 {
                    pool.submit(format!("job-{}", i), 1, 1_000)
                        .expect("Failed to submit job");
                }
                pool.shutdown().expect("Failed to shutdown pool");

                // Shutdown drains the queue, so every result is stored
                assert_eq!(pool.fetch_all().len(), 1000, "Not all jobs completed");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_bounded_queue(c: &mut Criterion) {
    c.bench_function("bounded_queue_pressure", |b| {
        b.iter_batched(
            || {
                let config = PrimePoolConfig::new(2).with_queue_capacity(4);
                let pool = PrimePool::with_config(config).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                pool
            },
            |pool| {
                // Far more jobs than the queue holds: submitters block
                for i in 0..100 {
                    pool.submit(format!("job-{}", i), 1, 50_000)
                        .expect("Failed to submit job");
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_sieve,
    benchmark_pool_creation,
    benchmark_throughput,
    benchmark_bounded_queue
);
criterion_main!(benches);
