//! Micro-benchmarks for the per-operation cost of each policy.
//!
//! Run with: `cargo bench --bench policies`

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use kvs_cache::builder::{Cache, CacheBuilder, CachePolicy};
use kvs_cache::store::MemoryStore;
use kvs_cache::traits::WriteBackCache;

const CAPACITY: usize = 1024;

fn warm_cache(policy: CachePolicy) -> Cache<MemoryStore> {
    let mut cache = CacheBuilder::new(CAPACITY)
        .build(policy, MemoryStore::new())
        .unwrap();
    for i in 0..CAPACITY {
        cache.set(&format!("key-{i}"), "value").unwrap();
    }
    cache
}

fn keys(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("key-{i}")).collect()
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit");
    let hits = keys(0..CAPACITY);
    for policy in CachePolicy::ALL {
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter_batched(
                || warm_cache(policy),
                |mut cache| {
                    for key in &hits {
                        let _ = black_box(cache.get(black_box(key)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_set_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_update");
    let hits = keys(0..CAPACITY);
    for policy in CachePolicy::ALL {
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter_batched(
                || warm_cache(policy),
                |mut cache| {
                    for key in &hits {
                        cache.set(black_box(key), "updated").unwrap();
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction_churn");
    let fresh = keys(CAPACITY..CAPACITY * 4);
    for policy in CachePolicy::ALL {
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter_batched(
                || warm_cache(policy),
                |mut cache| {
                    for key in &fresh {
                        cache.set(black_box(key), "value").unwrap();
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    for policy in CachePolicy::ALL {
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter_batched(
                || warm_cache(policy),
                |mut cache| black_box(cache.flush()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_get_hit,
    bench_set_update,
    bench_eviction_churn,
    bench_flush
);
criterion_main!(benches);
