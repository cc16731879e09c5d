use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use paged_graph_core::{AllocationTracker, HugeDisjointSetStruct, PagedDisjointSetStruct};
use rand::Rng;

fn random_pairs(capacity: usize, count: usize) -> Vec<(usize, usize)> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| (rng.random_range(0..capacity), rng.random_range(0..capacity)))
        .collect()
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("dss_union");
    let capacity = 100_000usize;
    let pairs = random_pairs(capacity, 200_000);

    group.bench_function(BenchmarkId::from_parameter("huge"), |b| {
        b.iter_batched(
            || HugeDisjointSetStruct::new(capacity, &AllocationTracker::empty()).unwrap(),
            |mut dss| {
                for &(p, q) in &pairs {
                    dss.union(p, q);
                }
                black_box(dss.get_set_count())
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function(BenchmarkId::from_parameter("paged"), |b| {
        b.iter_batched(
            || PagedDisjointSetStruct::new(capacity, &AllocationTracker::empty()).unwrap(),
            |mut dss| {
                for &(p, q) in &pairs {
                    dss.union(p, q);
                }
                black_box(dss.get_set_count())
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let capacity = 100_000usize;
    let mut other = HugeDisjointSetStruct::new(capacity, &AllocationTracker::empty()).unwrap();
    for (p, q) in random_pairs(capacity, 50_000) {
        other.union(p, q);
    }
    c.bench_function("dss_merge", |b| {
        b.iter_batched(
            || HugeDisjointSetStruct::new(capacity, &AllocationTracker::empty()).unwrap(),
            |mut dss| {
                let _ = dss.merge(&other);
                dss
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_union, bench_merge);
criterion_main!(benches);
