use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use paged_graph_core::{AllocationTracker, HugeArrayBuilder, HugeLongArray};

fn bench_get_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("huge_get_sequential");
    let n = 1_000_000usize;
    let mut single = HugeLongArray::new_single(n, &AllocationTracker::empty()).unwrap();
    let mut paged = HugeLongArray::new_paged(n, &AllocationTracker::empty()).unwrap();
    single.set_all(|i| i as i64);
    paged.set_all(|i| i as i64);

    for (name, array) in [("single", &single), ("paged", &paged)] {
        group.bench_with_input(BenchmarkId::new("get", name), array, |b, array| {
            b.iter(|| {
                let mut sum = 0i64;
                for i in 0..n {
                    sum = sum.wrapping_add(array.get(i));
                }
                black_box(sum)
            });
        });
        group.bench_with_input(BenchmarkId::new("cursor", name), array, |b, array| {
            b.iter(|| {
                let mut sum = 0i64;
                let mut cursor = array.cursor();
                while cursor.next() {
                    for v in cursor.slice() {
                        sum = sum.wrapping_add(*v);
                    }
                }
                black_box(sum)
            });
        });
    }
    group.finish();
}

fn bench_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("huge_copy_to");
    let n = 1_000_000usize;
    let src = HugeLongArray::new_paged(n, &AllocationTracker::empty()).unwrap();
    group.bench_function(BenchmarkId::from_parameter("paged_to_single"), |b| {
        b.iter_batched(
            || HugeLongArray::new_single(n, &AllocationTracker::empty()).unwrap(),
            |mut dest| {
                src.copy_to(&mut dest, n);
                dest
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("huge_builder_fill");
    let n = 1_000_000usize;
    for &threads in &[1usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter_batched(
                || HugeLongArray::new_paged(n, &AllocationTracker::empty()).unwrap(),
                |mut array| {
                    let builder = HugeArrayBuilder::new(&mut array);
                    std::thread::scope(|scope| {
                        for _ in 0..threads {
                            let builder = &builder;
                            scope.spawn(move || {
                                while let Some(mut adder) = builder.allocate(10_000) {
                                    adder.fill_with(|i| i as i64);
                                }
                            });
                        }
                    });
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_get_sequential, bench_copy, bench_builder);
criterion_main!(benches);
