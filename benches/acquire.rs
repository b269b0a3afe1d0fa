use criterion::{Criterion, black_box, criterion_group, criterion_main};
use esox_resourcepool::{BoxError, PoolRegistry, RegistryConfiguration, ResourcePool};
use std::thread;

fn bench_uncontended(c: &mut Criterion) {
    let pool = ResourcePool::infallible(4, || vec![0u8; 4096], |buf: &mut Vec<u8>| buf.fill(0)).unwrap();
    pool.warmup(4).unwrap();

    c.bench_function("acquire_release_uncontended", |b| {
        b.iter(|| {
            let lease = pool.acquire().unwrap();
            black_box(lease.len());
        })
    });
}

fn bench_contended(c: &mut Criterion) {
    let pool = ResourcePool::infallible(2, || vec![0u8; 4096], |buf: &mut Vec<u8>| buf.fill(0)).unwrap();

    c.bench_function("acquire_release_4_threads_2_slots", |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..100 {
                            let mut lease = pool.acquire().unwrap();
                            lease[0] = 1;
                        }
                    });
                }
            });
        })
    });
}

fn bench_registry_lookup(c: &mut Criterion) {
    let registry = PoolRegistry::new(
        RegistryConfiguration::new(),
        |tier| Ok::<_, BoxError>(vec![0u8; tier]),
        |_: &mut Vec<u8>| Ok::<_, BoxError>(()),
    )
    .unwrap();

    c.bench_function("registry_acquire_existing_tier", |b| {
        b.iter(|| {
            let lease = registry.acquire(black_box(100)).unwrap();
            black_box(lease.len());
        })
    });
}

criterion_group!(benches, bench_uncontended, bench_contended, bench_registry_lookup);
criterion_main!(benches);
