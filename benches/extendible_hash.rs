use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pagecache::buffer::BufferPoolManager;
use pagecache::container::hash::{BuildIdentityHasher, ExtendibleHashTable};
use pagecache::storage::MemoryDiskManager;

fn benchmark_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("extendible_hash_insert");

    for size in [1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("identity", size), &size, |b, &size| {
            b.iter(|| {
                let table: ExtendibleHashTable<u64, u64, BuildIdentityHasher> =
                    ExtendibleHashTable::with_hasher(4, BuildIdentityHasher::default());
                for key in 0..size {
                    table.insert(key, key);
                }
                black_box(table.global_depth())
            });
        });

        group.bench_with_input(BenchmarkId::new("random_state", size), &size, |b, &size| {
            b.iter(|| {
                let table = ExtendibleHashTable::new(4);
                for key in 0..size {
                    table.insert(key, key);
                }
                black_box(table.global_depth())
            });
        });
    }

    group.finish();
}

fn benchmark_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("extendible_hash_find");

    for bucket_size in [2usize, 8, 32] {
        let table = ExtendibleHashTable::new(bucket_size);
        for key in 0..10_000u64 {
            table.insert(key, key * 2);
        }

        group.bench_with_input(
            BenchmarkId::new("hit", bucket_size),
            &table,
            |b, table| {
                let mut key = 0u64;
                b.iter(|| {
                    key = (key + 7919) % 10_000;
                    black_box(table.find(&key))
                });
            },
        );
    }

    group.finish();
}

fn benchmark_pool_fetch(c: &mut Criterion) {
    let bpm = BufferPoolManager::new(64, MemoryDiskManager::new());
    let pids: Vec<_> = (0..256).map(|_| bpm.allocate_page()).collect();

    c.bench_function("pool_fetch_unpin_cycle", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let pid = pids[i % pids.len()];
            i += 1;
            let guard = bpm.fetch_page_read(pid).unwrap();
            black_box(guard.as_slice()[0])
        });
    });
}

criterion_group!(benches, benchmark_insert, benchmark_find, benchmark_pool_fetch);
criterion_main!(benches);
