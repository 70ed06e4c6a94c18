//! Buffer pool benchmarks: resident-fetch throughput and eviction churn.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clockcache::{BufferPool, BufferPoolManager, DiskManager};
use tempfile::tempfile;

fn create_bpm(pool_size: usize) -> BufferPoolManager {
    let disk = DiskManager::from_file(tempfile().unwrap()).unwrap();
    BufferPoolManager::new(disk, BufferPool::new(pool_size))
}

fn bench_fetch_hit(c: &mut Criterion) {
    let bpm = create_bpm(64);
    let page_id = {
        let mut lease = bpm.create_page().unwrap();
        lease.data_mut()[0] = 1;
        lease.page_id()
    };

    c.bench_function("fetch_page_hit", |b| {
        b.iter(|| {
            let lease = bpm.fetch_page(black_box(page_id)).unwrap();
            black_box(lease.data()[0]);
        })
    });
}

fn bench_create_with_eviction(c: &mut Criterion) {
    // Small pool: every create past the eighth evicts a clean page.
    let bpm = create_bpm(8);

    c.bench_function("create_page_churn", |b| {
        b.iter(|| {
            let lease = bpm.create_page().unwrap();
            black_box(lease.page_id());
        })
    });
}

criterion_group!(benches, bench_fetch_hit, bench_create_with_eviction);
criterion_main!(benches);
