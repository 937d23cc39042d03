use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::num::NonZeroUsize;
use std::time::Duration;

use memvault_storage::{Db, LruStore};

fn capacity(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn bench_set_get_sequential(c: &mut Criterion) {
    c.bench_function("set_get_sequential_10k", |b| {
        b.iter(|| {
            let mut store = LruStore::new(capacity(10_000));
            for i in 0..10_000 {
                let key = format!("key:{i}");
                store.set(key.clone(), format!("value:{i}"), Some(Duration::from_secs(120)));
                black_box(store.get(&key));
            }
        })
    });
}

fn bench_set_with_eviction(c: &mut Criterion) {
    c.bench_function("set_with_eviction_10k_cap_128", |b| {
        b.iter(|| {
            let mut store = LruStore::new(capacity(128));
            for i in 0..10_000 {
                store.set(format!("key:{i}"), format!("value:{i}"), None);
            }
            black_box(store.len())
        })
    });
}

fn bench_shared_db_concurrent(c: &mut Criterion) {
    c.bench_function("shared_db_4_threads_10k", |b| {
        b.iter(|| {
            let db = Db::new(capacity(1024));
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let db = db.clone();
                    std::thread::spawn(move || {
                        for i in 0..2_500 {
                            let key = format!("t{t}:key:{}", i % 512);
                            db.set(key.clone(), i.to_string(), None).unwrap();
                            black_box(db.get(&key).unwrap());
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    bench_set_get_sequential,
    bench_set_with_eviction,
    bench_shared_db_concurrent,
);
criterion_main!(benches);
