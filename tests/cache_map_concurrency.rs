// ==============================================
// CACHE MAP CONCURRENCY TESTS (integration)
// ==============================================
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tiercache::prelude::*;

/// Route library logs to the test harness; filter with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn shared_cache(lru: bool, cache_size: usize, soft: usize) -> CacheMap<String, usize> {
    CacheMapBuilder::new()
        .lru(lru)
        .cache_size(cache_size)
        .soft_reference_size(soft)
        .lock_timeout(Duration::from_secs(5))
        .concurrency_level(8)
        .build()
}

#[test]
fn mixed_workload_keeps_invariants() {
    init_tracing();
    for lru in [true, false] {
        let cache = shared_cache(lru, 100, 50);
        let num_threads = 8;
        let ops_per_thread = 1_000;
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|thread_id| {
                let cache = cache.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..ops_per_thread {
                        let key = format!("k{}", (thread_id * 31 + i) % 300);
                        match i % 6 {
                            0 | 1 => {
                                cache.put(key, i).unwrap();
                            },
                            2 | 3 => {
                                let _ = cache.get(&key).unwrap();
                            },
                            4 => {
                                let _ = cache.contains_key(&key).unwrap();
                            },
                            _ => {
                                let _ = cache.remove(&key).unwrap();
                            },
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        cache.check_invariants().unwrap().unwrap();
        assert!(cache.len().unwrap() <= 150);
    }
}

#[test]
fn pinned_keys_survive_concurrent_pressure() {
    let cache = shared_cache(true, 16, 16);
    for i in 0..4 {
        let key = format!("pinned-{}", i);
        cache.put(key.clone(), i).unwrap();
        assert!(cache.pin(key).unwrap());
    }

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    cache.put(format!("churn-{}-{}", t, i), i).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..4 {
        let value = cache.get(&format!("pinned-{}", i)).unwrap();
        assert_eq!(value.map(|v| *v), Some(i));
    }
}

#[test]
fn reclaim_runs_without_the_lock() {
    let cache = shared_cache(false, 8, 64);
    let stop = Arc::new(AtomicBool::new(false));
    let reclaims = Arc::new(AtomicUsize::new(0));

    let reclaimer = {
        let handle = cache.reclaim_handle();
        let stop = Arc::clone(&stop);
        let reclaims = Arc::clone(&reclaims);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                handle.reclaim();
                reclaims.fetch_add(1, Ordering::Relaxed);
                thread::yield_now();
            }
        })
    };

    for i in 0..2_000 {
        let key = format!("k{}", i % 100);
        cache.put(key.clone(), i).unwrap();
        let _ = cache.get(&key).unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    reclaimer.join().unwrap();

    assert!(reclaims.load(Ordering::Relaxed) > 0);
    cache.check_invariants().unwrap().unwrap();
}

#[test]
fn contended_writer_times_out_instead_of_blocking() {
    init_tracing();
    let cache: CacheMap<u32, u32> = CacheMapBuilder::new()
        .lock_timeout(Duration::from_millis(20))
        .build();
    let blocker = cache.clone();
    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));

    let listener = Arc::new(Blocking {
        started: Arc::clone(&started),
        release: Arc::clone(&release),
    });
    cache.set_listener(Some(listener)).unwrap();
    cache.set_cache_size(0).unwrap();
    cache.set_soft_reference_size(0).unwrap();

    // The put below overflows immediately; the listener then parks while
    // the exclusive lock is held.
    let holder = thread::spawn(move || {
        blocker.put(1, 1).unwrap();
    });
    started.wait();

    let err = cache.put(2, 2).unwrap_err();
    assert!(err.is_lock_timeout());
    let err = cache.contains_key(&2).unwrap_err();
    assert!(matches!(err, CacheError::LockTimeout { mode: LockMode::Shared, .. }));

    release.wait();
    holder.join().unwrap();
    assert!(cache.put(2, 2).is_ok());
}

struct Blocking {
    started: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl EvictionListener<u32, u32> for Blocking {
    fn on_primary_overflow(&self, key: &u32, _value: &Arc<u32>, _demoted: bool) {
        if *key == 1 {
            self.started.wait();
            self.release.wait();
        }
    }
}
