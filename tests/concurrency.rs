// ==============================================
// CACHE CONCURRENCY TESTS (integration)
// ==============================================
//
// Multi-threaded get/put traffic against both cache flavours. Checks the
// capacity bound, structural invariants and exactly-once eviction delivery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use evictkit::notify::{ObserverError, OverflowPolicy};
use evictkit::{CacheBuilder, LruCache, ShardedLruCache};

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 2_000;

fn init_test_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

fn blocking_cache(capacity: usize) -> LruCache<usize> {
    init_test_logger();
    CacheBuilder::new(capacity)
        .overflow(OverflowPolicy::Block)
        .queue_capacity(64)
        .build()
        .unwrap()
}

fn blocking_sharded(capacity: usize, shards: usize) -> ShardedLruCache<usize> {
    init_test_logger();
    CacheBuilder::new(capacity)
        .shards(shards)
        .overflow(OverflowPolicy::Block)
        .queue_capacity(64)
        .build_sharded()
        .unwrap()
}

// ==============================================
// Capacity Bound
// ==============================================

mod capacity_bound {
    use super::*;

    #[test]
    fn len_never_exceeds_capacity_under_contention() {
        let cache = Arc::new(blocking_cache(32));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..OPS_PER_THREAD {
                        let key = format!("k{}", (t * 7 + i) % 128);
                        if i % 3 == 0 {
                            let _ = cache.get(key.as_str());
                        } else {
                            cache.put(key.as_str(), i).unwrap();
                        }
                        assert!(cache.len() <= 32);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 32);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn sharded_len_never_exceeds_capacity() {
        let cache = Arc::new(blocking_sharded(40, 4));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..OPS_PER_THREAD {
                        let key = format!("t{t}-{}", i % 50);
                        cache.put(key.as_str(), i).unwrap();
                        let _ = cache.get(key.as_str());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 40);
        for (len, cap) in cache.shard_sizes() {
            assert!(len <= cap);
        }
        cache.check_invariants().unwrap();
    }
}

// ==============================================
// Eviction Accounting
// ==============================================
//
// Every distinct key inserted either remains live or was evicted exactly
// once. With the blocking overflow policy no notice is dropped, so after
// dispose the observer has seen `distinct - live` notices.

mod eviction_accounting {
    use super::*;

    type Tally = Arc<Mutex<HashMap<String, usize>>>;

    fn tally() -> (Tally, impl Fn(&str) -> Result<(), ObserverError> + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(HashMap::new()));
        let sink = Arc::clone(&seen);
        let observer = move |key: &str| -> Result<(), ObserverError> {
            *sink.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
            Ok(())
        };
        (seen, observer)
    }

    #[test]
    fn each_distinct_key_is_evicted_at_most_once() {
        let cache = Arc::new(blocking_cache(16));
        let (seen, observer) = tally();
        cache.subscribe_fn(observer);
        let barrier = Arc::new(Barrier::new(THREADS));

        // Disjoint key ranges: each key is inserted exactly once.
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..500 {
                        cache.put(format!("t{t}-{i}").as_str(), i).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let live = cache.keys();
        let cache = Arc::try_unwrap(cache).unwrap();
        cache.dispose();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), THREADS * 500 - live.len());
        assert!(seen.values().all(|&count| count == 1));
        for key in &live {
            assert!(!seen.contains_key(key));
        }
    }

    #[test]
    fn sharded_notices_match_evictions() {
        let cache = blocking_sharded(24, 3);
        let evictions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evictions);
        cache.subscribe_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let cache = Arc::new(cache);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..300 {
                        cache.put(format!("w{t}:{i}").as_str(), i).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let live = cache.len();
        let cache = Arc::try_unwrap(cache).unwrap();
        let stats = cache.notifier_stats();
        assert_eq!(stats.dropped, 0);
        cache.dispose();

        assert_eq!(evictions.load(Ordering::SeqCst), 4 * 300 - live);
    }
}

// ==============================================
// Readers Alongside Writers
// ==============================================

mod mixed_traffic {
    use super::*;

    #[test]
    fn readers_only_see_written_values() {
        let cache: Arc<LruCache<usize>> = Arc::new(blocking_cache(64));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..OPS_PER_THREAD {
                        let n = (i * 31 + t) % 100;
                        let key = format!("n{n}");
                        if t % 2 == 0 {
                            cache.put(key.as_str(), n * 10).unwrap();
                        } else if let Some(value) = cache.get(key.as_str()) {
                            // Values are always derived from the key.
                            assert_eq!(*value, n * 10);
                        }
                        let _ = cache.peek(key.as_str());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        cache.check_invariants().unwrap();
    }

    #[test]
    fn observer_can_call_back_into_cache() {
        let cache = Arc::new(blocking_cache(4));
        let weak = Arc::downgrade(&cache);
        let lookups = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&lookups);
        cache.subscribe_fn(move |key| {
            if let Some(cache) = weak.upgrade() {
                let _ = cache.peek(key);
                let _ = cache.len();
            }
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.put(format!("{t}/{i}").as_str(), i).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let live = cache.len();
        // The observer may hold a temporary strong handle; retry until it is
        // released so dispose runs on this thread.
        let mut cache = cache;
        let cache = loop {
            match Arc::try_unwrap(cache) {
                Ok(cache) => break cache,
                Err(shared) => {
                    cache = shared;
                    thread::yield_now();
                },
            }
        };
        cache.dispose();
        assert_eq!(lookups.load(Ordering::SeqCst), 800 - live);
    }
}
