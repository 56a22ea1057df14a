#![cfg(not(loom))]
//! Multi-threaded stress tests for `ConcurrentSortedCache`.
//!
//! These run real OS threads many times over to shake out races between
//! lookups and ownership transfers. `cargo xtask stress` repeats this suite
//! until it fails.
//!
//! Set `RUST_LOG=sortmru=debug` to see transfer events.

use rstest::rstest;
use sortmru::cache::ConcurrentSortedCache;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Concurrent Reads
// =============================================================================

#[rstest]
fn concurrent_reads_are_safe() {
    init_tracing();
    let shared = Arc::new(ConcurrentSortedCache::new(0..1000));

    let handles: Vec<_> = (0..10)
        .map(|thread_index| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let start = thread_index * 50;
                for offset in 0..100 {
                    let key = (start + offset) % 1000;
                    assert_eq!(shared.lookup(&key), Some(key));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(shared.size(), 1000);
    assert_eq!(shared.statistics().lookups(), 1000);
}

#[rstest]
fn concurrent_mixed_hits_and_misses() {
    let shared = Arc::new(ConcurrentSortedCache::new((0..500).map(|value| value * 2)));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for key in 0..1000 {
                    let expected = (key % 2 == 0).then_some(key);
                    assert_eq!(shared.lookup(&key), expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let statistics = shared.statistics();
    assert_eq!(statistics.not_found, 8 * 500);
    assert_eq!(statistics.hits + statistics.misses, 8 * 500);
}

// =============================================================================
// Transfer While Reading
// =============================================================================

#[rstest]
fn transfer_from_while_reading_is_safe() {
    init_tracing();
    for _ in 0..50 {
        let shared = Arc::new(ConcurrentSortedCache::new(0..1000));
        let keep_reading = Arc::new(AtomicBool::new(true));

        let reader = {
            let shared = Arc::clone(&shared);
            let keep_reading = Arc::clone(&keep_reading);
            thread::spawn(move || {
                let mut seen_empty = false;
                while keep_reading.load(Ordering::Acquire) {
                    match shared.lookup(&500) {
                        Some(value) => {
                            // Once the source has been emptied it stays empty.
                            assert!(!seen_empty, "value reappeared after transfer");
                            assert_eq!(value, 500);
                        }
                        None => seen_empty = true,
                    }
                }
            })
        };

        thread::sleep(Duration::from_micros(200));

        let destination: ConcurrentSortedCache = ConcurrentSortedCache::default();
        destination.transfer_from(&shared);

        keep_reading.store(false, Ordering::Release);
        reader.join().expect("Reader thread panicked");

        assert_eq!(destination.size(), 1000);
        assert_eq!(destination.lookup(&500), Some(500));
        assert_eq!(shared.size(), 0);
        assert_eq!(shared.lookup(&500), None);
    }
}

#[rstest]
fn take_from_while_reading_is_safe() {
    for _ in 0..50 {
        let shared = Arc::new(ConcurrentSortedCache::new(vec![1; 1000]));
        let keep_reading = Arc::new(AtomicBool::new(true));

        let reader = {
            let shared = Arc::clone(&shared);
            let keep_reading = Arc::clone(&keep_reading);
            thread::spawn(move || {
                while keep_reading.load(Ordering::Acquire) {
                    if let Some(value) = shared.lookup(&1) {
                        assert_eq!(value, 1);
                    }
                    let _ = shared.get_at(999);
                    let _ = shared.cached_value();
                }
            })
        };

        thread::sleep(Duration::from_micros(200));

        let destination = ConcurrentSortedCache::take_from(&shared);

        keep_reading.store(false, Ordering::Release);
        reader.join().expect("Reader thread panicked");

        assert_eq!(destination.size(), 1000);
        assert!(shared.is_empty());
    }
}

#[rstest]
fn each_side_is_whole_or_empty_while_shuttling() {
    let left = Arc::new(ConcurrentSortedCache::new(0..100));
    let right = Arc::new(ConcurrentSortedCache::<i32>::default());
    let done = Arc::new(AtomicBool::new(false));

    let mover = {
        let left = Arc::clone(&left);
        let right = Arc::clone(&right);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 0..500 {
                if round % 2 == 0 {
                    right.transfer_from(&left);
                } else {
                    left.transfer_from(&right);
                }
            }
            done.store(true, Ordering::Release);
        })
    };

    let observer = {
        let left = Arc::clone(&left);
        let right = Arc::clone(&right);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                for side in [&left, &right] {
                    let snapshot = side.snapshot();
                    assert!(snapshot.is_empty() || snapshot.len() == 100);
                    if let Some(found) = side.lookup(&42) {
                        assert_eq!(found, 42);
                    }
                }
            }
        })
    };

    mover.join().expect("Mover thread panicked");
    observer.join().expect("Observer thread panicked");

    // Round 499 moves right to left.
    assert_eq!(left.size(), 100);
    assert!(right.is_empty());
}

// =============================================================================
// Deadlock Freedom
// =============================================================================

#[rstest]
fn opposing_transfers_do_not_deadlock() {
    init_tracing();
    let first = Arc::new(ConcurrentSortedCache::new(0..10));
    let second = Arc::new(ConcurrentSortedCache::new(10..20));
    let barrier = Arc::new(Barrier::new(2));
    let completed = Arc::new(AtomicUsize::new(0));

    let spawn_mover = |destination: Arc<ConcurrentSortedCache>,
                       source: Arc<ConcurrentSortedCache>| {
        let barrier = Arc::clone(&barrier);
        let completed = Arc::clone(&completed);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..2_000 {
                destination.transfer_from(&source);
                completed.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let forward = spawn_mover(Arc::clone(&first), Arc::clone(&second));
    let backward = spawn_mover(Arc::clone(&second), Arc::clone(&first));

    forward.join().expect("Forward mover panicked");
    backward.join().expect("Backward mover panicked");

    assert_eq!(completed.load(Ordering::Relaxed), 4_000);
    // Transferring out of an empty side drops the other side's buffer, so the
    // survivors may be gone, but they never end up split across both.
    assert!(first.is_empty() || second.is_empty());
    for side in [&first, &second] {
        assert!(side.size() == 0 || side.size() == 10);
        assert_eq!(side.size(), side.synchronized_size());
    }
}

#[rstest]
fn opposing_swaps_do_not_deadlock() {
    let first = Arc::new(ConcurrentSortedCache::new([1, 2, 3]));
    let second = Arc::new(ConcurrentSortedCache::new([4, 5]));

    let handles: Vec<_> = (0..4)
        .map(|index| {
            let first = Arc::clone(&first);
            let second = Arc::clone(&second);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    if index % 2 == 0 {
                        first.swap_with(&second);
                    } else {
                        second.swap_with(&first);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // 4_000 swaps in total: an even number, so the contents are back home.
    assert_eq!(first.snapshot(), vec![1, 2, 3]);
    assert_eq!(second.snapshot(), vec![4, 5]);
}

#[rstest]
fn self_transfer_under_contention_does_not_deadlock() {
    let shared = Arc::new(ConcurrentSortedCache::new(0..64));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for key in 0..500 {
                    shared.transfer_from(&shared);
                    assert_eq!(shared.lookup(&(key % 64)), Some(key % 64));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(shared.size(), 64);
}

#[rstest]
fn size_is_never_torn_during_transfers() {
    let source = Arc::new(ConcurrentSortedCache::new(0..256));
    let destination = Arc::new(ConcurrentSortedCache::<i32>::default());
    let done = Arc::new(AtomicBool::new(false));

    let sampler = {
        let source = Arc::clone(&source);
        let destination = Arc::clone(&destination);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                for size in [source.size(), destination.size()] {
                    assert!(size == 0 || size == 256, "torn size {size}");
                }
            }
        })
    };

    for _ in 0..200 {
        destination.transfer_from(&source);
        source.transfer_from(&destination);
    }
    done.store(true, Ordering::Release);
    sampler.join().expect("Sampler thread panicked");

    assert_eq!(source.size(), 256);
    assert_eq!(destination.size(), 0);
}
