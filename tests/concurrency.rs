#![cfg(not(loom))]

use deferred::{Lazy, SyncLazy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn assert_send<T: Send>() {}
fn assert_sync<T: Sync>() {}

#[test]
fn sync_lazy_is_send_and_sync() {
    assert_send::<SyncLazy<String>>();
    assert_sync::<SyncLazy<String>>();
    // `Mutex<T>` only needs `T: Send` to be shared.
    assert_sync::<SyncLazy<std::cell::Cell<u8>>>();
}

#[test]
fn lazy_is_send_when_contents_are() {
    assert_send::<Lazy<String>>();
}

#[test]
fn test_arc_shared_first_access_runs_producer_once() {
    const THREADS: usize = 8;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let lazy = Arc::new(SyncLazy::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        Arc::new(String::from("built once"))
    }));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let lazy = Arc::clone(&lazy);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                lazy.get()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert_eq!(*results[0], "built once");
}

#[test]
fn test_static_container_is_initialized_once() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    static TABLE: SyncLazy<Vec<u32>> = SyncLazy::new(|| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        (0..32).collect()
    });

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| assert_eq!(TABLE.with(Vec::len), 32));
        }
    });
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_producer_is_retried_by_next_caller() {
    const THREADS: usize = 12;

    let attempts = AtomicUsize::new(0);
    let successes = AtomicUsize::new(0);
    let lazy: SyncLazy<usize, _> = SyncLazy::new(|| {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        if attempt < 3 {
            Err(attempt)
        } else {
            successes.fetch_add(1, Ordering::SeqCst);
            Ok(attempt)
        }
    });
    let barrier = Barrier::new(THREADS);

    let results: Vec<Result<usize, usize>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    lazy.try_get()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 3);
    assert!(results.iter().filter_map(|r| r.as_ref().ok()).all(|v| *v == 3));
}

#[test]
fn test_concurrent_panic_does_not_wedge_readers() {
    let attempts = AtomicUsize::new(0);
    let lazy = SyncLazy::new(|| {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first producer call fails");
        }
        5u8
    });

    thread::scope(|s| {
        let failing = s.spawn(|| lazy.get());
        assert!(failing.join().is_err());
    });

    thread::scope(|s| {
        let readers: Vec<_> = (0..4).map(|_| s.spawn(|| lazy.get())).collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), 5);
        }
    });
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_set_is_not_lost_against_first_get() {
    for _ in 0..50 {
        let lazy = SyncLazy::new(|| {
            thread::sleep(Duration::from_micros(50));
            0
        });
        let barrier = Barrier::new(2);

        thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                lazy.get();
            });
            s.spawn(|| {
                barrier.wait();
                lazy.set(Some(1));
            });
        });

        // Either the set landed after the producer, or the reader saw the set
        // value; both orders end with the written value cached.
        assert_eq!(lazy.get(), 1);
    }
}
