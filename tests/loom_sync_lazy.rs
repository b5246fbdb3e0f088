//! Model-checked exactly-once initialization.
//!
//! Run with `RUSTFLAGS="--cfg loom" cargo test --test loom_sync_lazy --release`.

#![cfg(loom)]

use deferred::SyncLazy;
use loom::sync::atomic::{AtomicUsize, Ordering};
use loom::sync::Arc;
use loom::thread;

#[test]
fn concurrent_get_runs_producer_once() {
    loom::model(|| {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = Arc::new(SyncLazy::new(move || counter.fetch_add(1, Ordering::SeqCst) + 1));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                thread::spawn(move || lazy.get())
            })
            .collect();

        let main_value = lazy.get();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), main_value);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn set_racing_first_get_keeps_written_value() {
    loom::model(|| {
        let lazy = Arc::new(SyncLazy::new(|| 0));

        let writer = {
            let lazy = Arc::clone(&lazy);
            thread::spawn(move || lazy.set(Some(1)))
        };
        let reader_saw = lazy.get();
        writer.join().unwrap();

        assert!(reader_saw == 0 || reader_saw == 1);
        assert_eq!(lazy.get(), 1);
    });
}
