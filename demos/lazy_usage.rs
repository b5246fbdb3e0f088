//! Deferred value usage examples.
//!
//! Run with `cargo run --example lazy_usage` (add `--features tracing` to
//! compile in the trace events).

use anyhow::{ensure, Context, Result};
use deferred::{make_lazy, make_sync_lazy, Lazy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("Deferred Value Examples");
    println!("=======================");

    single_threaded()?;
    fallible()?;
    synchronized()?;

    Ok(())
}

fn single_threaded() -> Result<()> {
    println!("\n1. Single-threaded Lazy:");

    let text = make_lazy(|| {
        println!("  Producing string...");
        "testString"
    });
    let mut ratio = make_lazy(|| 0.0_f64);
    let words = make_lazy(|| vec!["one", "two", "three"]);

    println!("  text  = {}", text.get());
    println!("  text  = {} (cached)", text.get());
    println!("  ratio = {}", ratio.get());
    ratio.set(Some(1.0));
    println!("  ratio = {} (after overwrite)", ratio.get());
    println!("  words = {:?}", words.get());

    ensure!(*ratio.get() == 1.0, "overwrite was lost");
    Ok(())
}

fn fallible() -> Result<()> {
    println!("\n2. Fallible producer:");

    let attempts = AtomicUsize::new(0);
    let port: Lazy<u16, _> = Lazy::new(|| {
        let input = if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            "not-a-port"
        } else {
            "8080"
        };
        input.parse::<u16>()
    });

    match port.try_get() {
        Ok(value) => println!("  unexpected success: {value}"),
        Err(err) => println!("  first attempt failed: {err}"),
    }
    let value = port.try_get().context("second attempt should succeed")?;
    println!("  second attempt: {value} (attempts: {})", attempts.load(Ordering::SeqCst));
    Ok(())
}

fn synchronized() -> Result<()> {
    println!("\n3. SyncLazy across threads:");
    const THREADS: usize = 8;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let shared = Arc::new(make_sync_lazy(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        Arc::new(String::from("built once"))
    }));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                shared.get()
            })
        })
        .collect();

    let mut values = Vec::with_capacity(THREADS);
    for handle in handles {
        let value = handle
            .join()
            .map_err(|_| anyhow::anyhow!("reader thread panicked"))?;
        values.push(value);
    }

    let producer_calls = calls.load(Ordering::SeqCst);
    println!("  {THREADS} readers, producer calls: {producer_calls}");
    ensure!(producer_calls == 1, "producer ran {producer_calls} times");
    ensure!(
        values.iter().all(|v| Arc::ptr_eq(v, &values[0])),
        "readers observed different values"
    );
    Ok(())
}
