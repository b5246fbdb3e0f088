//! # `deferred` - Deferred-initialization containers
//!
//! A deferred value holds a producer closure and an optional cached result.
//! The producer runs on first access; later accesses return the cached result
//! until the cache is overwritten or cleared.
//!
//! ## Variants
//!
//! - [`Lazy`]: single-threaded, no locking. `get` hands out `&T`. The type is
//!   `!Sync`, so the compiler rejects sharing it between threads.
//! - [`SyncLazy`]: owns one mutex for its lifetime. The check, the producer
//!   call and the store run under that lock, so `N` concurrent first readers
//!   run the producer exactly once and all observe the same value.
//!
//! ## Guarantees
//!
//! - **Memoization**: once a value is cached, the producer does not run again
//!   until the cache is cleared with `set(None)`/`reset`.
//! - **Overwrite bypass**: `set(Some(v))` caches `v` without calling the
//!   producer, whether or not the producer has run.
//! - **Failure retry**: a panicking producer, or a fallible producer returning
//!   `Err` through `try_get`, leaves the container unset. The failure reaches
//!   the caller unchanged and the next access runs the producer again.
//! - **Cheap copies**: cloning a container copies the cached value (if any)
//!   and the producer. It never runs the producer.
//!
//! ## Example
//!
//! ```rust
//! use deferred::{make_lazy, make_sync_lazy};
//!
//! let mut ratio = make_lazy(|| 0.0);
//! assert_eq!(*ratio.get(), 0.0);
//! ratio.set(Some(1.0));
//! assert_eq!(*ratio.get(), 1.0);
//!
//! let words = make_sync_lazy(|| vec!["one", "two", "three"]);
//! std::thread::scope(|s| {
//!     s.spawn(|| assert_eq!(words.get(), ["one", "two", "three"]));
//!     s.spawn(|| assert_eq!(words.get().len(), 3));
//! });
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod trace;

pub mod cell;
pub mod sync;

mod serde_impls;

pub use cell::{make_lazy, Lazy};
pub use sync::{make_sync_lazy, SyncLazy};

// Compile-time layout checks. Loose upper bounds: the containers should stay
// a producer plus an optional value (plus the lock word for `SyncLazy`).
#[cfg(not(loom))]
const _: () = {
    use core::mem;

    assert!(
        mem::size_of::<Lazy<u64>>() <= mem::size_of::<Option<u64>>() + mem::size_of::<usize>() * 2
    );
    assert!(
        mem::size_of::<SyncLazy<u64>>() <= mem::size_of::<Option<u64>>() + mem::size_of::<usize>() * 4
    );
};
