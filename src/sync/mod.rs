//! Thread-safe deferred values.
//!
//! [`SyncLazy`] owns one mutex for its whole lifetime; every read and write of
//! the cached value goes through it.

mod primitives;
pub mod sync_lazy;

pub use sync_lazy::{make_sync_lazy, SyncLazy};
