//! Lock backend for [`SyncLazy`](super::SyncLazy).
//!
//! Builds with `--cfg loom` swap in loom's model-checked mutex.

#[cfg(loom)]
pub(crate) use loom::sync::{Mutex, MutexGuard};

#[cfg(not(loom))]
pub(crate) use std::sync::{Mutex, MutexGuard};
