//! `SyncLazy` — mutex-guarded deferred value with overwrite support.
//!
//! The check, the producer call and the store all happen while holding the
//! container's own lock, so concurrent first readers run the producer once.
//! The cache can be overwritten or cleared from any thread through the same
//! lock.

#[cfg(feature = "tracing")]
use core::any::type_name;
use core::fmt;
use std::sync::{PoisonError, TryLockError};

use super::primitives::{Mutex, MutexGuard};
use crate::trace::trace_event;

/// A thread-safe deferred value.
///
/// Readers receive clones of the cached value ([`get`](SyncLazy::get)) or
/// borrow it inside a closure ([`with`](SyncLazy::with)). Wrap `T` in an
/// `Arc` to hand out shared handles to one allocation.
///
/// ```
/// use deferred::SyncLazy;
/// use std::sync::Arc;
///
/// static TABLE: SyncLazy<Arc<Vec<u32>>> = SyncLazy::new(|| Arc::new((0..4).collect()));
///
/// let a = TABLE.get();
/// let b = TABLE.get();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
///
/// # Re-entrancy
///
/// The lock is not re-entrant. A producer that reads its own container
/// deadlocks or panics.
pub struct SyncLazy<T, F = fn() -> T> {
    cached: Mutex<Option<T>>,
    producer: F,
}

/// Builds an unset [`SyncLazy`] around `producer`.
#[inline]
pub fn make_sync_lazy<T, F>(producer: F) -> SyncLazy<T, F>
where
    F: Fn() -> T,
{
    SyncLazy::new(producer)
}

impl<T, F> SyncLazy<T, F> {
    /// Creates an unset `SyncLazy` that calls `producer` on first access.
    ///
    /// `new` places no bound on `producer`, so `T` is inferred from a later
    /// `get`/`try_get` (or a type annotation). Use [`make_sync_lazy`] to tie
    /// `T` to the producer's return type at construction.
    #[cfg(not(loom))]
    #[inline]
    pub const fn new(producer: F) -> Self {
        Self {
            cached: Mutex::new(None),
            producer,
        }
    }

    /// Creates an unset `SyncLazy` that calls `producer` on first access.
    #[cfg(loom)]
    pub fn new(producer: F) -> Self {
        Self {
            cached: Mutex::new(None),
            producer,
        }
    }

    /// Locks the slot.
    ///
    /// A poisoned lock only means a producer or a `with` closure panicked.
    /// The slot is written after the producer returns, so it is never left
    /// half-initialized and poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if a value is currently cached.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Returns a clone of the cached value without running the producer.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().clone()
    }

    /// Overwrites the cache under the lock.
    ///
    /// `Some(value)` caches `value` without calling the producer; `None` clears
    /// the cache so the next reader runs the producer again.
    pub fn set(&self, value: Option<T>) {
        let previous = match value {
            Some(value) => self.replace(value),
            None => self.take(),
        };
        drop(previous);
    }

    /// Caches `value`, returning the previously cached value.
    pub fn replace(&self, value: T) -> Option<T> {
        let previous = self.lock().replace(value);
        trace_event!(ty = type_name::<T>(), "cached value overwritten");
        previous
    }

    /// Removes the cached value, leaving the container unset.
    pub fn take(&self) -> Option<T> {
        let previous = self.lock().take();
        if previous.is_some() {
            trace_event!(ty = type_name::<T>(), "cached value cleared");
        }
        previous
    }

    /// Drops the cached value, if any.
    #[inline]
    pub fn reset(&self) {
        self.set(None);
    }

    /// Consumes the container, returning the cached value if one was produced.
    pub fn into_inner(self) -> Option<T> {
        self.cached
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, F> SyncLazy<T, F>
where
    F: Fn() -> T,
{
    /// Runs `f` on the value under the lock, producing it first if needed.
    ///
    /// Other readers block until `f` returns.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let mut slot = self.lock();
        let value = slot.get_or_insert_with(|| {
            trace_event!(ty = type_name::<T>(), "running producer under lock");
            (self.producer)()
        });
        f(value)
    }

    /// Returns a clone of the value, running the producer if the container is
    /// unset.
    ///
    /// Concurrent first callers block on the lock; exactly one of them runs the
    /// producer and all of them observe its result. A panicking producer
    /// releases the lock and leaves the container unset.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Returns a mutable reference to the value, running the producer if needed.
    ///
    /// Exclusive access makes locking unnecessary.
    #[cfg(not(loom))]
    pub fn get_mut(&mut self) -> &mut T {
        let producer = &self.producer;
        self.cached
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(producer)
    }

    /// Consumes the container, returning its value and running the producer if
    /// needed.
    pub fn into_value(self) -> T {
        let Self { cached, producer } = self;
        cached
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or_else(producer)
    }
}

impl<T, E, F> SyncLazy<T, F>
where
    T: Clone,
    F: Fn() -> Result<T, E>,
{
    /// Returns a clone of the value, running a fallible producer under the lock
    /// if the container is unset.
    ///
    /// On `Err` the container stays unset, the lock is released and the error
    /// is returned unchanged. The next caller runs the producer again.
    pub fn try_get(&self) -> Result<T, E> {
        let mut slot = self.lock();
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }
        trace_event!(ty = type_name::<T>(), "running fallible producer under lock");
        match (self.producer)() {
            Ok(value) => Ok(slot.insert(value).clone()),
            Err(err) => {
                trace_event!(ty = type_name::<T>(), "producer failed; container left unset");
                Err(err)
            }
        }
    }
}

impl<T: Clone, F: Clone> Clone for SyncLazy<T, F> {
    fn clone(&self) -> Self {
        Self {
            cached: Mutex::new(self.lock().clone()),
            producer: self.producer.clone(),
        }
    }
}

impl<T: Default> Default for SyncLazy<T> {
    fn default() -> Self {
        Self::new(T::default)
    }
}

impl<T: fmt::Debug, F> fmt::Debug for SyncLazy<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("SyncLazy");
        match self.cached.try_lock() {
            Ok(slot) => debug_slot(&mut d, &slot),
            Err(TryLockError::Poisoned(err)) => debug_slot(&mut d, &err.into_inner()),
            Err(TryLockError::WouldBlock) => {
                d.field("value", &format_args!("<locked>"));
            }
        }
        d.finish()
    }
}

fn debug_slot<T: fmt::Debug>(d: &mut fmt::DebugStruct<'_, '_>, slot: &Option<T>) {
    match slot {
        Some(value) => d.field("value", value),
        None => d.field("value", &format_args!("<uninit>")),
    };
}
