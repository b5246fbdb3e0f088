//! `Lazy` — single-threaded deferred value with overwrite support.
//!
//! Unlike `std::cell::LazyCell`, the producer is retained for the life of the
//! cell, so the cached value can be overwritten or cleared and rebuilt later.
//! `Lazy` is `!Sync`; share across threads with [`SyncLazy`](crate::SyncLazy).

use core::any::type_name;
use core::cell::{Cell, OnceCell};
use core::fmt;
use core::ops::Deref;

use crate::trace::trace_event;

/// A single-threaded deferred value.
///
/// The producer runs on the first [`get`](Lazy::get) and its result is cached
/// until it is overwritten with [`set`](Lazy::set) or cleared with
/// [`reset`](Lazy::reset).
///
/// ```
/// use deferred::Lazy;
///
/// let mut greeting = Lazy::new(|| String::from("hello"));
/// assert_eq!(greeting.get(), "hello");
///
/// greeting.set(Some(String::from("bye")));
/// assert_eq!(*greeting, "bye");
/// ```
pub struct Lazy<T, F = fn() -> T> {
    cell: OnceCell<T>,
    initializing: Cell<bool>,
    producer: F,
}

/// Clears the initializing flag when the producer returns or unwinds.
struct InitGuard<'a>(&'a Cell<bool>);

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Builds an unset [`Lazy`] around `producer`.
#[inline]
pub const fn make_lazy<T, F>(producer: F) -> Lazy<T, F>
where
    F: Fn() -> T,
{
    Lazy::new(producer)
}

impl<T, F> Lazy<T, F> {
    /// Creates an unset `Lazy` that calls `producer` on first access.
    ///
    /// `new` places no bound on `producer`, so `T` is inferred from a later
    /// `get`/`try_get` (or a type annotation). Use [`make_lazy`] to tie `T` to
    /// the producer's return type at construction.
    #[inline]
    pub const fn new(producer: F) -> Self {
        Self {
            cell: OnceCell::new(),
            initializing: Cell::new(false),
            producer,
        }
    }

    /// Returns `true` if a value is currently cached.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the cached value without running the producer.
    #[inline]
    pub fn get_cached(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Overwrites the cache.
    ///
    /// `Some(value)` caches `value` without calling the producer. `None` clears
    /// the cache, so the next [`get`](Lazy::get) runs the producer again.
    pub fn set(&mut self, value: Option<T>) {
        match value {
            Some(value) => {
                self.replace(value);
            }
            None => self.reset(),
        }
    }

    /// Caches `value`, returning the previously cached value.
    pub fn replace(&mut self, value: T) -> Option<T> {
        trace_event!(ty = type_name::<T>(), "cached value overwritten");
        let previous = self.cell.take();
        self.cell = OnceCell::from(value);
        previous
    }

    /// Removes the cached value, leaving the cell unset.
    #[inline]
    pub fn take(&mut self) -> Option<T> {
        self.cell.take()
    }

    /// Drops the cached value, if any.
    pub fn reset(&mut self) {
        if self.cell.take().is_some() {
            trace_event!(ty = type_name::<T>(), "cached value cleared");
        }
    }

    /// Consumes the cell, returning the cached value if one was produced.
    #[inline]
    pub fn into_inner(self) -> Option<T> {
        self.cell.into_inner()
    }

    /// Marks the producer as running until the returned guard drops.
    fn begin_init(&self) -> InitGuard<'_> {
        assert!(
            !self.initializing.replace(true),
            "reentrant initialization of Lazy<{}>",
            type_name::<T>()
        );
        InitGuard(&self.initializing)
    }
}

impl<T, F> Lazy<T, F>
where
    F: Fn() -> T,
{
    /// Returns the cached value, running the producer first if the cell is unset.
    ///
    /// A panicking producer leaves the cell unset; the next call runs it again.
    ///
    /// # Panics
    ///
    /// Panics if the producer reads this same cell while it is running. The
    /// nested read panics before recursing, and the cell stays unset.
    pub fn get(&self) -> &T {
        if let Some(value) = self.cell.get() {
            return value;
        }
        let guard = self.begin_init();
        trace_event!(ty = type_name::<T>(), "running producer");
        let value = (self.producer)();
        drop(guard);
        self.cell.get_or_init(|| value)
    }

    /// Returns a mutable reference to the value, running the producer if needed.
    pub fn get_mut(&mut self) -> &mut T {
        if self.cell.get().is_none() {
            trace_event!(ty = type_name::<T>(), "running producer");
            self.cell = OnceCell::from((self.producer)());
        }
        match self.cell.get_mut() {
            Some(value) => value,
            None => unreachable!("Lazy was populated above"),
        }
    }

    /// Consumes the cell, returning its value and running the producer if needed.
    pub fn into_value(self) -> T {
        match self.cell.into_inner() {
            Some(value) => value,
            None => (self.producer)(),
        }
    }
}

impl<T, E, F> Lazy<T, F>
where
    F: Fn() -> Result<T, E>,
{
    /// Returns the cached value, running a fallible producer if the cell is unset.
    ///
    /// On `Err` the cell stays unset and the error is returned unchanged; the
    /// next call runs the producer again.
    ///
    /// ```
    /// use deferred::Lazy;
    ///
    /// let port: Lazy<u16, _> = Lazy::new(|| "8080".parse::<u16>());
    /// assert_eq!(port.try_get(), Ok(&8080));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the producer reads this same cell while it is running.
    pub fn try_get(&self) -> Result<&T, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        let guard = self.begin_init();
        trace_event!(ty = type_name::<T>(), "running fallible producer");
        let produced = (self.producer)();
        drop(guard);
        match produced {
            Ok(value) => Ok(self.cell.get_or_init(|| value)),
            Err(err) => {
                trace_event!(ty = type_name::<T>(), "producer failed; cell left unset");
                Err(err)
            }
        }
    }
}

impl<T, F> Deref for Lazy<T, F>
where
    F: Fn() -> T,
{
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: Clone, F: Clone> Clone for Lazy<T, F> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            initializing: Cell::new(false),
            producer: self.producer.clone(),
        }
    }
}

impl<T: Default> Default for Lazy<T> {
    fn default() -> Self {
        Self::new(T::default)
    }
}

impl<T: fmt::Debug, F> fmt::Debug for Lazy<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Lazy");
        match self.cell.get() {
            Some(value) => d.field("value", value),
            None => d.field("value", &format_args!("<uninit>")),
        };
        d.finish()
    }
}
