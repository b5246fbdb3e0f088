//! Single-threaded deferred values.

pub mod lazy;

pub use lazy::{make_lazy, Lazy};
