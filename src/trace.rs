//! Trace events for the containers.
//!
//! Compiled out unless the `tracing` feature is enabled.

macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            ::tracing::trace!(target: "deferred", $($arg)*);
        }
    };
}

pub(crate) use trace_event;
