//! Atomics and spin hint, routed through loom when built with `cfg(loom)`.
//!
//! Loom needs every spin iteration to be a scheduling point, otherwise a
//! waiter that never yields keeps the model from exploring the holder.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU32, Ordering};
#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// One iteration of a busy wait.
#[inline]
pub(crate) fn spin_hint() {
    #[cfg(loom)]
    loom::thread::yield_now();
    #[cfg(not(loom))]
    core::hint::spin_loop();
}
