//! Counting semaphore.
//!
//! [`Semaphore`] counts events. An interrupt handler [`post`](Semaphore::post)s
//! once per event; a thread [`wait`](Semaphore::wait)s to consume one,
//! parking the hart until the next interrupt while the count is zero.

use super::loom_compat::{AtomicU32, Ordering};
use crate::irq;

/// A counting semaphore that may be posted from interrupt context.
///
/// # Example
///
/// ```ignore
/// let data_ready = Semaphore::new(0);
///
/// // Interrupt handler:
/// data_ready.post();
///
/// // Thread:
/// data_ready.wait();
/// ```
pub struct Semaphore {
    permits: AtomicU32,
}

impl Semaphore {
    /// Creates a new semaphore holding `permits` initial permits.
    pub fn new(permits: u32) -> Self {
        Self {
            permits: AtomicU32::new(permits),
        }
    }

    /// Consumes one permit, blocking until one is available.
    ///
    /// The availability check and the stall happen with interrupts masked,
    /// so a post from an interrupt that becomes pending in between still
    /// wakes the hart.
    pub fn wait(&self) {
        #[cfg(reconos_lock_debug)]
        assert!(
            super::irq_lock_depth() == 0,
            "Semaphore::wait() called while holding IrqSpinLock"
        );

        loop {
            let saved = irq::save_and_disable();
            if self.try_wait() {
                irq::restore(saved);
                return;
            }
            irq::wait_for_interrupt();
            irq::restore(saved);
        }
    }

    /// Consumes one permit if available. Returns `true` on success.
    pub fn try_wait(&self) -> bool {
        loop {
            let current = self.permits.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .permits
                .compare_exchange_weak(current, current - 1, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Adds one permit. Safe to call from interrupt context.
    pub fn post(&self) {
        self.permits.fetch_add(1, Ordering::Release);
    }

    /// Returns the number of currently available permits.
    pub fn available_permits(&self) -> u32 {
        self.permits.load(Ordering::Relaxed)
    }
}
