//! Synchronization primitives shared between thread and interrupt context.
//!
//! Provides [`IrqSpinLock`] for state that an interrupt handler also
//! mutates, and [`Semaphore`] for interrupt-to-thread wakeups.

mod irq_spinlock;
mod semaphore;

pub(crate) mod loom_compat;

pub use irq_spinlock::{IrqSpinLock, IrqSpinLockGuard, irq_lock_depth};
pub use semaphore::Semaphore;
