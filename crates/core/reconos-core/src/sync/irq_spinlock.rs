//! Spin lock for data shared between thread context and the interrupt
//! handler.
//!
//! Acquiring it masks interrupts on the hart first, and releasing it puts
//! the previous state back. While a thread holds the lock the handler
//! cannot run on the same hart, so the handler never spins on a lock its
//! own hart holds.

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

use super::loom_compat::{AtomicBool, Ordering, spin_hint};
use crate::irq::{self, IrqState};

#[cfg(reconos_lock_debug)]
mod depth {
    use core::sync::atomic::{AtomicU32, Ordering};

    /// Guards alive right now. There is one hart, so one counter.
    static HELD: AtomicU32 = AtomicU32::new(0);

    pub(super) fn enter() {
        HELD.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn leave() {
        HELD.fetch_sub(1, Ordering::Relaxed);
    }

    pub(super) fn get() -> u32 {
        HELD.load(Ordering::Relaxed)
    }
}

#[cfg(not(reconos_lock_debug))]
mod depth {
    pub(super) fn enter() {}
    pub(super) fn leave() {}
    pub(super) fn get() -> u32 {
        0
    }
}

/// How many [`IrqSpinLock`] guards are alive.
///
/// Only tracked with `cfg(reconos_lock_debug)`; reads 0 otherwise.
#[must_use]
pub fn irq_lock_depth() -> u32 {
    depth::get()
}

/// Spin lock that keeps interrupts masked for as long as it is held.
pub struct IrqSpinLock<T> {
    held: AtomicBool,
    value: UnsafeCell<T>,
}

// SAFETY: `held` serialises every access to `value`. The value may be
// touched from the handler and from any thread, hence `T: Send`.
unsafe impl<T: Send> Send for IrqSpinLock<T> {}
// SAFETY: as above.
unsafe impl<T: Send> Sync for IrqSpinLock<T> {}

impl<T> IrqSpinLock<T> {
    /// An unlocked lock around `value`. Usable in `static` initialisers.
    #[cfg(not(loom))]
    pub const fn new(value: T) -> Self {
        Self {
            held: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// An unlocked lock around `value`.
    #[cfg(loom)]
    pub fn new(value: T) -> Self {
        Self {
            held: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    fn claim(&self) -> bool {
        self.held
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Masks interrupts, then spins until the lock is free.
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T> {
        let saved = irq::save_and_disable();
        while !self.claim() {
            // Wait on a plain load so the line is not bounced by failed CAS.
            while self.held.load(Ordering::Relaxed) {
                spin_hint();
            }
        }
        IrqSpinLockGuard::new(self, saved)
    }

    /// Takes the lock only if it is free right now.
    ///
    /// The interrupt state is left as it was when this returns `None`.
    pub fn try_lock(&self) -> Option<IrqSpinLockGuard<'_, T>> {
        let saved = irq::save_and_disable();
        let taken = self
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok();
        if taken {
            return Some(IrqSpinLockGuard::new(self, saved));
        }
        irq::restore(saved);
        None
    }

    /// Direct access without locking.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Unwraps the protected value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

/// Proof of holding an [`IrqSpinLock`]. Dropping it unlocks, then restores
/// the interrupt state saved by `lock`.
pub struct IrqSpinLockGuard<'a, T> {
    lock: &'a IrqSpinLock<T>,
    saved: IrqState,
    /// The saved state belongs to this hart.
    _pinned: PhantomData<*const ()>,
}

impl<'a, T> IrqSpinLockGuard<'a, T> {
    fn new(lock: &'a IrqSpinLock<T>, saved: IrqState) -> Self {
        depth::enter();
        Self {
            lock,
            saved,
            _pinned: PhantomData,
        }
    }
}

impl<T> Deref for IrqSpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard owns `held`.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for IrqSpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: this guard owns `held`.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for IrqSpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
        depth::leave();
        irq::restore(self.saved);
    }
}
