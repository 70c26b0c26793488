//! Local interrupt masking for the current hart.
//!
//! On bare-metal RISC-V the global machine interrupt enable (`mstatus.MIE`)
//! is cleared and restored with CSR instructions. On every other target
//! (host tests, loom) masking is a no-op and waiting for an interrupt
//! degrades to a scheduler hint.

/// Saved interrupt-enable state returned by [`save_and_disable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "dropping the saved state leaves interrupts masked"]
pub struct IrqState(usize);

impl IrqState {
    /// Returns `true` if interrupts were enabled when the state was saved.
    pub fn was_enabled(self) -> bool {
        self.0 & MSTATUS_MIE != 0
    }
}

/// `mstatus.MIE`: machine-mode global interrupt enable.
const MSTATUS_MIE: usize = 1 << 3;

/// Masks interrupts on the current hart and returns the previous state.
#[inline]
pub fn save_and_disable() -> IrqState {
    IrqState(arch::save_and_disable())
}

/// Restores the interrupt state saved by [`save_and_disable`].
///
/// Interrupts are re-enabled only if they were enabled at save time, so
/// nested critical sections unwind correctly.
#[inline]
pub fn restore(state: IrqState) {
    if state.was_enabled() {
        arch::enable();
    }
}

/// Runs `f` with interrupts masked on the current hart.
#[inline]
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    let state = save_and_disable();
    let result = f();
    restore(state);
    result
}

/// Stalls the hart until an interrupt becomes pending.
///
/// Must be called with interrupts masked. A pending enabled interrupt
/// still wakes the hart, and the trap is taken once the caller restores
/// the interrupt state, so no wakeup is lost between the caller's last
/// check and the stall.
#[inline]
pub fn wait_for_interrupt() {
    arch::wait_for_interrupt();
}

/// Lets CPU interrupt source `bit` (an `mie` bit) reach the hart.
#[inline]
pub fn enable_source(bit: u8) {
    arch::set_mie(1 << bit);
}

/// Stops CPU interrupt source `bit` from reaching the hart.
#[inline]
pub fn disable_source(bit: u8) {
    arch::clear_mie(1 << bit);
}

/// Clears a latched pending flag of CPU interrupt source `bit`.
///
/// Only meaningful for sources whose `mip` bit is software-writable, such
/// as the NEORV32 fast interrupts.
#[inline]
pub fn clear_pending_source(bit: u8) {
    arch::clear_mip(1 << bit);
}

#[cfg(all(target_os = "none", any(target_arch = "riscv32", target_arch = "riscv64")))]
mod arch {
    use riscv::register::mstatus;

    use super::MSTATUS_MIE;

    #[inline]
    pub fn save_and_disable() -> usize {
        let was_enabled = mstatus::read().mie();
        // SAFETY: Clearing mstatus.MIE is always sound in machine mode.
        unsafe { mstatus::clear_mie() };
        if was_enabled { MSTATUS_MIE } else { 0 }
    }

    #[inline]
    pub fn enable() {
        // SAFETY: Re-enabling interrupts restores a previously saved state.
        unsafe { mstatus::set_mie() };
    }

    #[inline]
    pub fn wait_for_interrupt() {
        // SAFETY: `wfi` has no side effects beyond stalling the hart.
        unsafe { riscv::asm::wfi() };
    }

    // Platform fast interrupts (NEORV32 FIRQs) sit above the standard `mie`
    // fields, so they are set by raw mask.

    #[inline]
    pub fn set_mie(bits: usize) {
        // SAFETY: Enabling a local interrupt source only affects trap delivery.
        unsafe {
            core::arch::asm!("csrs mie, {}", in(reg) bits, options(nostack));
        }
    }

    #[inline]
    pub fn clear_mie(bits: usize) {
        // SAFETY: Disabling a local interrupt source only affects trap delivery.
        unsafe {
            core::arch::asm!("csrc mie, {}", in(reg) bits, options(nostack));
        }
    }

    #[inline]
    pub fn clear_mip(bits: usize) {
        // SAFETY: Clearing a latched pending bit drops at most one stale trap.
        unsafe {
            core::arch::asm!("csrc mip, {}", in(reg) bits, options(nostack));
        }
    }
}

#[cfg(not(all(target_os = "none", any(target_arch = "riscv32", target_arch = "riscv64"))))]
mod arch {
    use super::MSTATUS_MIE;

    #[inline]
    pub fn save_and_disable() -> usize {
        MSTATUS_MIE
    }

    #[inline]
    pub fn enable() {}

    #[inline]
    pub fn wait_for_interrupt() {
        crate::sync::loom_compat::spin_hint();
    }

    #[inline]
    pub fn set_mie(_bits: usize) {}

    #[inline]
    pub fn clear_mie(_bits: usize) {}

    #[inline]
    pub fn clear_mip(_bits: usize) {}
}
