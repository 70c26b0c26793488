//! Interrupt demultiplexer for the shared OSIF line.
//!
//! One physical line serves every channel. Each channel has a bit in the
//! controller's enable mask; a reader about to block sets its bit (arms),
//! and the handler clears it again once the channel fires, so each arm is
//! good for exactly one wakeup.
//!
//! # Locking
//!
//! The software mask mirror is written from thread context (arm/disarm)
//! and read-modify-written from the handler. It lives in an
//! [`IrqSpinLock`], which masks CPU interrupts for the whole critical
//! section. A thread holding the lock therefore cannot be interrupted by
//! the handler on the same hart, and the handler (which runs with
//! interrupts masked) always finds the lock free. The hardware enable
//! register is written as the last step inside the lock, so mirror and
//! register agree whenever the lock is released.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use reconos_core::sync::IrqSpinLock;

use crate::error::OsifError;
use crate::hal::{IntcPort, InterruptHandler, IrqLine};
use crate::{odebug, oerr, oinfo, otrace};

/// Width of the hardware enable mask.
pub const MAX_CHANNELS: usize = 32;

/// Software mirror of the enable register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MaskState {
    enable_mask: u32,
    /// Diagnostic; always `enable_mask.count_ones()`.
    enabled_count: u32,
}

/// Owner of the physical interrupt line and the channel enable mask.
pub struct InterruptDemux<I, L> {
    intc: I,
    line: L,
    channels: usize,
    state: IrqSpinLock<MaskState>,
    passes: AtomicU32,
    started: AtomicBool,
}

impl<I: IntcPort, L: IrqLine> InterruptDemux<I, L> {
    /// Takes ownership of the controller for `channels` channels and
    /// disarms all of them.
    ///
    /// Fails with [`OsifError::NotAvailable`] if the line's interrupt
    /// hardware is absent; the caller must then fall back to polling.
    pub fn new(intc: I, line: L, channels: usize) -> Result<Self, OsifError> {
        if !line.is_available() {
            oerr!("osif: interrupt controller not synthesized");
            return Err(OsifError::NotAvailable);
        }
        if channels > MAX_CHANNELS {
            oerr!("osif: {} HWTs exceed the {}-bit enable mask", channels, MAX_CHANNELS);
            return Err(OsifError::TooManyChannels);
        }

        intc.set_enable(0);

        Ok(Self {
            intc,
            line,
            channels,
            state: IrqSpinLock::new(MaskState::default()),
            passes: AtomicU32::new(0),
            started: AtomicBool::new(false),
        })
    }

    /// Connects `handler` to the line and lets the line interrupt the CPU.
    ///
    /// Stale state left on the line from before boot is acknowledged first.
    pub fn start(&self, handler: &'static dyn InterruptHandler) -> Result<(), OsifError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(OsifError::AlreadyStarted);
        }

        self.line.connect(handler);
        self.line.acknowledge();
        self.line.unmask();

        oinfo!("osif: interrupt line armed for {} channels", self.channels);
        Ok(())
    }

    /// Stops the line from interrupting the CPU. Channel bits are kept.
    pub fn stop(&self) {
        self.line.mask();
        self.started.store(false, Ordering::Release);
        odebug!("osif: interrupt line masked");
    }

    /// Returns the number of channels served.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Enables channel `id`'s interrupt; `id` comes from an open channel.
    ///
    /// Only a reader about to park on the channel may arm it. An arm from
    /// anywhere else lets the handler refresh the cached fill under a reader
    /// that is still consuming it.
    pub(crate) fn arm(&self, id: usize) {
        self.set_bit(id, true);
    }

    /// Disables channel `id`'s interrupt.
    pub fn disarm(&self, id: usize) -> Result<(), OsifError> {
        self.check(id)?;
        self.set_bit(id, false);
        Ok(())
    }

    /// Returns the software mirror of the enable mask.
    pub fn enable_mask(&self) -> u32 {
        self.state.lock().enable_mask
    }

    /// Returns how many channels are currently armed.
    pub fn enabled_count(&self) -> u32 {
        self.state.lock().enabled_count
    }

    /// Returns the channels raising an interrupt, armed or not.
    pub fn sources(&self) -> u32 {
        self.intc.pending()
    }

    /// Returns how many handler passes have run.
    pub fn interrupt_count(&self) -> u32 {
        self.passes.load(Ordering::Relaxed)
    }

    fn check(&self, id: usize) -> Result<(), OsifError> {
        if id < self.channels {
            Ok(())
        } else {
            Err(OsifError::InvalidChannel)
        }
    }

    /// Arms (`on`) or disarms channel `id`; `id` is already validated.
    fn set_bit(&self, id: usize, on: bool) {
        let bit = 1u32 << id;
        let mut state = self.state.lock();
        let was_on = state.enable_mask & bit != 0;
        if was_on != on {
            if on {
                state.enable_mask |= bit;
                state.enabled_count += 1;
            } else {
                state.enable_mask &= !bit;
                state.enabled_count -= 1;
            }
        }
        // Hardware write last, still under the lock.
        self.intc.set_enable(state.enable_mask);
        drop(state);

        otrace!("osif: channel {} {}", id, if on { "armed" } else { "disarmed" });
    }

    /// Handler pass: acknowledges the line, then disarms each channel that
    /// fired and passes its index to `fired`.
    ///
    /// Channels are visited in ascending index order. That order is an
    /// implementation detail, not a priority scheme. Pending channels that
    /// are not armed belong to a reader on the polling fast path and are
    /// left alone.
    pub fn dispatch(&self, mut fired: impl FnMut(usize)) {
        self.line.acknowledge();

        let armed = self.state.lock().enable_mask;
        let set = self.intc.pending() & armed;
        self.passes.fetch_add(1, Ordering::Relaxed);
        otrace!("osif: irq pass, fired {:#010x}", set);

        for id in Bits(set) {
            self.set_bit(id, false);
            fired(id);
        }
    }
}

/// Iterator over set bit positions, lowest first.
struct Bits(u32);

impl Iterator for Bits {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let idx = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(idx as usize)
    }
}
