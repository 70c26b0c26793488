//! Hardware and RTOS seams.
//!
//! The driver reaches registers and the RTOS only through these traits.
//! [`board`](crate::board) implements them over MMIO for the NEORV32
//! reference design; tests implement them over a simulated register file.

use bitflags::bitflags;
use reconos_core::sync::Semaphore;

bitflags! {
    /// OSIF receive status word (hardware to software direction).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecvStatus: u32 {
        /// No word is waiting in the receive FIFO.
        const EMPTY = 1 << 31;
    }

    /// OSIF send status word (software to hardware direction).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SendStatus: u32 {
        /// The send FIFO cannot accept another word.
        const FULL = 1 << 31;
    }

    /// Optional process control features of a bitstream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcFeatures: u32 {
        /// Hardware MMU: page directory and page fault registers.
        const MMU = 1 << 0;
        /// TLB hit/miss counters.
        const TLB_COUNTERS = 1 << 1;
    }
}

/// Mask of the fill count in the receive status word.
const COUNT_MASK: u32 = 0xFFFF;

impl RecvStatus {
    /// Returns the number of words the receive FIFO reports.
    #[must_use]
    pub fn fill(self) -> u32 {
        self.bits() & COUNT_MASK
    }

    /// Returns the number of words a reader may consume without another
    /// hardware access.
    ///
    /// An empty FIFO yields 0. A non-empty FIFO yields its fill count, or 1
    /// if the count field reads 0, since a clear `EMPTY` flag still
    /// guarantees one word.
    #[must_use]
    pub fn available(self) -> u32 {
        if self.contains(Self::EMPTY) {
            0
        } else {
            self.fill().max(1)
        }
    }
}

impl SendStatus {
    /// Returns `true` if the send FIFO cannot accept a word.
    #[must_use]
    pub fn is_full(self) -> bool {
        self.contains(Self::FULL)
    }
}

/// One channel's FIFO registers.
///
/// Exclusively addressed by its channel; no other entity touches them.
pub trait FifoPort: Send + Sync {
    /// Pops one word from the receive FIFO.
    fn recv_data(&self) -> u32;
    /// Pushes one word into the send FIFO.
    fn set_send_data(&self, word: u32);
    /// Reads the receive status word.
    fn recv_status(&self) -> RecvStatus;
    /// Reads the send status word.
    fn send_status(&self) -> SendStatus;
}

/// The OSIF interrupt controller shared by all channels.
///
/// The enable mask is write-only from the driver's point of view; the
/// driver keeps its own mirror and never reads it back.
pub trait IntcPort: Send + Sync {
    /// Writes the channel enable mask.
    fn set_enable(&self, mask: u32);
    /// Reads the channels raising an interrupt. Bits of disarmed channels
    /// may be set; the driver masks them out.
    fn pending(&self) -> u32;
}

/// The process control block: HWT discovery, resets, and MMU state.
pub trait ProcControlPort: Send + Sync {
    /// Number of HWTs implemented in the bitstream.
    fn num_hwts(&self) -> u32;
    /// Optional features present in the bitstream.
    fn features(&self) -> ProcFeatures;
    /// Writes the system-wide reset trigger; the value is ignored.
    fn set_sys_reset(&self, value: u32);
    /// Writes one word of the per-HWT reset bitmap.
    fn set_hwt_reset(&self, word: usize, value: u32);
    /// TLB hit counter.
    fn tlb_hits(&self) -> u32;
    /// TLB miss counter.
    fn tlb_misses(&self) -> u32;
    /// Address of the last page fault raised by an HWT.
    fn page_fault_addr(&self) -> u32;
    /// Clears the page fault register.
    fn set_page_fault_addr(&self, value: u32);
    /// Writes the page global directory address.
    fn set_pgd_addr(&self, addr: u32);
}

/// Entry point the physical interrupt line invokes.
pub trait InterruptHandler: Sync {
    /// Services one assertion of the line. Runs in interrupt context with
    /// interrupts masked, so it is never re-entered.
    fn handle_interrupt(&self);
}

/// The single physical interrupt line shared by all channels, together
/// with the RTOS's handler registration.
pub trait IrqLine: Send + Sync {
    /// Returns `true` if the interrupt hardware exists in this system.
    fn is_available(&self) -> bool;
    /// Installs `handler` as the line's interrupt handler.
    fn connect(&self, handler: &'static dyn InterruptHandler);
    /// Lets the line interrupt the CPU.
    fn unmask(&self);
    /// Stops the line from interrupting the CPU.
    fn mask(&self);
    /// Acknowledges and clears the line at the CPU-side controller.
    fn acknowledge(&self);
}

/// Counting wait primitive.
pub trait Signal: Send + Sync {
    /// Adds one event. Callable from thread or interrupt context.
    fn post(&self);
    /// Consumes one event, blocking while none is available.
    fn wait(&self);
}

impl Signal for Semaphore {
    fn post(&self) {
        Semaphore::post(self);
    }

    fn wait(&self) {
        Semaphore::wait(self);
    }
}

/// A board: factories for every register window plus the RTOS hooks.
pub trait Platform {
    /// FIFO registers of one channel.
    type Fifo: FifoPort + 'static;
    /// OSIF interrupt controller.
    type Intc: IntcPort + 'static;
    /// Process control block.
    type ProcControl: ProcControlPort + 'static;
    /// Physical interrupt line.
    type Line: IrqLine + 'static;
    /// Per-channel wait primitive.
    type Signal: Signal + 'static;

    /// Returns the process control block.
    fn proc_control(&self) -> Self::ProcControl;
    /// Returns the OSIF interrupt controller.
    fn intc(&self) -> Self::Intc;
    /// Returns the physical interrupt line.
    fn irq_line(&self) -> Self::Line;
    /// Returns the FIFO registers of channel `index`.
    fn fifo(&self, index: usize) -> Self::Fifo;
    /// Creates a fresh wait primitive with no pending events.
    fn signal(&self) -> Self::Signal;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_recv_status_has_nothing_available() {
        let status = RecvStatus::from_bits_retain((1 << 31) | 7);
        assert_eq!(status.available(), 0);
    }

    #[test]
    fn recv_status_uses_fill_field() {
        let status = RecvStatus::from_bits_retain(4);
        assert_eq!(status.fill(), 4);
        assert_eq!(status.available(), 4);
    }

    #[test]
    fn non_empty_with_zero_fill_counts_one_word() {
        let status = RecvStatus::from_bits_retain(0);
        assert_eq!(status.available(), 1);
    }

    #[test]
    fn recv_status_ignores_reserved_bits() {
        let status = RecvStatus::from_bits_retain(0x00AB_0003);
        assert_eq!(status.available(), 3);
    }

    #[test]
    fn send_status_full_flag() {
        assert!(SendStatus::from_bits_retain(1 << 31).is_full());
        assert!(!SendStatus::from_bits_retain(12).is_full());
    }

    #[test]
    fn semaphore_is_a_signal() {
        let sem = Semaphore::new(0);
        Signal::post(&sem);
        Signal::wait(&sem);
        assert_eq!(sem.available_permits(), 0);
    }
}
