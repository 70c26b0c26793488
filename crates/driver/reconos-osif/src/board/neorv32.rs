//! NEORV32 bindings for the ReconOS reference design.
//!
//! The OSIF interrupt controller's output is wired to one input of the
//! NEORV32 external interrupt controller (XIRQ), which in turn drives a CPU
//! fast interrupt. The trap vector must call [`dispatch_external_interrupt`]
//! when that fast interrupt is taken.

use bitflags::bitflags;
use reconos_core::irq;
use reconos_core::sync::{IrqSpinLock, Semaphore};
use reconos_mmio::register_block;

use crate::config::BoardConfig;
use crate::hal::{
    FifoPort, IntcPort, InterruptHandler, IrqLine, Platform, ProcControlPort, ProcFeatures,
    RecvStatus, SendStatus,
};
use crate::owarn;

register_block! {
    /// FIFO registers of one OSIF channel.
    pub OsifFifoRegs {
        /// Pops one word from the HWT-to-CPU FIFO.
        [0x0; u32; ro] recv_data,
        /// Pushes one word into the CPU-to-HWT FIFO.
        [0x4; u32; wo] send_data,
        /// Receive status: empty flag and fill count.
        [0x8; u32; ro] recv_status => RecvStatus,
        /// Send status: full flag and remaining capacity.
        [0xC; u32; ro] send_status => SendStatus,
    }
}

register_block! {
    /// OSIF interrupt controller. The block decodes a single word: stores
    /// set the channel enable mask, loads return the pending channels.
    pub OsifIntcRegs {
        /// Channels raising an interrupt, armed or not.
        [0x0; u32; ro] pending,
        /// Channel interrupt enable mask.
        [0x0; u32; wo] enable,
    }
}

register_block! {
    /// ReconOS process control registers.
    pub ProcControlRegs {
        /// Number of HWTs in the bitstream.
        [0x00; u32; ro] num_hwts,
        /// Page global directory address for the HWT MMU.
        [0x04; u32; rw] pgd_addr,
        /// Address of the last HWT page fault; write to clear.
        [0x08; u32; rw] page_fault_addr,
        /// TLB hit counter.
        [0x0C; u32; ro] tlb_hits,
        /// TLB miss counter.
        [0x10; u32; ro] tlb_misses,
        /// System reset trigger.
        [0x14; u32; wo] sys_reset,
        /// Per-HWT reset bitmap, one word per 32 HWTs.
        [0x18; u32; wo; array] hwt_reset,
    }
}

register_block! {
    /// NEORV32 external interrupt controller.
    pub XirqRegs {
        /// Input enable mask.
        [0x0; u32; rw] ier,
        /// Pending inputs; writing 0 to a bit clears it.
        [0x4; u32; rw] ipr,
        /// Source of the current interrupt; any write acknowledges.
        [0x8; u32; rw] scr,
    }
}

bitflags! {
    /// NEORV32 SYSINFO SOC word, the bits this driver cares about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SocFeatures: u32 {
        /// The external interrupt controller is synthesized.
        const XIRQ = 1 << 28;
    }
}

register_block! {
    /// NEORV32 system information block, feature word only.
    pub SysinfoRegs {
        /// Implemented SoC features.
        [0x8; u32; ro] soc => SocFeatures,
    }
}

impl FifoPort for OsifFifoRegs {
    fn recv_data(&self) -> u32 {
        OsifFifoRegs::recv_data(self)
    }

    fn set_send_data(&self, word: u32) {
        OsifFifoRegs::set_send_data(self, word);
    }

    fn recv_status(&self) -> RecvStatus {
        OsifFifoRegs::recv_status(self)
    }

    fn send_status(&self) -> SendStatus {
        OsifFifoRegs::send_status(self)
    }
}

impl IntcPort for OsifIntcRegs {
    fn set_enable(&self, mask: u32) {
        OsifIntcRegs::set_enable(self, mask);
    }

    fn pending(&self) -> u32 {
        OsifIntcRegs::pending(self)
    }
}

/// Process control block plus the features the bitstream was built with.
#[derive(Debug, Clone, Copy)]
pub struct Neorv32ProcControl {
    regs: ProcControlRegs,
    features: ProcFeatures,
}

impl ProcControlPort for Neorv32ProcControl {
    fn num_hwts(&self) -> u32 {
        self.regs.num_hwts()
    }

    fn features(&self) -> ProcFeatures {
        self.features
    }

    fn set_sys_reset(&self, value: u32) {
        self.regs.set_sys_reset(value);
    }

    fn set_hwt_reset(&self, word: usize, value: u32) {
        self.regs.set_hwt_reset(word, value);
    }

    fn tlb_hits(&self) -> u32 {
        self.regs.tlb_hits()
    }

    fn tlb_misses(&self) -> u32 {
        self.regs.tlb_misses()
    }

    fn page_fault_addr(&self) -> u32 {
        self.regs.page_fault_addr()
    }

    fn set_page_fault_addr(&self, value: u32) {
        self.regs.set_page_fault_addr(value);
    }

    fn set_pgd_addr(&self, addr: u32) {
        self.regs.set_pgd_addr(addr);
    }
}

/// Handler invoked by [`dispatch_external_interrupt`].
static HANDLER: IrqSpinLock<Option<&'static dyn InterruptHandler>> = IrqSpinLock::new(None);

/// Trap glue entry point for the XIRQ fast interrupt.
///
/// Must run in trap context, where interrupts are masked.
pub fn dispatch_external_interrupt() {
    let handler = *HANDLER.lock();
    match handler {
        Some(handler) => handler.handle_interrupt(),
        None => owarn!("osif: external interrupt with no handler"),
    }
}

/// The OSIF line: one XIRQ input feeding one CPU fast interrupt.
#[derive(Debug, Clone, Copy)]
pub struct Neorv32Line {
    xirq: XirqRegs,
    sysinfo: SysinfoRegs,
    channel: u8,
    cpu_irq: u8,
}

impl Neorv32Line {
    fn channel_bit(&self) -> u32 {
        1 << self.channel
    }

    /// Clears the XIRQ pending flag of this line's input only.
    fn clear_pending(&self) {
        self.xirq.set_ipr(!self.channel_bit());
    }
}

impl IrqLine for Neorv32Line {
    fn is_available(&self) -> bool {
        self.sysinfo.soc().contains(SocFeatures::XIRQ)
    }

    fn connect(&self, handler: &'static dyn InterruptHandler) {
        *HANDLER.lock() = Some(handler);
    }

    fn unmask(&self) {
        irq::without_interrupts(|| {
            self.clear_pending();
            self.xirq.set_ier(self.xirq.ier() | self.channel_bit());
            irq::clear_pending_source(self.cpu_irq);
            irq::enable_source(self.cpu_irq);
        });
    }

    fn mask(&self) {
        irq::without_interrupts(|| {
            irq::disable_source(self.cpu_irq);
            self.xirq.set_ier(self.xirq.ier() & !self.channel_bit());
        });
    }

    fn acknowledge(&self) {
        self.clear_pending();
        self.xirq.set_scr(0);
        irq::clear_pending_source(self.cpu_irq);
    }
}

/// A NEORV32 SoC running the ReconOS reference design.
///
/// The per-channel [`Signal`](crate::hal::Signal) is a bare
/// [`Semaphore`], whose `wait` parks the hart with `wfi` until the OSIF
/// interrupt posts it. A blocked reader therefore stalls the whole hart and
/// no other software thread runs until its HWT produces data. Under an RTOS
/// with its own scheduler, wrap this binding in a [`Platform`] whose
/// `Signal` blocks only the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct Neorv32Board {
    config: BoardConfig,
}

impl Neorv32Board {
    /// Creates the board binding for `config`.
    ///
    /// # Safety
    ///
    /// Every base address in `config` must be the identity-mapped MMIO
    /// window of the named block, and no other code may drive those blocks.
    pub const unsafe fn new(config: BoardConfig) -> Self {
        Self { config }
    }

    /// Returns the address map in use.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }
}

impl Platform for Neorv32Board {
    type Fifo = OsifFifoRegs;
    type Intc = OsifIntcRegs;
    type ProcControl = Neorv32ProcControl;
    type Line = Neorv32Line;
    type Signal = Semaphore;

    fn proc_control(&self) -> Neorv32ProcControl {
        Neorv32ProcControl {
            // SAFETY: Valid per the contract of `Neorv32Board::new`.
            regs: unsafe { ProcControlRegs::new(self.config.proc_control_base) },
            features: self.config.features,
        }
    }

    fn intc(&self) -> OsifIntcRegs {
        // SAFETY: Valid per the contract of `Neorv32Board::new`.
        unsafe { OsifIntcRegs::new(self.config.intc_base) }
    }

    fn irq_line(&self) -> Neorv32Line {
        Neorv32Line {
            // SAFETY: Valid per the contract of `Neorv32Board::new`.
            xirq: unsafe { XirqRegs::new(self.config.xirq_base) },
            // SAFETY: As above.
            sysinfo: unsafe { SysinfoRegs::new(self.config.sysinfo_base) },
            channel: self.config.xirq_channel,
            cpu_irq: self.config.cpu_irq,
        }
    }

    fn fifo(&self, index: usize) -> OsifFifoRegs {
        // SAFETY: Valid per the contract of `Neorv32Board::new`; the
        // channel index is below the discovered HWT count.
        unsafe { OsifFifoRegs::new(self.config.fifo_window(index)) }
    }

    fn signal(&self) -> Semaphore {
        Semaphore::new(0)
    }
}
