//! Build-time and board configuration.
//!
//! Log verbosity is fixed at compile time from the `RECONOS_LOG_LEVEL`
//! environment variable. Register base addresses live in [`BoardConfig`]
//! so a different address map only needs a different constant.

use crate::hal::ProcFeatures;
use crate::log::LogLevel;

/// Maximum OSIF log level (compile-time). Messages more verbose than this
/// are discarded before formatting.
pub const MAX_LOG_LEVEL: LogLevel = match option_env!("RECONOS_LOG_LEVEL") {
    Some(level) => match level.as_bytes() {
        b"error" => LogLevel::Error,
        b"warn" => LogLevel::Warn,
        b"info" => LogLevel::Info,
        b"debug" => LogLevel::Debug,
        b"trace" => LogLevel::Trace,
        _ => LogLevel::Info,
    },
    None => LogLevel::Info,
};

/// Physical register map of a ReconOS system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Base of the first OSIF FIFO register window.
    pub fifo_base: usize,
    /// Distance between consecutive channels' FIFO windows.
    pub fifo_stride: usize,
    /// Base of the OSIF interrupt controller.
    pub intc_base: usize,
    /// Base of the process control block.
    pub proc_control_base: usize,
    /// Base of the CPU-side external interrupt controller (XIRQ).
    pub xirq_base: usize,
    /// Base of the SYSINFO block.
    pub sysinfo_base: usize,
    /// XIRQ input the OSIF interrupt controller is wired to.
    pub xirq_channel: u8,
    /// `mie` bit of the CPU fast interrupt fed by the XIRQ.
    pub cpu_irq: u8,
    /// Optional process control features present in the bitstream.
    pub features: ProcFeatures,
}

impl BoardConfig {
    /// NEORV32 on the ReconOS reference design (no MMU).
    pub const NEORV32: Self = Self {
        fifo_base: 0x875A_0000,
        fifo_stride: 0x10,
        intc_base: 0x87B4_0000,
        proc_control_base: 0x86FE_0000,
        xirq_base: 0xFFFF_FF80,
        sysinfo_base: 0xFFFF_FFE0,
        xirq_channel: 0,
        cpu_irq: 24,
        features: ProcFeatures::empty(),
    };

    /// Returns the FIFO window base of channel `index`.
    #[must_use]
    pub const fn fifo_window(&self, index: usize) -> usize {
        self.fifo_base + index * self.fifo_stride
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::NEORV32
    }
}
