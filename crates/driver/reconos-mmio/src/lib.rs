//! MMIO register blocks for the ReconOS drivers.
//!
//! Drivers depend on this crate rather than on the proc-macro crate
//! directly. See [`register_block!`] for the definition syntax.
//!
//! ```ignore
//! use reconos_mmio::register_block;
//!
//! register_block! {
//!     pub OsifIntcRegs {
//!         /// Channels raising an interrupt.
//!         [0x00; u32; ro] pending,
//!         /// One enable bit per channel, sharing the word with `pending`.
//!         [0x00; u32; wo] enable,
//!     }
//! }
//!
//! // SAFETY: the OSIF interrupt controller is mapped here.
//! let intc = unsafe { OsifIntcRegs::new(0x87B4_0000) };
//! intc.set_enable(1 << 3);
//! let fired = intc.pending() & (1 << 3);
//! ```

#![no_std]
#![warn(missing_docs)]

pub use reconos_mmio_macros::register_block;
