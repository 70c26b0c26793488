//! ReconOS OS interface (OSIF) driver.
//!
//! Software threads talk to hardware threads (HWTs) on the FPGA fabric
//! through one FIFO pair per HWT. Readers block on a per-channel signal
//! while a single shared interrupt line, demultiplexed by channel, wakes
//! them when their HWT produces data. Writers spin on the send FIFO's full
//! flag. A process control block exposes the HWT count, per-HWT reset
//! lines, and optional MMU state.
//!
//! The entry point is [`Osif`], built over a [`Platform`]; the NEORV32
//! reference design is provided by [`board::Neorv32Board`].

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod board;
pub mod config;
pub mod error;
pub mod fifo;
pub mod hal;
pub mod intc;
pub mod log;
pub mod osif;
pub mod reset;

pub use error::OsifError;
pub use hal::Platform;
pub use osif::{Channel, Osif};
