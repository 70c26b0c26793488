//! Board bindings: [`Platform`](crate::hal::Platform) implementations over
//! real MMIO.

pub mod neorv32;

pub use neorv32::{Neorv32Board, dispatch_external_interrupt};
