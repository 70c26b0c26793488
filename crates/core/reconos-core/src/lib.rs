//! Interrupt-aware synchronization primitives for the ReconOS runtime.
//!
//! The OSIF driver shares state between thread context and a single
//! interrupt handler on a one-hart NEORV32 core. This crate provides the
//! pieces that make that sharing sound: local interrupt masking
//! ([`irq`]), an interrupt-masking spin lock, and a counting semaphore that
//! may be posted from interrupt context.
//!
//! Everything here is host-testable with `cargo test`, and the primitives
//! can be model-checked with loom (`RUSTFLAGS="--cfg loom"`).

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod irq;
pub mod sync;
