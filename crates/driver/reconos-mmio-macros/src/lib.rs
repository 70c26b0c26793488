//! `register_block!`: declarative MMIO register blocks.
//!
//! A block becomes a `Copy` struct holding its base address. Constructing it
//! is `unsafe`; every accessor it carries is a safe volatile load or store.

mod codegen;
mod parse;

use proc_macro::TokenStream;
use syn::parse_macro_input;

/// Declares a register block struct.
///
/// ```ignore
/// register_block! {
///     /// Struct docs.
///     pub Name {
///         /// Register docs, attached to the getter.
///         [offset; width; access] reg,
///         [offset; width; access] flagged => FlagsType,
///         [offset; width; access; array] table,
///     }
/// }
/// ```
///
/// `width` is one of `u8`, `u16`, `u32` or `u64`. `access` is `ro`, `wo` or
/// `rw` and decides whether `reg(&self)` and `set_reg(&self, value)` exist.
/// A `=> FlagsType` suffix moves values through `from_bits_retain` and
/// `bits`. An `array` register is a run of packed elements starting at
/// `offset`, one width apart, and both accessors take `index: usize` first.
///
/// ```ignore
/// use reconos_mmio::register_block;
///
/// register_block! {
///     pub ProcControlRegs {
///         [0x00; u32; ro] num_hwts,
///         [0x14; u32; wo] sys_reset,
///         /// One bit per HWT, 32 HWTs per word.
///         [0x18; u32; rw; array] hwt_reset,
///     }
/// }
///
/// // SAFETY: PROC_CONTROL is mapped at this address.
/// let regs = unsafe { ProcControlRegs::new(0x8000_0000) };
/// regs.set_hwt_reset(1, 0);
/// ```
#[proc_macro]
pub fn register_block(input: TokenStream) -> TokenStream {
    let block = parse_macro_input!(input as parse::RegisterBlock);
    codegen::generate(&block).into()
}
