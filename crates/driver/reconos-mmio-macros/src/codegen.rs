//! Expansion of a parsed [`RegisterBlock`] into a struct and its accessors.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

use crate::parse::{RegisterBlock, RegisterDef};

/// Expands the whole block.
pub fn generate(block: &RegisterBlock) -> TokenStream {
    let RegisterBlock {
        attrs,
        vis,
        name,
        registers,
    } = block;
    let accessors = registers.iter().map(|reg| Accessors::new(reg).expand());

    quote! {
        #(#attrs)*
        #[derive(Debug, Clone, Copy)]
        #vis struct #name {
            base: usize,
        }

        impl #name {
            /// Wraps the register block at `base`.
            ///
            /// # Safety
            ///
            /// `base` must map every register of the block, including each
            /// array element that callers will index, for the lifetime of the
            /// value.
            #[must_use]
            #vis const unsafe fn new(base: usize) -> Self {
                Self { base }
            }

            /// Returns the block's base address.
            #[must_use]
            #vis fn base(&self) -> usize {
                self.base
            }

            #(#accessors)*
        }
    }
}

/// Everything needed to emit the getter and setter of one register.
struct Accessors<'a> {
    reg: &'a RegisterDef,
    /// Primitive the hardware is accessed as.
    raw: Ident,
    /// Extra parameter list for indexed registers.
    index_param: TokenStream,
    /// Pointer arithmetic yielding the register's address.
    addr: TokenStream,
}

impl<'a> Accessors<'a> {
    fn new(reg: &'a RegisterDef) -> Self {
        let offset = &reg.offset;
        let (index_param, addr) = if reg.indexed {
            let stride = reg.width.bytes();
            (
                quote! { , index: usize },
                quote! { self.base + #offset + index * #stride },
            )
        } else {
            (TokenStream::new(), quote! { self.base + #offset })
        };
        Self {
            reg,
            raw: reg.width.ident(),
            index_param,
            addr,
        }
    }

    fn expand(&self) -> TokenStream {
        let mut out = TokenStream::new();
        if self.reg.access.readable() {
            out.extend(self.getter());
        }
        if self.reg.access.writable() {
            out.extend(self.setter());
        }
        out
    }

    fn getter(&self) -> TokenStream {
        let Self {
            reg,
            raw,
            index_param,
            addr,
        } = self;
        let attrs = &reg.attrs;
        let name = &reg.name;
        let load = quote! {
            // SAFETY: `new`'s contract covers this address.
            unsafe { core::ptr::read_volatile((#addr) as *const #raw) }
        };
        let (ret, body) = match &reg.bitflags_type {
            Some(flags) => (quote! { #flags }, quote! { #flags::from_bits_retain(#load) }),
            None => (quote! { #raw }, load),
        };

        quote! {
            #(#attrs)*
            #[inline]
            #[must_use]
            pub fn #name(&self #index_param) -> #ret {
                #body
            }
        }
    }

    fn setter(&self) -> TokenStream {
        let Self {
            reg,
            raw,
            index_param,
            addr,
        } = self;
        let name = &reg.name;
        let setter = format_ident!("set_{}", name);
        let doc = if reg.indexed {
            format!("Stores element `index` of `{name}`.")
        } else {
            format!("Stores `{name}`.")
        };
        let (arg, store) = match &reg.bitflags_type {
            Some(flags) => (quote! { #flags }, quote! { value.bits() }),
            None => (quote! { #raw }, quote! { value }),
        };

        quote! {
            #[doc = #doc]
            #[inline]
            pub fn #setter(&self #index_param, value: #arg) {
                // SAFETY: `new`'s contract covers this address.
                unsafe { core::ptr::write_volatile((#addr) as *mut #raw, #store) }
            }
        }
    }
}
