//! `register_block!` input grammar.
//!
//! ```text
//! block    := attr* vis Ident '{' (register ','?)* '}'
//! register := attr* '[' offset ';' width ';' access (';' 'array')? ']' Ident ('=>' Ident)?
//! ```

use proc_macro2::Span;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, LitInt, Token, Visibility, braced, bracketed};

/// A parsed `register_block!` invocation.
pub struct RegisterBlock {
    /// Outer attributes, forwarded to the struct.
    pub attrs: Vec<Attribute>,
    /// Visibility of the struct and its constructor.
    pub vis: Visibility,
    /// Struct name.
    pub name: Ident,
    /// Registers in declaration order.
    pub registers: Vec<RegisterDef>,
}

/// Which accessors a register gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `ro`: getter only.
    ReadOnly,
    /// `wo`: setter only.
    WriteOnly,
    /// `rw`: both.
    ReadWrite,
}

impl AccessMode {
    /// Returns `true` if a getter is generated.
    pub fn readable(self) -> bool {
        self != Self::WriteOnly
    }

    /// Returns `true` if a setter is generated.
    pub fn writable(self) -> bool {
        self != Self::ReadOnly
    }
}

/// Integer width of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWidth {
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
}

impl RegWidth {
    /// Returns the primitive type name.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
        }
    }

    /// Returns the width in bytes, which is also the array stride.
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    /// Returns the primitive type as an identifier.
    pub fn ident(self) -> Ident {
        Ident::new(self.type_name(), Span::call_site())
    }
}

/// One register line.
pub struct RegisterDef {
    /// Attributes (docs) forwarded to the getter.
    pub attrs: Vec<Attribute>,
    /// Byte offset from the block base; of element 0 for arrays.
    pub offset: LitInt,
    /// Register width.
    pub width: RegWidth,
    /// Generated accessors.
    pub access: AccessMode,
    /// `true` for `array` registers, addressed by a runtime index.
    pub indexed: bool,
    /// Getter name; the setter is `set_<name>`.
    pub name: Ident,
    /// Bitflags type the raw value is wrapped in, if any.
    pub bitflags_type: Option<Ident>,
}

impl Parse for RegWidth {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ident: Ident = input.parse()?;
        [Self::U8, Self::U16, Self::U32, Self::U64]
            .into_iter()
            .find(|w| ident == w.type_name())
            .ok_or_else(|| syn::Error::new(ident.span(), "register width must be u8, u16, u32, or u64"))
    }
}

impl Parse for AccessMode {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ident: Ident = input.parse()?;
        match ident.to_string().as_str() {
            "ro" => Ok(Self::ReadOnly),
            "wo" => Ok(Self::WriteOnly),
            "rw" => Ok(Self::ReadWrite),
            _ => Err(syn::Error::new(ident.span(), "access must be ro, wo, or rw")),
        }
    }
}

/// Parses the optional `; array` suffix inside the brackets.
fn parse_shape(input: ParseStream) -> syn::Result<bool> {
    if input.is_empty() {
        return Ok(false);
    }
    input.parse::<Token![;]>()?;
    let shape: Ident = input.parse()?;
    if shape == "array" {
        Ok(true)
    } else {
        Err(syn::Error::new(shape.span(), "unknown register shape, expected `array`"))
    }
}

impl Parse for RegisterDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;

        let slot;
        bracketed!(slot in input);
        let offset: LitInt = slot.parse()?;
        slot.parse::<Token![;]>()?;
        let width: RegWidth = slot.parse()?;
        slot.parse::<Token![;]>()?;
        let access: AccessMode = slot.parse()?;
        let indexed = parse_shape(&slot)?;

        let name: Ident = input.parse()?;
        let bitflags_type = if input.parse::<Option<Token![=>]>>()?.is_some() {
            Some(input.parse()?)
        } else {
            None
        };

        Ok(Self {
            attrs,
            offset,
            width,
            access,
            indexed,
            name,
            bitflags_type,
        })
    }
}

impl Parse for RegisterBlock {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse()?;
        let name = input.parse()?;

        let body;
        braced!(body in input);
        let mut registers = Vec::new();
        while !body.is_empty() {
            registers.push(body.parse()?);
            if body.parse::<Option<Token![,]>>()?.is_none() {
                break;
            }
        }
        if !body.is_empty() {
            return Err(body.error("expected `,` between registers"));
        }

        Ok(Self {
            attrs,
            vis,
            name,
            registers,
        })
    }
}
