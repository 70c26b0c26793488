//! OSIF error types.

use core::fmt;

/// Errors reported by the OSIF driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsifError {
    /// Channel index outside the discovered HWT range.
    InvalidChannel,
    /// The interrupt controller feeding the OSIF line is not synthesized.
    NotAvailable,
    /// The hardware configuration lacks the requested counter or MMU feature.
    FeatureUnavailable,
    /// Sizing the channel array or reset bitmap failed.
    AllocationFailure,
    /// More HWTs than the 32-bit interrupt enable mask can address.
    TooManyChannels,
    /// The interrupt handler was already connected.
    AlreadyStarted,
}

impl OsifError {
    /// Returns the negative errno-style code used by C-facing glue.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidChannel => -22,
            Self::NotAvailable => -19,
            Self::FeatureUnavailable => -95,
            Self::AllocationFailure => -12,
            Self::TooManyChannels => -34,
            Self::AlreadyStarted => -16,
        }
    }
}

impl fmt::Display for OsifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel => f.write_str("invalid OSIF channel"),
            Self::NotAvailable => f.write_str("OSIF interrupt not available"),
            Self::FeatureUnavailable => f.write_str("feature not available on this hardware"),
            Self::AllocationFailure => f.write_str("failed to allocate OSIF state"),
            Self::TooManyChannels => f.write_str("too many hardware threads for interrupt mask"),
            Self::AlreadyStarted => f.write_str("OSIF interrupt already started"),
        }
    }
}

impl core::error::Error for OsifError {}
