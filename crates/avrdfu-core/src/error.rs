//! Error types for avrdfu-core
//!
//! Only frame construction and status decoding can fail at this layer, so
//! the error type stays small, `no_std` and `Copy`.

use core::fmt;

/// Core error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Address range with `start > end`
    InvalidRange {
        /// First address of the range
        start: u16,
        /// Last address of the range
        end: u16,
    },
    /// Payload length does not match the byte count of the address range
    LengthMismatch {
        /// Byte count covered by the range
        expected: usize,
        /// Length of the supplied payload
        actual: usize,
    },
    /// GETSTATUS response shorter than the 6 bytes the layout requires
    ShortStatus(usize),
    /// Read range longer than one UPLOAD can carry (wLength is 16-bit)
    ReadTooLong(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(
                    f,
                    "invalid address range 0x{:04X}..=0x{:04X}: start is past end",
                    start, end
                )
            }
            Self::LengthMismatch { expected, actual } => {
                write!(
                    f,
                    "payload is {} bytes but the address range covers {} bytes",
                    actual, expected
                )
            }
            Self::ShortStatus(len) => {
                write!(f, "status response too short: {} bytes, need 6", len)
            }
            Self::ReadTooLong(len) => {
                write!(
                    f,
                    "read of {} bytes exceeds the {}-byte UPLOAD limit",
                    len,
                    u16::MAX
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
