//! avrdfu-core - Atmel DFU wire format
//!
//! This crate holds the byte-level side of the Atmel/Microchip vendor
//! extensions to USB DFU as spoken by the AVR MEGA (doc7618) and XMEGA
//! (doc8457) bootloaders: request, status and state codes, the frames
//! sent with `DFU_DNLOAD`, and decoding of the `DFU_GETSTATUS` response.
//!
//! Nothing here performs I/O. The transfers themselves live in
//! `avrdfu-usb`.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for building write frames
//!
//! # Example
//!
//! ```
//! use avrdfu_core::frame::{read_command, AddressRange, MemoryTarget};
//!
//! let range = AddressRange::new(0x0100, 0x01FF)?;
//! assert_eq!(range.len(), 256);
//! assert_eq!(
//!     read_command(range, MemoryTarget::Eeprom),
//!     [0x03, 0x02, 0x01, 0x00, 0x01, 0xFF]
//! );
//! # Ok::<(), avrdfu_core::Error>(())
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod frame;
pub mod protocol;
pub mod status;

pub use error::{Error, Result};
pub use frame::{AddressRange, MemoryTarget};
pub use protocol::{DfuRequest, DfuState, DfuStatus};
pub use status::StatusResponse;
