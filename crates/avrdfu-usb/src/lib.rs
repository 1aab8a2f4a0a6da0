//! avrdfu-usb - Atmel DFU bootloader driver
//!
//! This crate drives the DFU bootloader found on Atmel/Microchip AVR (MEGA
//! USB parts such as the ATmega32U4) and XMEGA microcontrollers. It erases,
//! programs, reads back, blank checks and launches firmware using the
//! vendor commands layered on top of USB DFU.
//!
//! # Protocol Overview
//!
//! Every command is a class request on interface 0:
//! - `DFU_DNLOAD` carries vendor commands: write (header ‖ data ‖ suffix),
//!   read, chip erase, blank check and start application
//! - `DFU_UPLOAD` returns memory contents after a read command
//! - `DFU_GETSTATUS` reports bStatus/bState and how long to wait before
//!   polling again
//! - `DFU_CLRSTATUS` and `DFU_ABORT` get the device back to dfuIDLE
//!
//! Each operation is one request/response round trip (two for read and
//! launch). Nothing is retried, chunked or polled here: long-running
//! commands return as soon as the device has accepted them, and the caller
//! follows up with [`get_status`].
//!
//! # Example
//!
//! ```no_run
//! use avrdfu_usb::{chip_erase, get_status, write_block, AtmelDfu};
//! use avrdfu_core::{AddressRange, DfuState, MemoryTarget};
//!
//! let mut dfu = AtmelDfu::acquire()?;
//! println!("Device: {}", dfu.info());
//!
//! chip_erase(&mut dfu)?.into_result()?;
//! loop {
//!     let status = get_status(&mut dfu)?;
//!     if status.dfu_state() == Some(DfuState::DfuIdle) {
//!         break;
//!     }
//!     std::thread::sleep(status.poll_timeout());
//! }
//!
//! let page = [0xFFu8; 128];
//! let range = AddressRange::with_len(0x0000, page.len()).unwrap();
//! write_block(&mut dfu, range, &page, MemoryTarget::Flash)?.into_result()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Configuration Options
//!
//! Devices can be selected with `key=value` options:
//!
//! ```no_run
//! use avrdfu_usb::{parse_options, AtmelDfu};
//!
//! let config = parse_options(&[("pid", "2ff4"), ("timeout", "20000")])?;
//! let dfu = AtmelDfu::acquire_with_config(&config)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - `std` (default) - native USB backend via `nusb`, synchronous API
//! - `is_sync` - compile the protocol operations as blocking functions
//! - `wasm` - WebUSB backend with an async API

// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

mod channel;
mod config;
#[cfg(feature = "std")]
mod device;
mod error;
mod status;
#[cfg(all(test, feature = "is_sync"))]
mod testing;
mod transfer;
#[cfg(feature = "wasm")]
mod web_device;

pub use channel::{ChannelStatus, ControlChannel, ControlSetup, Outcome, TransferIn, TransferOut};
pub use config::{parse_options, SessionConfig, DEFAULT_TIMEOUT};
#[cfg(feature = "std")]
pub use device::{AtmelDeviceInfo, AtmelDfu};
pub use error::{DfuError, Result};
pub use status::{abort, clear_status, get_status};
pub use transfer::{blank_check, chip_erase, launch, read_block, write_block};
#[cfg(feature = "wasm")]
pub use web_device::AtmelDfuAsync;
