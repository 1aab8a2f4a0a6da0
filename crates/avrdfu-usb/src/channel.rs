//! Control transfer seam
//!
//! All DFU traffic goes over endpoint 0 as class requests addressed to
//! interface 0. [`ControlChannel`] is the one thing the protocol layer needs
//! from a USB backend: an IN and an OUT control transfer, each returning the
//! raw result together with how the status stage ended.
//!
//! The trait uses `maybe_async`:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (WebUSB in the browser)

use std::fmt;

use avrdfu_core::protocol::DFU_INTERFACE;
use avrdfu_core::DfuRequest;
use maybe_async::maybe_async;

use crate::error::{DfuError, Result};

/// Setup packet fields of a DFU class request
///
/// bmRequestType is always class/interface; the direction follows from the
/// transfer used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    /// bRequest
    pub request: DfuRequest,
    /// wValue (wBlockNum for DNLOAD/UPLOAD)
    pub value: u16,
    /// wIndex (interface number)
    pub index: u16,
}

impl ControlSetup {
    /// Request addressed to the DFU interface with wValue = 0
    pub const fn dfu(request: DfuRequest) -> Self {
        Self {
            request,
            value: 0,
            index: DFU_INTERFACE as u16,
        }
    }
}

/// How a control transfer ended on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelStatus {
    /// Completed normally
    Ok,
    /// Device answered with STALL
    Stall,
    /// Device sent more data than requested
    Babble,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStatus::Ok => write!(f, "ok"),
            ChannelStatus::Stall => write!(f, "stall"),
            ChannelStatus::Babble => write!(f, "babble"),
        }
    }
}

/// Result of an IN control transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIn {
    /// Data stage contents; only meaningful when `status` is `Ok`
    pub data: Vec<u8>,
    /// Channel status
    pub status: ChannelStatus,
}

impl TransferIn {
    /// Successful transfer carrying `data`
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            data,
            status: ChannelStatus::Ok,
        }
    }

    /// Transfer that ended with `status` and no usable data
    pub fn failed(status: ChannelStatus) -> Self {
        Self {
            data: Vec::new(),
            status,
        }
    }

    /// Channel status is `Ok`
    pub fn is_ok(&self) -> bool {
        self.status == ChannelStatus::Ok
    }

    /// Data, or `DfuError::Protocol` if the transfer stalled or babbled
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.status {
            ChannelStatus::Ok => Ok(self.data),
            status => Err(DfuError::Protocol(status)),
        }
    }
}

/// Result of an OUT control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOut {
    /// Bytes accepted in the data stage
    pub bytes_written: usize,
    /// Channel status
    pub status: ChannelStatus,
}

impl TransferOut {
    /// Successful transfer of `bytes_written` bytes
    pub fn ok(bytes_written: usize) -> Self {
        Self {
            bytes_written,
            status: ChannelStatus::Ok,
        }
    }

    /// Transfer that ended with `status`
    pub fn failed(status: ChannelStatus) -> Self {
        Self {
            bytes_written: 0,
            status,
        }
    }

    /// Channel status is `Ok`
    pub fn is_ok(&self) -> bool {
        self.status == ChannelStatus::Ok
    }

    /// Byte count, or `DfuError::Protocol` if the transfer stalled or babbled
    pub fn into_result(self) -> Result<usize> {
        match self.status {
            ChannelStatus::Ok => Ok(self.bytes_written),
            status => Err(DfuError::Protocol(status)),
        }
    }
}

/// Result of an operation that silently does nothing without a device
///
/// `abort` and `read_block` skip the transfer when handed no handle, while
/// `clear_status` fails with [`DfuError::NoDevice`]. Callers see the two as
/// different outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// The transfer ran and produced `T`
    Completed(T),
    /// No handle was given; nothing was sent
    Skipped,
}

impl<T> Outcome<T> {
    /// Nothing was sent
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }

    /// The result, if the transfer ran
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Skipped => None,
        }
    }
}

/// USB control channel to an opened, interface-claimed DFU device
///
/// Implementations issue exactly one control transfer per call and return
/// once it has completed. Stall and babble are reported through the
/// returned status; `Err` is reserved for host-side failures (device gone,
/// invalid request, timeout).
#[maybe_async(AFIT)]
pub trait ControlChannel {
    /// Class/interface IN transfer reading up to `length` bytes
    async fn control_in(&mut self, setup: ControlSetup, length: usize) -> Result<TransferIn>;

    /// Class/interface OUT transfer sending `data` (may be empty)
    async fn control_out(&mut self, setup: ControlSetup, data: &[u8]) -> Result<TransferOut>;
}

#[cfg(any(feature = "std", feature = "wasm"))]
pub(crate) mod usb {
    //! Mapping between the protocol seam and `nusb`

    use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient, TransferError};

    use super::{ChannelStatus, ControlSetup, TransferIn, TransferOut};
    use crate::error::{DfuError, Result};

    /// Build the nusb IN setup for a DFU class request
    pub(crate) fn control_in(setup: ControlSetup, length: usize) -> Result<ControlIn> {
        let length = u16::try_from(length).map_err(|_| {
            DfuError::InvalidParameter(format!("control IN length {} exceeds wLength", length))
        })?;
        Ok(ControlIn {
            control_type: ControlType::Class,
            recipient: Recipient::Interface,
            request: setup.request.code(),
            value: setup.value,
            index: setup.index,
            length,
        })
    }

    /// Build the nusb OUT setup for a DFU class request
    pub(crate) fn control_out(setup: ControlSetup, data: &[u8]) -> ControlOut<'_> {
        ControlOut {
            control_type: ControlType::Class,
            recipient: Recipient::Interface,
            request: setup.request.code(),
            value: setup.value,
            index: setup.index,
            data,
        }
    }

    /// Stall and babble end the transfer normally from the protocol's view
    fn channel_status(err: &TransferError) -> Option<ChannelStatus> {
        match err {
            TransferError::Stall => Some(ChannelStatus::Stall),
            TransferError::Fault => Some(ChannelStatus::Babble),
            _ => None,
        }
    }

    pub(crate) fn finish_in(
        setup: ControlSetup,
        result: std::result::Result<Vec<u8>, TransferError>,
    ) -> Result<TransferIn> {
        match result {
            Ok(data) => {
                log::trace!("{} IN <- {} bytes", setup.request, data.len());
                Ok(TransferIn::ok(data))
            }
            Err(e) => match channel_status(&e) {
                Some(status) => {
                    log::debug!("{} IN ended with {}", setup.request, status);
                    Ok(TransferIn::failed(status))
                }
                None => Err(DfuError::Transfer(e.to_string())),
            },
        }
    }

    pub(crate) fn finish_out(
        setup: ControlSetup,
        len: usize,
        result: std::result::Result<(), TransferError>,
    ) -> Result<TransferOut> {
        match result {
            Ok(()) => {
                log::trace!("{} OUT -> {} bytes", setup.request, len);
                Ok(TransferOut::ok(len))
            }
            Err(e) => match channel_status(&e) {
                Some(status) => {
                    log::debug!("{} OUT ended with {}", setup.request, status);
                    Ok(TransferOut::failed(status))
                }
                None => Err(DfuError::Transfer(e.to_string())),
            },
        }
    }

}
