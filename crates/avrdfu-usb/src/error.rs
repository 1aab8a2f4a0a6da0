//! Error types for the Atmel DFU driver

use thiserror::Error;

use crate::channel::ChannelStatus;

/// Result type for Atmel DFU operations
pub type Result<T> = std::result::Result<T, DfuError>;

/// Errors that can occur when talking to an Atmel DFU bootloader
#[derive(Debug, Error)]
pub enum DfuError {
    /// No device matching the filter was found or granted
    #[error("Atmel DFU device not found (VID:{0:04X})")]
    DeviceNotFound(u16),

    /// Failed to open the device
    #[error("Failed to open Atmel DFU device: {0}")]
    OpenFailed(String),

    /// Failed to claim the DFU interface
    #[error("Failed to claim interface: {0}")]
    ClaimFailed(String),

    /// The control transfer completed with a stall or babble
    #[error("Control transfer ended with {0}")]
    Protocol(ChannelStatus),

    /// Operation requires an open device handle and none was given
    #[error("No device available")]
    NoDevice,

    /// USB host stack failure other than stall/babble
    #[error("USB transfer failed: {0}")]
    Transfer(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Wire format error
    #[error("Core error: {0}")]
    Core(#[from] avrdfu_core::Error),
}

impl DfuError {
    /// Acquisition failed: nothing to open
    pub fn is_acquisition(&self) -> bool {
        matches!(self, DfuError::DeviceNotFound(_))
    }

    /// Opening or claiming the device failed
    pub fn is_open(&self) -> bool {
        matches!(self, DfuError::OpenFailed(_) | DfuError::ClaimFailed(_))
    }
}
