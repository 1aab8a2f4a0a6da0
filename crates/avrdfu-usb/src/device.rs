//! Native USB session
//!
//! [`AtmelDfu`] finds an Atmel DFU bootloader on the host's USB bus, opens
//! it and claims interface 0. The resulting handle is the [`ControlChannel`]
//! every protocol operation runs on. Closing happens on drop.

use std::fmt;
use std::time::Duration;

use maybe_async::maybe_async;
use nusb::{Interface, MaybeFuture};

use crate::channel::{usb, ControlChannel, ControlSetup, TransferIn, TransferOut};
use crate::config::SessionConfig;
use crate::error::{DfuError, Result};
use avrdfu_core::protocol::DFU_INTERFACE;

/// Identification of an enumerated Atmel DFU device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtmelDeviceInfo {
    /// USB bus identifier
    pub bus_id: String,
    /// USB device address
    pub address: u8,
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID (identifies the part family, e.g. 0x2FF4 = ATmega32U4)
    pub product_id: u16,
    /// Product string, if the device reports one
    pub product: Option<String>,
    /// Serial number, if the device reports one
    pub serial: Option<String>,
}

impl AtmelDeviceInfo {
    fn from_nusb(d: &nusb::DeviceInfo) -> Self {
        Self {
            bus_id: d.bus_id().to_string(),
            address: d.device_address(),
            vendor_id: d.vendor_id(),
            product_id: d.product_id(),
            product: d.product_string().map(str::to_string),
            serial: d.serial_number().map(str::to_string),
        }
    }
}

impl fmt::Display for AtmelDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04X}:{:04X} at bus {} address {}",
            self.vendor_id, self.product_id, self.bus_id, self.address
        )?;
        if let Some(product) = &self.product {
            write!(f, " ({})", product)?;
        }
        Ok(())
    }
}

/// Open, interface-claimed Atmel DFU bootloader
pub struct AtmelDfu {
    /// Claimed DFU interface
    interface: Interface,
    /// Timeout applied to each control transfer
    timeout: Duration,
    /// Where the device was found
    info: AtmelDeviceInfo,
}

impl AtmelDfu {
    /// Acquire the first Atmel device on the bus
    pub fn acquire() -> Result<Self> {
        Self::acquire_with_config(&SessionConfig::default())
    }

    /// Acquire a device matching `config`
    ///
    /// Fails with `DeviceNotFound` when nothing matches, `OpenFailed` or
    /// `ClaimFailed` when the device is there but cannot be taken.
    pub fn acquire_with_config(config: &SessionConfig) -> Result<Self> {
        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| DfuError::OpenFailed(e.to_string()))?
            .filter(|d| config.matches(d.vendor_id(), d.product_id(), d.serial_number()))
            .collect();

        log::debug!(
            "Found {} device(s) matching VID {:04X}",
            devices.len(),
            config.vendor_id
        );

        let device_info = devices
            .get(config.device_index)
            .ok_or(DfuError::DeviceNotFound(config.vendor_id))?;

        Self::open_device(device_info, config)
    }

    /// List all connected devices matching `config`
    pub fn list_devices(config: &SessionConfig) -> Result<Vec<AtmelDeviceInfo>> {
        let devices = nusb::list_devices()
            .wait()
            .map_err(|e| DfuError::OpenFailed(e.to_string()))?
            .filter(|d| config.matches(d.vendor_id(), d.product_id(), d.serial_number()))
            .map(|d| AtmelDeviceInfo::from_nusb(&d))
            .collect();

        Ok(devices)
    }

    fn open_device(device_info: &nusb::DeviceInfo, config: &SessionConfig) -> Result<Self> {
        let info = AtmelDeviceInfo::from_nusb(device_info);
        log::info!("Opening Atmel DFU device {}", info);

        let device = device_info
            .open()
            .wait()
            .map_err(|e| DfuError::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(DFU_INTERFACE)
            .wait()
            .map_err(|e| DfuError::ClaimFailed(e.to_string()))?;

        Ok(Self {
            interface,
            timeout: config.timeout,
            info,
        })
    }

    /// Where the device was found
    pub fn info(&self) -> &AtmelDeviceInfo {
        &self.info
    }

    /// Timeout applied to each control transfer
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the per-transfer timeout, e.g. around a chip erase
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

#[maybe_async(AFIT)]
impl ControlChannel for AtmelDfu {
    async fn control_in(&mut self, setup: ControlSetup, length: usize) -> Result<TransferIn> {
        let request = usb::control_in(setup, length)?;
        let result = self.interface.control_in(request, self.timeout).wait();
        usb::finish_in(setup, result)
    }

    async fn control_out(&mut self, setup: ControlSetup, data: &[u8]) -> Result<TransferOut> {
        let result = self
            .interface
            .control_out(usb::control_out(setup, data), self.timeout)
            .wait();
        usb::finish_out(setup, data.len(), result)
    }
}
