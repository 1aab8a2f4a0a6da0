//! Async Atmel DFU session for WebUSB (wasm32)
//!
//! The browser grants access to a device through its permission prompt;
//! after that the handle behaves like the native `AtmelDfu` but every
//! transfer is awaited instead of blocked on.

use std::time::Duration;

use maybe_async::maybe_async;
use nusb::Interface;

use crate::channel::{usb, ControlChannel, ControlSetup, TransferIn, TransferOut};
use crate::config::SessionConfig;
use crate::error::{DfuError, Result};
use avrdfu_core::protocol::DFU_INTERFACE;

/// Async Atmel DFU handle for WebUSB
pub struct AtmelDfuAsync {
    /// Claimed DFU interface
    interface: Interface,
    /// Timeout applied to each control transfer
    timeout: Duration,
}

impl AtmelDfuAsync {
    /// Request a device via the WebUSB permission prompt
    ///
    /// This must be called from a user gesture (e.g., button click) in the
    /// browser. The picker is filtered to `config.vendor_id` and, if set,
    /// `config.product_id`.
    #[cfg(target_arch = "wasm32")]
    pub async fn request_device(config: &SessionConfig) -> Result<nusb::DeviceInfo> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;
        use web_sys::{UsbDevice, UsbDeviceFilter, UsbDeviceRequestOptions};

        let usb = web_sys::window()
            .ok_or(DfuError::DeviceNotFound(config.vendor_id))?
            .navigator()
            .usb();

        let filter = UsbDeviceFilter::new();
        filter.set_vendor_id(config.vendor_id);
        if let Some(pid) = config.product_id {
            filter.set_product_id(pid);
        }

        let filters = js_sys::Array::new();
        filters.push(&filter);

        let options = UsbDeviceRequestOptions::new(&filters);

        log::info!("Requesting Atmel DFU device via WebUSB picker...");

        // A dismissed picker rejects the promise: nothing was granted.
        let device_js = JsFuture::from(usb.request_device(&options))
            .await
            .map_err(|e| {
                log::debug!("WebUSB request rejected: {:?}", e);
                DfuError::DeviceNotFound(config.vendor_id)
            })?;

        let device: UsbDevice = device_js
            .dyn_into()
            .map_err(|_| DfuError::OpenFailed("Failed to get USB device".to_string()))?;

        log::info!(
            "Atmel DFU device selected: VID={:04X} PID={:04X}",
            device.vendor_id(),
            device.product_id()
        );

        nusb::device_info_from_webusb(device)
            .await
            .map_err(|e| DfuError::OpenFailed(format!("Failed to get device info: {}", e)))
    }

    /// Open a device from a DeviceInfo and claim interface 0
    pub async fn open(device_info: nusb::DeviceInfo, config: &SessionConfig) -> Result<Self> {
        log::info!(
            "Opening Atmel DFU device VID={:04X} PID={:04X}",
            device_info.vendor_id(),
            device_info.product_id()
        );

        let device = device_info
            .open()
            .await
            .map_err(|e| DfuError::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(DFU_INTERFACE)
            .await
            .map_err(|e| DfuError::ClaimFailed(e.to_string()))?;

        Ok(Self {
            interface,
            timeout: config.timeout,
        })
    }
}

#[maybe_async(AFIT)]
impl ControlChannel for AtmelDfuAsync {
    async fn control_in(&mut self, setup: ControlSetup, length: usize) -> Result<TransferIn> {
        let request = usb::control_in(setup, length)?;
        let result = self.interface.control_in(request, self.timeout).await;
        usb::finish_in(setup, result)
    }

    async fn control_out(&mut self, setup: ControlSetup, data: &[u8]) -> Result<TransferOut> {
        let result = self
            .interface
            .control_out(usb::control_out(setup, data), self.timeout)
            .await;
        usb::finish_out(setup, data.len(), result)
    }
}
