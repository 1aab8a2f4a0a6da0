//! Session configuration
//!
//! Options come in as `key=value` pairs, the same way programmer options
//! are passed on a command line:
//!
//! - `vid=03eb`: USB vendor ID to match (hex, optional `0x` prefix)
//! - `pid=2ff4`: USB product ID to match (hex)
//! - `device=N` or `index=N`: Select the Nth matching device (0-indexed)
//! - `serial=XXXX`: Select the device with this serial number
//! - `timeout=MS`: Host-side timeout for each control transfer (default 60 s)

use std::time::Duration;

use avrdfu_core::protocol::ATMEL_VENDOR_ID;

use crate::error::{DfuError, Result};

/// Default host-side timeout for a single control transfer
///
/// The protocol itself never times out: erase and programming progress is
/// tracked by polling GETSTATUS. `nusb` still needs a deadline for every
/// control transfer, so this one is only meant to catch a device that has
/// gone silent. It is long enough that a chip erase on the largest parts
/// never hits it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration options for acquiring an Atmel DFU device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// USB vendor ID filter
    pub vendor_id: u16,
    /// USB product ID filter (any product when `None`)
    pub product_id: Option<u16>,
    /// Device index among the matching devices
    pub device_index: usize,
    /// Serial number to search for
    pub serial: Option<String>,
    /// Timeout the USB stack applies to each control transfer
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            vendor_id: ATMEL_VENDOR_ID,
            product_id: None,
            device_index: 0,
            serial: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Whether a device with these IDs and serial passes the filter
    pub fn matches(&self, vendor_id: u16, product_id: u16, serial: Option<&str>) -> bool {
        if vendor_id != self.vendor_id {
            return false;
        }
        if self.product_id.is_some_and(|pid| pid != product_id) {
            return false;
        }
        match &self.serial {
            Some(wanted) => serial == Some(wanted.as_str()),
            None => true,
        }
    }
}

fn parse_hex_u16(key: &str, value: &str) -> Result<u16> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16)
        .map_err(|_| DfuError::InvalidParameter(format!("{}: {}", key, value)))
}

/// Parse options from key=value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<SessionConfig> {
    let mut config = SessionConfig::default();

    for (key, value) in options {
        match *key {
            "vid" => config.vendor_id = parse_hex_u16(key, value)?,
            "pid" => config.product_id = Some(parse_hex_u16(key, value)?),
            "device" | "index" => {
                config.device_index = value
                    .parse()
                    .map_err(|_| DfuError::InvalidParameter(format!("{}: {}", key, value)))?;
            }
            "serial" => {
                config.serial = Some(value.to_string());
            }
            "timeout" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| DfuError::InvalidParameter(format!("timeout: {}", value)))?;
                if ms == 0 {
                    return Err(DfuError::InvalidParameter(
                        "timeout: must be non-zero".to_string(),
                    ));
                }
                config.timeout = Duration::from_millis(ms);
            }
            _ => {
                return Err(DfuError::InvalidParameter(format!(
                    "unknown option: {}",
                    key
                )));
            }
        }
    }

    Ok(config)
}
