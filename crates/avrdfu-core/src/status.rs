//! DFU_GETSTATUS response decoding

use core::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::{DfuState, DfuStatus, STATUS_LEN};

/// Decoded GETSTATUS response
///
/// Raw byte values are kept as received. Codes outside the known tables are
/// not an error here; `dfu_status()` and `dfu_state()` return `None` for
/// them and the caller decides what that means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusResponse {
    /// bStatus
    pub status: u8,
    /// bwPollTimeout in milliseconds (24-bit)
    pub poll_timeout_ms: u32,
    /// bState
    pub state: u8,
    /// iString
    pub string_index: u8,
}

impl StatusResponse {
    /// Decode `[bStatus, pollLo, pollMid, pollHi, bState, iString]`
    ///
    /// Bytes past the sixth are ignored.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < STATUS_LEN {
            return Err(Error::ShortStatus(buf.len()));
        }

        Ok(Self {
            status: buf[0],
            poll_timeout_ms: u32::from_le_bytes([buf[1], buf[2], buf[3], 0]),
            state: buf[4],
            string_index: buf[5],
        })
    }

    /// bStatus as a known status code
    pub fn dfu_status(&self) -> Option<DfuStatus> {
        DfuStatus::from_u8(self.status)
    }

    /// bState as a known state code
    pub fn dfu_state(&self) -> Option<DfuState> {
        DfuState::from_u8(self.state)
    }

    /// Minimum time the host should wait before the next GETSTATUS
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms as u64)
    }

    /// bStatus is `OK`
    pub fn is_ok(&self) -> bool {
        self.status == DfuStatus::Ok as u8
    }

    /// bState is `dfuERROR`; the device needs CLRSTATUS before anything else
    pub fn is_error_state(&self) -> bool {
        self.state == DfuState::Error as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_idle() {
        let status = StatusResponse::parse(&[0x00, 0x64, 0x00, 0x00, 0x02, 0x00]).unwrap();
        assert_eq!(
            status,
            StatusResponse {
                status: 0,
                poll_timeout_ms: 100,
                state: 2,
                string_index: 0,
            }
        );
        assert!(status.is_ok());
        assert_eq!(status.dfu_state(), Some(DfuState::DfuIdle));
        assert_eq!(status.poll_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_poll_timeout_is_24bit_le() {
        let status = StatusResponse::parse(&[0x03, 0x01, 0x02, 0x03, 0x0A, 0x07]).unwrap();
        assert_eq!(status.poll_timeout_ms, 0x030201);
        assert_eq!(status.dfu_status(), Some(DfuStatus::ErrWrite));
        assert!(status.is_error_state());
        assert_eq!(status.string_index, 7);
    }

    #[test]
    fn test_parse_keeps_unknown_codes() {
        let status = StatusResponse::parse(&[0x42, 0x00, 0x00, 0x00, 0x99, 0x00]).unwrap();
        assert_eq!(status.status, 0x42);
        assert_eq!(status.state, 0x99);
        assert_eq!(status.dfu_status(), None);
        assert_eq!(status.dfu_state(), None);
        assert!(!status.is_ok());
    }

    #[test]
    fn test_parse_short_buffer() {
        assert_eq!(
            StatusResponse::parse(&[0x00, 0x64, 0x00]),
            Err(Error::ShortStatus(3))
        );
    }
}
