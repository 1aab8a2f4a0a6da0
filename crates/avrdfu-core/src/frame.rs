//! DNLOAD payload builders
//!
//! Every vendor command travels as the data stage of a `DFU_DNLOAD` control
//! transfer. The builders here produce those payloads byte for byte; they do
//! not know anything about the transfer itself.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::protocol::*;

/// Memory selected by a write or read command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryTarget {
    /// Application flash
    #[default]
    Flash,
    /// Data EEPROM
    Eeprom,
}

impl MemoryTarget {
    /// Selector byte used in the write command header
    pub const fn write_selector(self) -> u8 {
        match self {
            Self::Flash => 0x00,
            Self::Eeprom => 0x01,
        }
    }

    /// Selector byte used in the read command
    ///
    /// EEPROM is `0x02` here, not `0x01` as in the write header.
    pub const fn read_selector(self) -> u8 {
        match self {
            Self::Flash => 0x00,
            Self::Eeprom => 0x02,
        }
    }
}

/// Inclusive 16-bit address range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    start: u16,
    end: u16,
}

impl AddressRange {
    /// Create a range covering `start..=end`
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range of `len` bytes starting at `start`
    ///
    /// Returns `None` when `len` is zero or the range would run past 0xFFFF.
    pub fn with_len(start: u16, len: usize) -> Option<Self> {
        let last = (start as usize).checked_add(len.checked_sub(1)?)?;
        let end = u16::try_from(last).ok()?;
        Some(Self { start, end })
    }

    /// First address
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Last address (inclusive)
    pub const fn end(&self) -> u16 {
        self.end
    }

    /// Number of bytes covered, `end - start + 1`
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }
}

/// DFU suffix appended to every write frame
///
/// The CRC is left zero and vendor/product/device are wildcards. The
/// bootloader accepts this and does not validate the suffix.
pub const DFU_SUFFIX: [u8; DFU_SUFFIX_LEN] = {
    let mut s = [0u8; DFU_SUFFIX_LEN];
    // SFX_CRC..SFX_LENGTH stays zero
    s[SFX_LENGTH] = DFU_SUFFIX_LEN as u8;
    s[SFX_SIGNATURE] = SUFFIX_SIGNATURE[0];
    s[SFX_SIGNATURE + 1] = SUFFIX_SIGNATURE[1];
    s[SFX_SIGNATURE + 2] = SUFFIX_SIGNATURE[2];
    s[SFX_SIGNATURE + 3] = SUFFIX_SIGNATURE[3];
    s[SFX_BCD_DFU_HI] = 0x00;
    let mut i = SFX_IDS;
    while i < DFU_SUFFIX_LEN {
        s[i] = 0xFF;
        i += 1;
    }
    s
};

/// Chip erase: opcode, chip-wide selector, confirmation sentinel
pub const CHIP_ERASE_COMMAND: [u8; 3] = [OP_ERASE_OR_START, ERASE_CHIP, ERASE_CONFIRM];

/// Blank check command
///
/// The address bytes are fixed at 0x0000..=0x6FFF whatever range the caller
/// asks about. Bootloaders in the field are known to accept exactly these
/// bytes, so they are kept as-is.
pub const BLANK_CHECK_COMMAND: [u8; READ_COMMAND_LEN] =
    [OP_READ, READ_BLANK_CHECK, 0x00, 0x00, 0x6F, 0xFF];

/// Start application, sent before the zero-length DNLOAD that triggers reset
pub const START_APPLICATION_COMMAND: [u8; 3] = [OP_ERASE_OR_START, START_APPLICATION, 0x00];

/// Build the 32-byte write command header
pub fn write_header(range: AddressRange, target: MemoryTarget) -> [u8; WRITE_HEADER_LEN] {
    let mut header = [0u8; WRITE_HEADER_LEN];
    header[HDR_OPCODE] = OP_WRITE;
    header[HDR_TARGET] = target.write_selector();
    header[HDR_START..HDR_START + 2].copy_from_slice(&range.start().to_be_bytes());
    header[HDR_END..HDR_END + 2].copy_from_slice(&range.end().to_be_bytes());
    header[HDR_PAD] = 0x00;
    header
}

/// Build a complete write frame: header ‖ data ‖ suffix
///
/// `data` must cover the range exactly. Large images have to be split by the
/// caller; the frame must fit the device's transfer size.
#[cfg(feature = "alloc")]
pub fn write_frame(range: AddressRange, data: &[u8], target: MemoryTarget) -> Result<Vec<u8>> {
    if data.len() != range.len() {
        return Err(Error::LengthMismatch {
            expected: range.len(),
            actual: data.len(),
        });
    }

    let mut frame = Vec::with_capacity(WRITE_HEADER_LEN + data.len() + DFU_SUFFIX_LEN);
    frame.extend_from_slice(&write_header(range, target));
    frame.extend_from_slice(data);
    frame.extend_from_slice(&DFU_SUFFIX);
    Ok(frame)
}

/// Build the 6-byte read command
pub fn read_command(range: AddressRange, target: MemoryTarget) -> [u8; READ_COMMAND_LEN] {
    let [start_hi, start_lo] = range.start().to_be_bytes();
    let [end_hi, end_lo] = range.end().to_be_bytes();
    [
        OP_READ,
        target.read_selector(),
        start_hi,
        start_lo,
        end_hi,
        end_lo,
    ]
}

/// wLength of the UPLOAD that follows the read command for `range`
///
/// The full 64 KiB space is one byte too long for a single UPLOAD.
pub fn upload_len(range: AddressRange) -> Result<u16> {
    let len = range.len();
    if len > MAX_UPLOAD_LEN {
        return Err(Error::ReadTooLong(len));
    }
    Ok(len as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_rejects_reversed() {
        assert_eq!(
            AddressRange::new(0x200, 0x100),
            Err(Error::InvalidRange {
                start: 0x200,
                end: 0x100
            })
        );
        assert_eq!(AddressRange::new(5, 5).unwrap().len(), 1);
        assert_eq!(AddressRange::new(0, 0xFFFF).unwrap().len(), 65536);
    }

    #[test]
    fn test_range_with_len() {
        let range = AddressRange::with_len(0x100, 0x80).unwrap();
        assert_eq!(range.start(), 0x100);
        assert_eq!(range.end(), 0x17F);
        assert!(AddressRange::with_len(0x100, 0).is_none());
        assert!(AddressRange::with_len(0xFFFF, 2).is_none());
        assert_eq!(AddressRange::with_len(0xFFFF, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_suffix_bytes() {
        assert_eq!(
            DFU_SUFFIX,
            [
                0x00, 0x00, 0x00, 0x00, 0x10, 0x44, 0x46, 0x55, 0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
                0xFF, 0xFF
            ]
        );
    }

    #[test]
    fn test_write_header_layout() {
        let range = AddressRange::new(0x1234, 0x12B3).unwrap();
        let header = write_header(range, MemoryTarget::Flash);
        assert_eq!(&header[..6], &[0x01, 0x00, 0x12, 0x34, 0x12, 0xB3]);
        assert!(header[6..].iter().all(|&b| b == 0));

        let header = write_header(range, MemoryTarget::Eeprom);
        assert_eq!(header[HDR_TARGET], 0x01);
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_write_frame_layout() {
        use alloc::vec::Vec;

        for (start, len) in [(0x0000u16, 1usize), (0x0040, 64), (0x7F00, 256), (0xFF80, 128)] {
            let range = AddressRange::with_len(start, len).unwrap();
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();

            for target in [MemoryTarget::Flash, MemoryTarget::Eeprom] {
                let frame = write_frame(range, &data, target).unwrap();
                assert_eq!(frame.len(), WRITE_HEADER_LEN + len + DFU_SUFFIX_LEN);
                assert_eq!(frame[1], (target == MemoryTarget::Eeprom) as u8);
                assert_eq!(&frame[2..4], &range.start().to_be_bytes());
                assert_eq!(&frame[4..6], &range.end().to_be_bytes());
                assert_eq!(frame[31], 0x00);
                assert_eq!(&frame[WRITE_HEADER_LEN..WRITE_HEADER_LEN + len], &data[..]);
                assert_eq!(&frame[WRITE_HEADER_LEN + len..], &DFU_SUFFIX);
            }
        }
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_write_frame_length_mismatch() {
        let range = AddressRange::new(0, 15).unwrap();
        assert_eq!(
            write_frame(range, &[0u8; 8], MemoryTarget::Flash),
            Err(Error::LengthMismatch {
                expected: 16,
                actual: 8
            })
        );
    }

    #[test]
    fn test_read_command() {
        let range = AddressRange::new(0x0100, 0x01FF).unwrap();
        assert_eq!(
            read_command(range, MemoryTarget::Flash),
            [0x03, 0x00, 0x01, 0x00, 0x01, 0xFF]
        );
        assert_eq!(
            read_command(range, MemoryTarget::Eeprom),
            [0x03, 0x02, 0x01, 0x00, 0x01, 0xFF]
        );
    }

    #[test]
    fn test_upload_len() {
        assert_eq!(upload_len(AddressRange::new(0x0100, 0x01FF).unwrap()), Ok(256));
        assert_eq!(upload_len(AddressRange::new(1, 0xFFFF).unwrap()), Ok(0xFFFF));
        assert_eq!(
            upload_len(AddressRange::new(0, 0xFFFF).unwrap()),
            Err(Error::ReadTooLong(65536))
        );
    }

    #[test]
    fn test_fixed_commands() {
        assert_eq!(CHIP_ERASE_COMMAND, [0x04, 0x00, 0xFF]);
        assert_eq!(BLANK_CHECK_COMMAND, [0x03, 0x01, 0x00, 0x00, 0x6F, 0xFF]);
        assert_eq!(START_APPLICATION_COMMAND, [0x04, 0x03, 0x00]);
    }
}
