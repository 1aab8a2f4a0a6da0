//! Atmel DFU protocol constants
//!
//! Request, status and state codes of the DFU 1.0 class as implemented by
//! the Atmel AVR and XMEGA bootloaders, plus the vendor command opcodes and
//! frame geometry carried inside `DFU_DNLOAD` payloads.
//!
//! References:
//! - AVR MEGA: Atmel doc7618, "USB DFU Bootloader Datasheet"
//! - AVR XMEGA: Atmel doc8457, "AVR1916: USB DFU Boot Loader for XMEGA"

use core::fmt;

// ===========================================================================
// USB Device Identifiers
// ===========================================================================

/// Atmel (now Microchip) USB Vendor ID
pub const ATMEL_VENDOR_ID: u16 = 0x03EB;

/// Interface number carrying the DFU control requests
pub const DFU_INTERFACE: u8 = 0;

// ===========================================================================
// Vendor command opcodes (first byte of a DNLOAD payload)
// ===========================================================================

/// Program memory block (doc7618 4.6.1.1)
pub const OP_WRITE: u8 = 0x01;

/// Read memory block / blank check
pub const OP_READ: u8 = 0x03;

/// Chip erase / start application
pub const OP_ERASE_OR_START: u8 = 0x04;

/// Second byte of an `OP_ERASE_OR_START` frame selecting chip-wide erase
pub const ERASE_CHIP: u8 = 0x00;

/// Confirmation sentinel closing the chip erase command
pub const ERASE_CONFIRM: u8 = 0xFF;

/// Second byte of an `OP_ERASE_OR_START` frame selecting application start
pub const START_APPLICATION: u8 = 0x03;

/// Second byte of an `OP_READ` frame selecting blank check
pub const READ_BLANK_CHECK: u8 = 0x01;

// ===========================================================================
// Frame geometry
// ===========================================================================

/// Length of the GETSTATUS response
pub const STATUS_LEN: usize = 6;

/// Write command header, padded to bMaxPacketSize0
pub const WRITE_HEADER_LEN: usize = 32;

/// Length of the DFU file suffix appended to write frames
pub const DFU_SUFFIX_LEN: usize = 16;

/// Length of the read command
pub const READ_COMMAND_LEN: usize = 6;

/// Largest UPLOAD a single control transfer can request (wLength)
pub const MAX_UPLOAD_LEN: usize = u16::MAX as usize;

/// Header offset of the opcode byte
pub const HDR_OPCODE: usize = 0;
/// Header offset of the memory selector byte
pub const HDR_TARGET: usize = 1;
/// Header offset of the start address (big-endian, 2 bytes)
pub const HDR_START: usize = 2;
/// Header offset of the end address (big-endian, 2 bytes)
pub const HDR_END: usize = 4;
/// Header offset of the trailing pad byte
pub const HDR_PAD: usize = WRITE_HEADER_LEN - 1;

/// Suffix offset of the CRC field (4 bytes, left zero)
pub const SFX_CRC: usize = 0;
/// Suffix offset of bLength
pub const SFX_LENGTH: usize = 4;
/// Suffix offset of the "DFU" signature and bcdDFU low byte
pub const SFX_SIGNATURE: usize = 5;
/// Suffix offset of the bcdDFU high byte
pub const SFX_BCD_DFU_HI: usize = 9;
/// Suffix offset of idVendor, idProduct and bcdDevice (2 bytes each)
pub const SFX_IDS: usize = 10;

/// Signature bytes of the DFU suffix followed by bcdDFU low byte
pub const SUFFIX_SIGNATURE: [u8; 4] = [b'D', b'F', b'U', 0x01];

// ===========================================================================
// Class requests (bRequest)
// ===========================================================================

/// DFU class request codes
///
/// `Detach`, `GetState` and `Abort` are not defined on XMEGA parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DfuRequest {
    /// DFU_DETACH
    Detach = 0,
    /// DFU_DNLOAD
    Dnload = 1,
    /// DFU_UPLOAD
    Upload = 2,
    /// DFU_GETSTATUS
    GetStatus = 3,
    /// DFU_CLRSTATUS
    ClrStatus = 4,
    /// DFU_GETSTATE
    GetState = 5,
    /// DFU_ABORT
    Abort = 6,
}

impl DfuRequest {
    /// Create a DfuRequest from a raw bRequest value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Detach),
            1 => Some(Self::Dnload),
            2 => Some(Self::Upload),
            3 => Some(Self::GetStatus),
            4 => Some(Self::ClrStatus),
            5 => Some(Self::GetState),
            6 => Some(Self::Abort),
            _ => None,
        }
    }

    /// Wire value of the request
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether the data stage runs device-to-host
    pub const fn is_in(self) -> bool {
        matches!(self, Self::Upload | Self::GetStatus | Self::GetState)
    }
}

impl fmt::Display for DfuRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detach => "DFU_DETACH",
            Self::Dnload => "DFU_DNLOAD",
            Self::Upload => "DFU_UPLOAD",
            Self::GetStatus => "DFU_GETSTATUS",
            Self::ClrStatus => "DFU_CLRSTATUS",
            Self::GetState => "DFU_GETSTATE",
            Self::Abort => "DFU_ABORT",
        };
        f.write_str(name)
    }
}

// ===========================================================================
// Device status (bStatus)
// ===========================================================================

/// Device error status reported in GETSTATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DfuStatus {
    /// No error condition is present
    Ok = 0,
    /// File is not targeted for use by this device
    ErrTarget = 1,
    /// File is for this device but fails a verification test
    ErrFile = 2,
    /// Device is unable to write memory
    ErrWrite = 3,
    /// Memory erase function failed
    ErrErase = 4,
    /// Memory erase check failed
    ErrCheckErased = 5,
    /// Program memory function failed
    ErrProg = 6,
    /// Programmed memory failed verification
    ErrVerify = 7,
    /// Received address is out of range
    ErrAddress = 8,
    /// Received DNLOAD with wLength = 0 but more data was expected
    ErrNotDone = 9,
    /// Firmware is corrupt, cannot return to run-time operation
    ErrFirmware = 10,
    /// iString indicates a vendor-specific error
    ErrVendor = 11,
    /// Device detected unexpected USB reset signaling
    ErrUsbr = 12,
    /// Device detected unexpected power on reset
    ErrPor = 13,
    /// Something went wrong, but the device does not know what
    ErrUnknown = 14,
    /// Device stalled an unexpected request
    ErrStalledPkt = 15,
}

impl DfuStatus {
    /// Create a DfuStatus from a raw bStatus value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::ErrTarget),
            2 => Some(Self::ErrFile),
            3 => Some(Self::ErrWrite),
            4 => Some(Self::ErrErase),
            5 => Some(Self::ErrCheckErased),
            6 => Some(Self::ErrProg),
            7 => Some(Self::ErrVerify),
            8 => Some(Self::ErrAddress),
            9 => Some(Self::ErrNotDone),
            10 => Some(Self::ErrFirmware),
            11 => Some(Self::ErrVendor),
            12 => Some(Self::ErrUsbr),
            13 => Some(Self::ErrPor),
            14 => Some(Self::ErrUnknown),
            15 => Some(Self::ErrStalledPkt),
            _ => None,
        }
    }
}

impl fmt::Display for DfuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::ErrTarget => "errTARGET",
            Self::ErrFile => "errFILE",
            Self::ErrWrite => "errWRITE",
            Self::ErrErase => "errERASE",
            Self::ErrCheckErased => "errCHECK_ERASED",
            Self::ErrProg => "errPROG",
            Self::ErrVerify => "errVERIFY",
            Self::ErrAddress => "errADDRESS",
            Self::ErrNotDone => "errNOTDONE",
            Self::ErrFirmware => "errFIRMWARE",
            Self::ErrVendor => "errVENDOR",
            Self::ErrUsbr => "errUSBR",
            Self::ErrPor => "errPOR",
            Self::ErrUnknown => "errUNKNOWN",
            Self::ErrStalledPkt => "errSTALLEDPKT",
        };
        f.write_str(name)
    }
}

// ===========================================================================
// Device state (bState)
// ===========================================================================

/// Device lifecycle state reported in GETSTATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DfuState {
    /// Running the application, idle
    AppIdle = 0,
    /// Running the application, waiting for USB reset after DETACH
    AppDetach = 1,
    /// DFU mode, waiting for requests
    DfuIdle = 2,
    /// Block received, waiting for GETSTATUS
    DnloadSync = 3,
    /// Programming a block
    DnBusy = 4,
    /// Ready for the next DNLOAD block
    DnloadIdle = 5,
    /// Final block received, waiting for GETSTATUS to begin manifestation
    ManifestSync = 6,
    /// Manifestation in progress
    Manifest = 7,
    /// Manifested, waiting for USB reset
    ManifestWaitReset = 8,
    /// Upload in progress
    UploadIdle = 9,
    /// Error, waiting for CLRSTATUS
    Error = 10,
}

impl DfuState {
    /// Create a DfuState from a raw bState value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::AppIdle),
            1 => Some(Self::AppDetach),
            2 => Some(Self::DfuIdle),
            3 => Some(Self::DnloadSync),
            4 => Some(Self::DnBusy),
            5 => Some(Self::DnloadIdle),
            6 => Some(Self::ManifestSync),
            7 => Some(Self::Manifest),
            8 => Some(Self::ManifestWaitReset),
            9 => Some(Self::UploadIdle),
            10 => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for DfuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AppIdle => "appIDLE",
            Self::AppDetach => "appDETACH",
            Self::DfuIdle => "dfuIDLE",
            Self::DnloadSync => "dfuDNLOAD-SYNC",
            Self::DnBusy => "dfuDNBUSY",
            Self::DnloadIdle => "dfuDNLOAD-IDLE",
            Self::ManifestSync => "dfuMANIFEST-SYNC",
            Self::Manifest => "dfuMANIFEST",
            Self::ManifestWaitReset => "dfuMANIFEST-WAIT-RESET",
            Self::UploadIdle => "dfuUPLOAD-IDLE",
            Self::Error => "dfuERROR",
        };
        f.write_str(name)
    }
}
