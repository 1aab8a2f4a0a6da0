//! Block transfer engine
//!
//! Write, read, erase, blank check and launch, each carried as one or two
//! `DFU_DNLOAD`/`DFU_UPLOAD` control transfers. Nothing here polls: erase
//! and programming complete asynchronously on the device, so the caller
//! follows up with [`get_status`](crate::get_status) until bState says the
//! device is ready. Nothing here chunks either; frames must already fit the
//! device's transfer size.
//!
//! Multi-transfer operations (`read_block`, `launch`) rely on their
//! transfers being adjacent on endpoint 0. The `&mut` borrow of the channel
//! for the whole call keeps anything else from slipping in between.

use avrdfu_core::frame::{
    read_command, upload_len, write_frame, AddressRange, MemoryTarget, BLANK_CHECK_COMMAND,
    CHIP_ERASE_COMMAND, START_APPLICATION_COMMAND,
};
use avrdfu_core::DfuRequest;
use maybe_async::maybe_async;

use crate::channel::{ControlChannel, ControlSetup, Outcome, TransferIn, TransferOut};
use crate::error::Result;

/// Send one DNLOAD with `payload` as its data stage
#[maybe_async]
async fn dnload<C: ControlChannel + ?Sized>(dev: &mut C, payload: &[u8]) -> Result<TransferOut> {
    log::trace!("DNLOAD {:02X?}", payload);
    dev.control_out(ControlSetup::dfu(DfuRequest::Dnload), payload)
        .await
}

/// Program `data` into `range` of flash or EEPROM
///
/// Sends header ‖ data ‖ suffix as a single DNLOAD. `data` must be exactly
/// `range.len()` bytes.
#[maybe_async]
pub async fn write_block<C: ControlChannel + ?Sized>(
    dev: &mut C,
    range: AddressRange,
    data: &[u8],
    target: MemoryTarget,
) -> Result<TransferOut> {
    let frame = write_frame(range, data, target)?;
    log::debug!(
        "Writing {:?} 0x{:04X}..=0x{:04X} ({} bytes, frame {} bytes)",
        target,
        range.start(),
        range.end(),
        data.len(),
        frame.len()
    );

    let result = dnload(dev, &frame).await?;
    log::debug!(
        "Write block: {} bytes written, {}",
        result.bytes_written,
        result.status
    );
    Ok(result)
}

/// Read `range` of flash or EEPROM
///
/// Sends the read command as a DNLOAD, then UPLOADs `range.len()` bytes.
/// The UPLOAD result is returned as-is. With no device this does nothing
/// and returns `Outcome::Skipped`. A range too long for one UPLOAD fails
/// before either transfer is sent.
#[maybe_async]
pub async fn read_block<C: ControlChannel + ?Sized>(
    dev: Option<&mut C>,
    range: AddressRange,
    target: MemoryTarget,
) -> Result<Outcome<TransferIn>> {
    let Some(dev) = dev else {
        log::debug!("Read block skipped: no device");
        return Ok(Outcome::Skipped);
    };

    let length = upload_len(range)?;
    log::debug!(
        "Reading {:?} 0x{:04X}..=0x{:04X}",
        target,
        range.start(),
        range.end()
    );

    let cmd = read_command(range, target);
    let sent = dnload(dev, &cmd).await?;
    log::debug!("Read command: {} bytes written", sent.bytes_written);
    if !sent.is_ok() {
        // The UPLOAD still follows; its own status tells the caller what happened.
        log::warn!("Read command ended with {}", sent.status);
    }

    let data = dev
        .control_in(ControlSetup::dfu(DfuRequest::Upload), length as usize)
        .await?;
    log::debug!("Read block: {} bytes, {}", data.data.len(), data.status);
    Ok(Outcome::Completed(data))
}

/// Erase the whole chip
///
/// Erase takes a while on the device; poll `get_status` afterwards.
#[maybe_async]
pub async fn chip_erase<C: ControlChannel + ?Sized>(dev: &mut C) -> Result<TransferOut> {
    log::debug!("Chip erase");
    dnload(dev, &CHIP_ERASE_COMMAND).await
}

/// Ask the device to blank check its flash
///
/// `range` is accepted but not encoded: the command bytes are always
/// `03 01 00 00 6F FF`, which is what deployed bootloaders answer to.
#[maybe_async]
pub async fn blank_check<C: ControlChannel + ?Sized>(
    dev: &mut C,
    range: AddressRange,
) -> Result<TransferOut> {
    log::debug!(
        "Blank check (requested 0x{:04X}..=0x{:04X}, sent fixed command)",
        range.start(),
        range.end()
    );
    dnload(dev, &BLANK_CHECK_COMMAND).await
}

/// Leave the bootloader and start the application
///
/// Sends the start-application command, then a zero-length DNLOAD that ends
/// the download phase and makes the device reset. Only the result of the
/// zero-length transfer is returned; a stall or babble on the first one is
/// logged and otherwise ignored. Host-side errors on either still fail.
#[maybe_async]
pub async fn launch<C: ControlChannel + ?Sized>(dev: &mut C) -> Result<TransferOut> {
    log::debug!("Launching application");

    let start = dnload(dev, &START_APPLICATION_COMMAND).await?;
    log::debug!("Start application command: {}", start.status);

    let result = dnload(dev, &[]).await?;
    log::info!("Launch: {}", result.status);
    Ok(result)
}
