//! Status channel: GETSTATUS, CLRSTATUS and ABORT
//!
//! `clear_status` and `abort` treat a missing handle differently on purpose:
//! the first fails with [`DfuError::NoDevice`], the second returns
//! [`Outcome::Skipped`] without touching the bus.

use avrdfu_core::protocol::STATUS_LEN;
use avrdfu_core::{DfuRequest, StatusResponse};
use maybe_async::maybe_async;

use crate::channel::{ControlChannel, ControlSetup, Outcome, TransferOut};
use crate::error::{DfuError, Result};

/// Issue DFU_GETSTATUS and decode the 6-byte response
///
/// A stalled or babbled transfer is reported as `DfuError::Protocol`; its
/// data stage is never decoded.
#[maybe_async]
pub async fn get_status<C: ControlChannel + ?Sized>(dev: &mut C) -> Result<StatusResponse> {
    let reply = dev
        .control_in(ControlSetup::dfu(DfuRequest::GetStatus), STATUS_LEN)
        .await?;
    let data = reply.into_result()?;
    let status = StatusResponse::parse(&data)?;

    log::debug!(
        "GETSTATUS: status={} state={} poll={}ms",
        status
            .dfu_status()
            .map_or_else(|| format!("0x{:02X}", status.status), |s| s.to_string()),
        status
            .dfu_state()
            .map_or_else(|| format!("0x{:02X}", status.state), |s| s.to_string()),
        status.poll_timeout_ms
    );

    Ok(status)
}

/// Issue DFU_CLRSTATUS to leave dfuERROR
///
/// Fails with `DfuError::NoDevice` when `dev` is `None`.
#[maybe_async]
pub async fn clear_status<C: ControlChannel + ?Sized>(dev: Option<&mut C>) -> Result<TransferOut> {
    let dev = dev.ok_or(DfuError::NoDevice)?;
    let result = dev
        .control_out(ControlSetup::dfu(DfuRequest::ClrStatus), &[])
        .await?;
    log::debug!("CLRSTATUS: {}", result.status);
    Ok(result)
}

/// Issue DFU_ABORT to return to dfuIDLE
///
/// With no device this is a no-op reported as `Outcome::Skipped`. This does
/// not cancel a transfer in flight; it is a request of its own.
#[maybe_async]
pub async fn abort<C: ControlChannel + ?Sized>(dev: Option<&mut C>) -> Result<Outcome<TransferOut>> {
    let Some(dev) = dev else {
        log::debug!("ABORT skipped: no device");
        return Ok(Outcome::Skipped);
    };
    let result = dev
        .control_out(ControlSetup::dfu(DfuRequest::Abort), &[])
        .await?;
    log::debug!("ABORT: {}", result.status);
    Ok(Outcome::Completed(result))
}

#[cfg(all(test, feature = "is_sync"))]
mod tests {
    use super::*;
    use crate::channel::{ChannelStatus, TransferIn};
    use crate::testing::{RecordingChannel, Sent};

    #[test]
    fn test_get_status_decodes_reply() {
        let mut dev = RecordingChannel::new();
        dev.reply_in(TransferIn::ok(vec![0x00, 0x64, 0x00, 0x00, 0x02, 0x00]));

        let status = get_status(&mut dev).unwrap();
        assert_eq!(status.status, 0);
        assert_eq!(status.poll_timeout_ms, 100);
        assert_eq!(status.state, 2);
        assert_eq!(status.string_index, 0);

        assert_eq!(
            dev.sent,
            vec![Sent::In {
                setup: ControlSetup::dfu(DfuRequest::GetStatus),
                length: 6,
            }]
        );
    }

    #[test]
    fn test_get_status_stall_is_not_decoded() {
        let mut dev = RecordingChannel::new();
        dev.reply_in(TransferIn {
            data: vec![0x00, 0x64, 0x00, 0x00, 0x02, 0x00],
            status: ChannelStatus::Stall,
        });

        let err = get_status(&mut dev).unwrap_err();
        assert!(matches!(err, DfuError::Protocol(ChannelStatus::Stall)));
    }

    #[test]
    fn test_get_status_babble() {
        let mut dev = RecordingChannel::new();
        dev.reply_in(TransferIn::failed(ChannelStatus::Babble));

        let err = get_status(&mut dev).unwrap_err();
        assert!(matches!(err, DfuError::Protocol(ChannelStatus::Babble)));
    }

    #[test]
    fn test_get_status_short_reply() {
        let mut dev = RecordingChannel::new();
        dev.reply_in(TransferIn::ok(vec![0x00, 0x00]));

        let err = get_status(&mut dev).unwrap_err();
        assert!(matches!(
            err,
            DfuError::Core(avrdfu_core::Error::ShortStatus(2))
        ));
    }

    #[test]
    fn test_clear_status_sends_empty_request() {
        let mut dev = RecordingChannel::new();
        let result = clear_status(Some(&mut dev)).unwrap();
        assert!(result.is_ok());
        assert_eq!(
            dev.sent,
            vec![Sent::Out {
                setup: ControlSetup::dfu(DfuRequest::ClrStatus),
                data: vec![],
            }]
        );
    }

    #[test]
    fn test_clear_status_without_device_fails() {
        let err = clear_status::<RecordingChannel>(None).unwrap_err();
        assert!(matches!(err, DfuError::NoDevice));
    }

    #[test]
    fn test_abort_without_device_is_skipped() {
        let outcome = abort::<RecordingChannel>(None).unwrap();
        assert!(outcome.is_skipped());
    }

    #[test]
    fn test_abort_sends_request() {
        let mut dev = RecordingChannel::new();
        dev.reply_out(Ok(TransferOut::failed(ChannelStatus::Stall)));

        let outcome = abort(Some(&mut dev)).unwrap();
        assert_eq!(
            outcome,
            Outcome::Completed(TransferOut::failed(ChannelStatus::Stall))
        );
        assert_eq!(
            dev.sent,
            vec![Sent::Out {
                setup: ControlSetup::dfu(DfuRequest::Abort),
                data: vec![],
            }]
        );
    }
}
