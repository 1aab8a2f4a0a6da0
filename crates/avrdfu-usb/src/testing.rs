//! Recording control channel for unit tests

use std::collections::VecDeque;

use maybe_async::maybe_async;

use crate::channel::{ControlChannel, ControlSetup, TransferIn, TransferOut};
use crate::error::Result;

/// One control transfer as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    In { setup: ControlSetup, length: usize },
    Out { setup: ControlSetup, data: Vec<u8> },
}

/// Channel that records every transfer and replays scripted replies
///
/// Without a scripted reply, IN transfers return `length` zero bytes and OUT
/// transfers report the whole payload as written.
#[derive(Default)]
pub(crate) struct RecordingChannel {
    pub sent: Vec<Sent>,
    in_replies: VecDeque<TransferIn>,
    out_replies: VecDeque<Result<TransferOut>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    pub fn reply_in(&mut self, reply: TransferIn) {
        self.in_replies.push_back(reply);
    }

    pub fn reply_out(&mut self, reply: Result<TransferOut>) {
        self.out_replies.push_back(reply);
    }
}

#[maybe_async(AFIT)]
impl ControlChannel for RecordingChannel {
    async fn control_in(&mut self, setup: ControlSetup, length: usize) -> Result<TransferIn> {
        self.sent.push(Sent::In { setup, length });
        Ok(self
            .in_replies
            .pop_front()
            .unwrap_or_else(|| TransferIn::ok(vec![0; length])))
    }

    async fn control_out(&mut self, setup: ControlSetup, data: &[u8]) -> Result<TransferOut> {
        self.sent.push(Sent::Out {
            setup,
            data: data.to_vec(),
        });
        self.out_replies
            .pop_front()
            .unwrap_or_else(|| Ok(TransferOut::ok(data.len())))
    }
}
