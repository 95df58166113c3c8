//! Lock-step single-slot transfer.
//!
//! `SlotIsFree` and `SlotHasData` alternate as turn tokens; whoever holds
//! the token owns the slot. Every turn starts by validating the `control`
//! word the other side left behind.

use crate::channel::Channel;
use crate::control::{Control, Sentinel};
use crate::error::{LinkResult, ProtocolError};
use shmlink_common::consts::PAYLOAD_CAPACITY;
use shmlink_common::keys::SemaphoreKind;
use std::io::{ErrorKind, Read, Write};
use tracing::trace;

/// Counters for one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    /// Non-empty chunks moved through the slot.
    pub chunks: u64,
    /// Payload bytes moved through the slot.
    pub bytes: u64,
}

impl TransferStats {
    fn record(&mut self, len: usize) {
        self.chunks += 1;
        self.bytes += len as u64;
    }
}

fn pull<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match source.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Producer loop. Returns after the end-of-stream turn has been handed to
/// the consumer; the caller then runs the shutdown rendezvous.
pub fn produce<R: Read>(channel: &mut Channel, source: &mut R) -> LinkResult<TransferStats> {
    let mut stats = TransferStats::default();
    let mut expected = Sentinel::ConsumerHello;
    let mut chunk = [0u8; PAYLOAD_CAPACITY];

    loop {
        channel.wait(SemaphoreKind::SlotIsFree)?;

        let found = channel.segment().read_control();
        if found != Control::Sentinel(expected) {
            let found = found.encode();
            return Err(match expected {
                Sentinel::ConsumerHello => ProtocolError::BadHandshake {
                    expected: expected.raw(),
                    found,
                },
                _ => ProtocolError::PeerDied { found },
            }
            .into());
        }
        expected = Sentinel::ConsumerAck;

        let len = pull(source, &mut chunk)?;
        let segment = channel.segment_mut();
        segment.write_payload(&chunk[..len]);
        segment.write_control(Control::for_chunk(len));
        channel.post(SemaphoreKind::SlotHasData)?;

        if len == 0 {
            trace!("producer sent end of stream");
            return Ok(stats);
        }
        stats.record(len);
        trace!("producer sent chunk #{} ({} bytes)", stats.chunks, len);
    }
}

/// Consumer loop. Returns on end of stream with the sink flushed; the
/// caller then signals `Finished`.
pub fn consume<W: Write>(channel: &mut Channel, sink: &mut W) -> LinkResult<TransferStats> {
    let mut stats = TransferStats::default();
    let mut chunk = [0u8; PAYLOAD_CAPACITY];

    loop {
        channel.wait(SemaphoreKind::SlotHasData)?;

        match channel.segment().read_control() {
            Control::EndOfStream => {
                trace!("consumer saw end of stream");
                sink.flush()?;
                return Ok(stats);
            }
            Control::Length(len) => {
                let len = len as usize;
                channel.segment().read_payload(&mut chunk[..len]);
                sink.write_all(&chunk[..len])?;
                stats.record(len);
                trace!("consumer delivered chunk #{} ({} bytes)", stats.chunks, len);
            }
            other => {
                return Err(ProtocolError::PeerDied {
                    found: other.encode(),
                }
                .into());
            }
        }

        channel
            .segment_mut()
            .write_control(Control::Sentinel(Sentinel::ConsumerAck));
        channel.post(SemaphoreKind::SlotIsFree)?;
    }
}
