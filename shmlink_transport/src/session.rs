//! One complete session per role: bootstrap, handshake, transfer, shutdown.

use crate::channel::Channel;
use crate::error::LinkResult;
use crate::transfer::{self, TransferStats};
use crate::{handshake, shutdown};
use shmlink_common::config::ChannelConfig;
use shmlink_common::keys::Role;
use std::io::{Read, Write};
use tracing::info;

/// Stream `source` to the consumer. Succeeds only once the consumer has
/// acknowledged end of stream.
pub fn run_producer<R: Read>(config: &ChannelConfig, source: &mut R) -> LinkResult<TransferStats> {
    let mut channel = Channel::open(Role::Producer, config)?;
    handshake::producer(&mut channel)?;
    info!("producer handshake complete");

    let stats = transfer::produce(&mut channel, source)?;
    shutdown::producer(&channel)?;

    info!(
        "producer finished: {} chunks, {} bytes",
        stats.chunks, stats.bytes
    );
    Ok(stats)
}

/// Drain the producer's stream into `sink` until end of stream.
pub fn run_consumer<W: Write>(config: &ChannelConfig, sink: &mut W) -> LinkResult<TransferStats> {
    let mut channel = Channel::open(Role::Consumer, config)?;
    handshake::consumer(&mut channel)?;
    info!("consumer handshake complete");

    let stats = transfer::consume(&mut channel, sink)?;
    shutdown::consumer(&channel)?;

    info!(
        "consumer finished: {} chunks, {} bytes",
        stats.chunks, stats.bytes
    );
    Ok(stats)
}
