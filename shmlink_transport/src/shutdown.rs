//! End-of-stream rendezvous on `Finished`.

use crate::channel::Channel;
use crate::error::LinkResult;
use shmlink_common::keys::SemaphoreKind;
use tracing::debug;

/// Consumer: acknowledge end of stream and return without waiting.
pub fn consumer(channel: &Channel) -> LinkResult<()> {
    channel.post(SemaphoreKind::Finished)?;
    debug!("consumer posted finished");
    Ok(())
}

/// Producer: block until the consumer acknowledged end of stream.
pub fn producer(channel: &Channel) -> LinkResult<()> {
    channel.wait(SemaphoreKind::Finished)?;
    debug!("producer observed finished");
    Ok(())
}
