//! Readiness rendezvous.
//!
//! Each role walks `Created → Signaled → Confirmed`: it announces its own
//! resources on the peer's ready signal, then waits for the peer's
//! announcement. After that the producer opens the sentinel exchange on the
//! slot, and the consumer answers it. The consumer's answer is the first
//! turn the producer's transfer loop consumes.

use crate::channel::Channel;
use crate::control::{Control, Sentinel};
use crate::error::{LinkResult, ProtocolError};
use shmlink_common::keys::{Role, SemaphoreKind};
use tracing::debug;

/// Handshake progress of one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Bootstrap finished, nothing announced yet.
    Created,
    /// Own readiness posted on the peer's ready signal.
    Signaled,
    /// Peer's readiness observed.
    Confirmed,
}

fn rendezvous(channel: &Channel) -> LinkResult<HandshakeState> {
    let role = channel.role();
    let mut state = HandshakeState::Created;
    debug!("{} handshake {:?}", role, state);

    channel.post(role.peer().ready_signal())?;
    state = HandshakeState::Signaled;
    debug!("{} handshake {:?}", role, state);

    channel.wait(role.ready_signal())?;
    state = HandshakeState::Confirmed;
    debug!("{} handshake {:?}", role, state);

    Ok(state)
}

/// Producer side: rendezvous, reset `Finished` for the new session, write
/// `ProducerHello` and hand the slot to the consumer.
pub fn producer(channel: &mut Channel) -> LinkResult<HandshakeState> {
    debug_assert_eq!(channel.role(), Role::Producer);
    let state = rendezvous(channel)?;

    channel.reset(SemaphoreKind::Finished)?;
    channel
        .segment_mut()
        .write_control(Control::Sentinel(Sentinel::ProducerHello));
    channel.post(SemaphoreKind::SlotHasData)?;
    debug!("producer sent {}", Sentinel::ProducerHello);

    Ok(state)
}

/// Consumer side: rendezvous, take the first turn, check `ProducerHello`,
/// answer with `ConsumerHello` and hand the slot back.
pub fn consumer(channel: &mut Channel) -> LinkResult<HandshakeState> {
    debug_assert_eq!(channel.role(), Role::Consumer);
    let state = rendezvous(channel)?;

    channel.wait(SemaphoreKind::SlotHasData)?;
    let expected = Sentinel::ProducerHello;
    let found = channel.segment().read_control();
    if found != Control::Sentinel(expected) {
        return Err(ProtocolError::BadHandshake {
            expected: expected.raw(),
            found: found.encode(),
        }
        .into());
    }

    channel
        .segment_mut()
        .write_control(Control::Sentinel(Sentinel::ConsumerHello));
    channel.post(SemaphoreKind::SlotIsFree)?;
    debug!("consumer answered with {}", Sentinel::ConsumerHello);

    Ok(state)
}
