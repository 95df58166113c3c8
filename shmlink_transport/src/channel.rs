//! Channel bootstrap.
//!
//! Either role may run first, so every object is get-or-create by key.
//! Before touching anything else a role takes its own creation guard,
//! which caps it to one live instance per key set.

use crate::error::{LinkError, LinkResult};
use crate::platform;
use crate::segment::Segment;
use crate::semaphore::{Lease, Semaphore};
use nix::errno::Errno;
use shmlink_common::config::ChannelConfig;
use shmlink_common::keys::{ChannelKeys, Role, SemaphoreKind};
use std::time::Duration;
use tracing::{debug, info};

/// Every kernel object one role needs, attached and ready.
///
/// Fields drop in declaration order, so the segment is detached before the
/// creation guard is released.
pub struct Channel {
    role: Role,
    keys: ChannelKeys,
    timeout: Duration,
    segment: Segment,
    ready_to_consumer: Semaphore,
    ready_to_producer: Semaphore,
    slot_has_data: Semaphore,
    slot_is_free: Semaphore,
    finished: Semaphore,
    guard: Lease,
}

impl Channel {
    /// Acquire the role's guard, then get or create the remaining
    /// semaphores and attach the segment.
    pub fn open(role: Role, config: &ChannelConfig) -> LinkResult<Self> {
        config.validate()?;
        let keys = config.keys()?;
        let timeout = config.wait_timeout();

        debug!("{} acquiring {}", role, role.guard());
        let guard = Semaphore::open(&keys, role.guard())?.acquire_exclusive(timeout)?;

        let ready_to_consumer = Semaphore::open(&keys, SemaphoreKind::ReadyToConsumer)?;
        let ready_to_producer = Semaphore::open(&keys, SemaphoreKind::ReadyToProducer)?;
        let slot_has_data = Semaphore::open(&keys, SemaphoreKind::SlotHasData)?;
        let slot_is_free = Semaphore::open(&keys, SemaphoreKind::SlotIsFree)?;
        let finished = Semaphore::open(&keys, SemaphoreKind::Finished)?;
        let segment = Segment::attach(&keys)?;

        info!(
            "{} bootstrapped on base key {:#x} (pid {}, timeout {:?})",
            role,
            keys.base(),
            platform::current_pid(),
            timeout
        );

        Ok(Self {
            role,
            keys,
            timeout,
            segment,
            ready_to_consumer,
            ready_to_producer,
            slot_has_data,
            slot_is_free,
            finished,
            guard,
        })
    }

    /// Role this process plays.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Key set in use.
    pub fn keys(&self) -> &ChannelKeys {
        &self.keys
    }

    /// Ceiling for every blocking wait.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Guard held for the lifetime of the channel.
    pub fn guard(&self) -> &Lease {
        &self.guard
    }

    /// The shared slot.
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// The shared slot, for writing.
    pub fn segment_mut(&mut self) -> &mut Segment {
        &mut self.segment
    }

    /// A non-guard semaphore by kind, or `None` for guard kinds; those are
    /// only reachable through [`Lease`].
    pub fn semaphore(&self, kind: SemaphoreKind) -> Option<&Semaphore> {
        match kind {
            SemaphoreKind::ReadyToConsumer => Some(&self.ready_to_consumer),
            SemaphoreKind::ReadyToProducer => Some(&self.ready_to_producer),
            SemaphoreKind::SlotHasData => Some(&self.slot_has_data),
            SemaphoreKind::SlotIsFree => Some(&self.slot_is_free),
            SemaphoreKind::Finished => Some(&self.finished),
            SemaphoreKind::ProducerGuard | SemaphoreKind::ConsumerGuard => None,
        }
    }

    /// Block on `kind` for at most [`Channel::timeout`].
    ///
    /// Guard kinds fail with `EPERM`.
    pub fn wait(&self, kind: SemaphoreKind) -> LinkResult<()> {
        self.signal(kind, "semtimedop")?.wait(self.timeout)
    }

    /// Increment `kind`.
    ///
    /// Guard kinds fail with `EPERM`.
    pub fn post(&self, kind: SemaphoreKind) -> LinkResult<()> {
        self.signal(kind, "semop")?.post()
    }

    /// Force `kind` to zero.
    ///
    /// Guard kinds fail with `EPERM`.
    pub fn reset(&self, kind: SemaphoreKind) -> LinkResult<()> {
        self.signal(kind, "semctl(SETVAL)")?.reset()
    }

    fn signal(&self, kind: SemaphoreKind, call: &'static str) -> LinkResult<&Semaphore> {
        self.semaphore(kind)
            .ok_or_else(|| LinkError::sys(call, kind, Errno::EPERM))
    }
}

/// Remove the segment and every semaphore of `keys` from the kernel.
///
/// Objects that do not exist are skipped. Neither role calls this during a
/// session; it is an administrative cleanup.
pub fn remove_resources(keys: &ChannelKeys) -> LinkResult<()> {
    for kind in SemaphoreKind::ALL {
        let key = keys.semaphore(kind);
        if let Some(id) = platform::sem_lookup(key).map_err(|e| LinkError::sys("semget", kind, e))? {
            platform::sem_remove(id).map_err(|e| LinkError::sys("semctl(IPC_RMID)", kind, e))?;
            debug!("Removed {} key={:#x}", kind, key);
        }
    }

    let key = keys.segment();
    let lookup = platform::shm_lookup(key)
        .map_err(|e| LinkError::sys("shmget", format!("segment {key:#x}"), e))?;
    if let Some(id) = lookup {
        platform::shm_remove(id)
            .map_err(|e| LinkError::sys("shmctl(IPC_RMID)", format!("segment {key:#x}"), e))?;
        debug!("Removed segment key={:#x}", key);
    }
    Ok(())
}
