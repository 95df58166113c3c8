//! Keyed System V semaphores and the scoped lease used for guards.

use crate::error::{LinkError, LinkResult};
use crate::platform;
use nix::errno::Errno;
use shmlink_common::keys::{ChannelKeys, SemaphoreKind};
use std::time::Duration;
use tracing::{trace, warn};

/// One semaphore of the channel, located by key.
///
/// Increments on kinds that [release on exit](SemaphoreKind::releases_on_exit)
/// carry `SEM_UNDO`, so the kernel reverts them if the process dies.
#[derive(Debug, Clone, Copy)]
pub struct Semaphore {
    kind: SemaphoreKind,
    key: i32,
    id: i32,
}

impl Semaphore {
    /// Get or create the semaphore for `kind`.
    pub fn open(keys: &ChannelKeys, kind: SemaphoreKind) -> LinkResult<Self> {
        let key = keys.semaphore(kind);
        let id = platform::sem_get(key).map_err(|e| LinkError::sys("semget", kind, e))?;
        trace!("Opened {} key={:#x} id={}", kind, key, id);
        Ok(Self { kind, key, id })
    }

    /// Which semaphore this is.
    pub fn kind(&self) -> SemaphoreKind {
        self.kind
    }

    /// Increment by one.
    pub fn post(&self) -> LinkResult<()> {
        let mut ops = [platform::sembuf(1, self.kind.releases_on_exit())];
        platform::sem_op(self.id, &mut ops).map_err(|e| LinkError::sys("semop", self.kind, e))
    }

    /// Decrement by one, blocking for at most `timeout`.
    pub fn wait(&self, timeout: Duration) -> LinkResult<()> {
        let mut ops = [platform::sembuf(-1, false)];
        platform::sem_timed_op(self.id, &mut ops, timeout).map_err(|e| self.wait_error(e, timeout))
    }

    /// Wait until the value is zero, then increment it with `SEM_UNDO`, as
    /// one atomic operation. The returned lease gives the increment back on
    /// drop; the kernel does the same if the process dies first.
    pub fn acquire_exclusive(&self, timeout: Duration) -> LinkResult<Lease> {
        let mut ops = [platform::sembuf(0, false), platform::sembuf(1, true)];
        platform::sem_timed_op(self.id, &mut ops, timeout)
            .map_err(|e| self.wait_error(e, timeout))?;
        Ok(Lease { semaphore: *self })
    }

    /// Force the value to zero.
    pub fn reset(&self) -> LinkResult<()> {
        platform::sem_set_value(self.id, 0).map_err(|e| LinkError::sys("semctl(SETVAL)", self.kind, e))
    }

    /// Current value.
    pub fn value(&self) -> LinkResult<i32> {
        platform::sem_get_value(self.id).map_err(|e| LinkError::sys("semctl(GETVAL)", self.kind, e))
    }

    fn wait_error(&self, errno: Errno, timeout: Duration) -> LinkError {
        match errno {
            Errno::EAGAIN => LinkError::Timeout {
                resource: self.kind,
                after: timeout,
            },
            other => LinkError::sys("semtimedop", format!("{} ({:#x})", self.kind, self.key), other),
        }
    }
}

/// Exclusive hold on a guard semaphore.
#[derive(Debug)]
pub struct Lease {
    semaphore: Semaphore,
}

impl Lease {
    /// Guard this lease holds.
    pub fn kind(&self) -> SemaphoreKind {
        self.semaphore.kind
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut ops = [platform::sembuf(-1, true)];
        ops[0].sem_flg |= libc::IPC_NOWAIT as libc::c_short;
        if let Err(e) = platform::sem_op(self.semaphore.id, &mut ops) {
            warn!("Failed to release {}: {}", self.semaphore.kind, e);
        }
    }
}
