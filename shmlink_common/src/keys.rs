//! System-wide IPC keys.
//!
//! Producer and consumer locate every kernel object through a base key
//! plus a fixed offset, so both sides agree without any discovery step.
//!
//! | Object            | Offset |
//! |-------------------|--------|
//! | `ProducerGuard`   | -3     |
//! | `ReadyToProducer` | -2     |
//! | `SlotIsFree`      | -1     |
//! | `Finished`        | 0      |
//! | `SlotHasData`     | +1     |
//! | `ReadyToConsumer` | +2     |
//! | `ConsumerGuard`   | +3     |
//! | segment           | 0      |
//!
//! The segment and `Finished` share a key; they live in separate System V
//! namespaces.

use std::fmt;

/// Which side of the link a process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Reads the byte source and fills the segment.
    Producer,
    /// Drains the segment into the byte sink.
    Consumer,
}

impl Role {
    /// The opposite role.
    pub const fn peer(self) -> Self {
        match self {
            Self::Producer => Self::Consumer,
            Self::Consumer => Self::Producer,
        }
    }

    /// Guard capping this role to a single live instance.
    pub const fn guard(self) -> SemaphoreKind {
        match self {
            Self::Producer => SemaphoreKind::ProducerGuard,
            Self::Consumer => SemaphoreKind::ConsumerGuard,
        }
    }

    /// Ready signal this role waits on during the handshake.
    pub const fn ready_signal(self) -> SemaphoreKind {
        match self {
            Self::Producer => SemaphoreKind::ReadyToProducer,
            Self::Consumer => SemaphoreKind::ReadyToConsumer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Producer => f.write_str("producer"),
            Self::Consumer => f.write_str("consumer"),
        }
    }
}

/// The seven semaphores of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemaphoreKind {
    /// At most one producer instance.
    ProducerGuard,
    /// At most one consumer instance.
    ConsumerGuard,
    /// Producer's resources exist.
    ReadyToConsumer,
    /// Consumer's resources exist.
    ReadyToProducer,
    /// Consumer's turn to read the segment.
    SlotHasData,
    /// Producer's turn to write the segment.
    SlotIsFree,
    /// Final end-of-stream rendezvous.
    Finished,
}

impl SemaphoreKind {
    /// All kinds, in key order.
    pub const ALL: [SemaphoreKind; 7] = [
        Self::ProducerGuard,
        Self::ReadyToProducer,
        Self::SlotIsFree,
        Self::Finished,
        Self::SlotHasData,
        Self::ReadyToConsumer,
        Self::ConsumerGuard,
    ];

    /// Offset from the base key.
    pub const fn offset(self) -> i32 {
        match self {
            Self::ProducerGuard => -3,
            Self::ReadyToProducer => -2,
            Self::SlotIsFree => -1,
            Self::Finished => 0,
            Self::SlotHasData => 1,
            Self::ReadyToConsumer => 2,
            Self::ConsumerGuard => 3,
        }
    }

    /// Whether increments on this semaphore are undone by the kernel when
    /// the incrementing process dies.
    pub const fn releases_on_exit(self) -> bool {
        matches!(
            self,
            Self::ProducerGuard | Self::ConsumerGuard | Self::ReadyToConsumer | Self::ReadyToProducer
        )
    }
}

impl fmt::Display for SemaphoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProducerGuard => "producer guard",
            Self::ConsumerGuard => "consumer guard",
            Self::ReadyToConsumer => "ready-to-consumer",
            Self::ReadyToProducer => "ready-to-producer",
            Self::SlotHasData => "slot-has-data",
            Self::SlotIsFree => "slot-is-free",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Smallest and largest offsets used around the base key.
pub const MIN_OFFSET: i32 = -3;
/// See [`MIN_OFFSET`].
pub const MAX_OFFSET: i32 = 3;

/// Immutable key set for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelKeys {
    base: i32,
}

impl ChannelKeys {
    /// Build a key set around `base`.
    ///
    /// Returns `None` if any derived key would be `IPC_PRIVATE` (0) or
    /// overflow `i32`.
    pub const fn new(base: i32) -> Option<Self> {
        let Some(low) = base.checked_add(MIN_OFFSET) else {
            return None;
        };
        let Some(high) = base.checked_add(MAX_OFFSET) else {
            return None;
        };
        if low <= 0 && high >= 0 {
            return None;
        }
        Some(Self { base })
    }

    /// The base key.
    pub const fn base(&self) -> i32 {
        self.base
    }

    /// Key of the shared segment.
    pub const fn segment(&self) -> i32 {
        self.base
    }

    /// Key of a semaphore.
    pub const fn semaphore(&self, kind: SemaphoreKind) -> i32 {
        self.base + kind.offset()
    }
}

impl Default for ChannelKeys {
    fn default() -> Self {
        Self {
            base: crate::consts::DEFAULT_BASE_KEY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_cluster_around_0xded() {
        let keys = ChannelKeys::default();
        assert_eq!(keys.segment(), 0xDED);
        assert_eq!(keys.semaphore(SemaphoreKind::Finished), 0xDED);
        assert_eq!(keys.semaphore(SemaphoreKind::SlotHasData), 0xDED + 1);
        assert_eq!(keys.semaphore(SemaphoreKind::ReadyToConsumer), 0xDED + 2);
        assert_eq!(keys.semaphore(SemaphoreKind::ConsumerGuard), 0xDED + 3);
        assert_eq!(keys.semaphore(SemaphoreKind::SlotIsFree), 0xDED - 1);
        assert_eq!(keys.semaphore(SemaphoreKind::ReadyToProducer), 0xDED - 2);
        assert_eq!(keys.semaphore(SemaphoreKind::ProducerGuard), 0xDED - 3);
    }

    #[test]
    fn semaphore_keys_are_unique() {
        let keys = ChannelKeys::default();
        let mut seen: Vec<i32> = SemaphoreKind::ALL.iter().map(|k| keys.semaphore(*k)).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), SemaphoreKind::ALL.len());
    }

    #[test]
    fn rejects_ranges_touching_ipc_private() {
        assert!(ChannelKeys::new(0).is_none());
        assert!(ChannelKeys::new(3).is_none());
        assert!(ChannelKeys::new(-3).is_none());
        assert!(ChannelKeys::new(4).is_some());
        assert!(ChannelKeys::new(-4).is_some());
    }

    #[test]
    fn rejects_overflow() {
        assert!(ChannelKeys::new(i32::MAX).is_none());
        assert!(ChannelKeys::new(i32::MIN).is_none());
        assert!(ChannelKeys::new(i32::MAX - 3).is_some());
    }

    #[test]
    fn roles_mirror_each_other() {
        assert_eq!(Role::Producer.peer(), Role::Consumer);
        assert_eq!(Role::Consumer.peer().guard(), SemaphoreKind::ProducerGuard);
        assert_eq!(Role::Producer.ready_signal(), SemaphoreKind::ReadyToProducer);
        assert_eq!(Role::Consumer.ready_signal(), SemaphoreKind::ReadyToConsumer);
    }

    #[test]
    fn only_bootstrap_semaphores_release_on_exit() {
        assert!(SemaphoreKind::ProducerGuard.releases_on_exit());
        assert!(SemaphoreKind::ReadyToConsumer.releases_on_exit());
        assert!(!SemaphoreKind::SlotHasData.releases_on_exit());
        assert!(!SemaphoreKind::SlotIsFree.releases_on_exit());
        assert!(!SemaphoreKind::Finished.releases_on_exit());
    }
}
