//! Error types for link operations

use shmlink_common::config::ConfigError;
use shmlink_common::keys::SemaphoreKind;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification used for the fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A kernel primitive or local I/O failed.
    System,
    /// A bounded wait expired.
    Timeout,
    /// The peer wrote an unexpected `control` value.
    Protocol,
}

impl ErrorKind {
    /// Prefix for the fatal diagnostic line.
    pub const fn label(self) -> &'static str {
        match self {
            Self::System => "SYSTEM ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Protocol => "PROTOCOL ERROR",
        }
    }
}

/// Peer-behavior faults observed in the `control` word.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Wrong sentinel during the handshake or on the first turn after it.
    #[error("peer did not handshake correctly (expected {expected}, found {found})")]
    BadHandshake {
        /// Raw sentinel that was required
        expected: i64,
        /// Raw value actually read
        found: i64,
    },

    /// Out-of-protocol value in the steady-state loop.
    #[error("peer died (unexpected control word {found})")]
    PeerDied {
        /// Raw value actually read
        found: i64,
    },
}

/// Errors that can occur on either side of the link
#[derive(Error, Debug)]
pub enum LinkError {
    /// A System V primitive failed
    #[error("{call} failed on {resource}: {source}")]
    Sys {
        /// Failing system call
        call: &'static str,
        /// Object the call was made on
        resource: String,
        /// Underlying errno
        #[source]
        source: nix::Error,
    },

    /// A bounded wait expired
    #[error("timed out after {after:?} waiting on {resource}")]
    Timeout {
        /// Semaphore being waited on
        resource: SemaphoreKind,
        /// Configured ceiling
        after: Duration,
    },

    /// The peer broke the protocol
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Byte source or sink failure
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LinkError {
    pub(crate) fn sys(call: &'static str, resource: impl ToString, source: nix::Error) -> Self {
        Self::Sys {
            call,
            resource: resource.to_string(),
            source,
        }
    }

    /// Classification for the diagnostic prefix.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Sys { .. } | Self::Io { .. } | Self::Config(_) => ErrorKind::System,
        }
    }
}

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;
