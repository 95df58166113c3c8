//! # shmlink transport
//!
//! A byte stream between two unrelated processes over one 64-byte System V
//! shared memory segment, coordinated only by System V semaphores.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  SlotHasData   ┌──────────────────┐  SlotHasData   ┌──────────────┐
//! │   Producer   ├───────────────►│  Segment (64 B)  ├───────────────►│   Consumer   │
//! │              │◄───────────────┤ [control|payload]│◄───────────────┤              │
//! └──────┬───────┘   SlotIsFree   └──────────────────┘   SlotIsFree   └──────┬───────┘
//!        │                                                                   │
//!        └────────────── ReadyTo* (handshake) / Finished (shutdown) ─────────┘
//! ```
//!
//! A session runs Bootstrap → Handshake → Transfer → Shutdown on both sides:
//!
//! - [`channel`]: get-or-create every object by key, take the creation guard
//! - [`handshake`]: ready signals plus the sentinel exchange on the slot
//! - [`transfer`]: one chunk of at most 56 bytes per turn
//! - [`shutdown`]: `Finished` rendezvous after end of stream
//!
//! Every blocking wait is bounded; an expired wait is fatal and the session
//! cannot be resumed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shmlink_common::config::ChannelConfig;
//! use shmlink_transport::run_consumer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stats = run_consumer(&ChannelConfig::default(), &mut std::io::stdout().lock())?;
//! eprintln!("received {} bytes", stats.bytes);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust,no_run
//! use shmlink_common::config::ChannelConfig;
//! use shmlink_transport::{ErrorKind, run_producer};
//!
//! let mut source = std::fs::File::open("payload.bin").unwrap();
//! match run_producer(&ChannelConfig::default(), &mut source) {
//!     Ok(stats) => eprintln!("sent {} chunks", stats.chunks),
//!     Err(e) if e.kind() == ErrorKind::Timeout => eprintln!("consumer never answered: {e}"),
//!     Err(e) => eprintln!("transfer failed: {e}"),
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod control;
pub mod error;
pub mod handshake;
pub mod platform;
pub mod segment;
pub mod semaphore;
pub mod session;
pub mod shutdown;
pub mod transfer;

pub use channel::{Channel, remove_resources};
pub use control::{Control, Sentinel};
pub use error::{ErrorKind, LinkError, LinkResult, ProtocolError};
pub use segment::{Segment, SlotLayout};
pub use semaphore::{Lease, Semaphore};
pub use session::{run_consumer, run_producer};
pub use transfer::TransferStats;

/// Logging options shared by both binaries.
#[derive(Debug, Clone, Copy)]
pub struct TracingOptions {
    /// Default level. A bare level in `RUST_LOG` replaces it; target-only
    /// directives in `RUST_LOG` leave it in place for everything else.
    pub level: tracing::Level,
    /// Emit JSON lines instead of text.
    pub json: bool,
}

/// Initialize tracing on stderr. Stdout is reserved for the stream.
pub fn init_tracing(options: TracingOptions) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::builder()
        .with_default_directive(options.level.into())
        .from_env_lossy();
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true);

    if options.json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}
