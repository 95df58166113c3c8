//! shmlink common library
//!
//! Constants, IPC keys and configuration shared by the transport crate
//! and both binaries.
//!
//! # Module Structure
//!
//! - [`consts`] - Segment geometry, sentinels and default timing
//! - [`keys`] - Roles, semaphore kinds and the channel key set
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod keys;
pub mod prelude;
