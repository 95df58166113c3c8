//! Common re-exports.
//!
//! ```rust
//! use shmlink_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ChannelConfig, ConfigError, ConfigLoader, LinkConfig, LogLevel};

// ─── Protocol Constants ─────────────────────────────────────────────
pub use crate::consts::{PAYLOAD_CAPACITY, SEGMENT_SIZE};

// ─── Keys ───────────────────────────────────────────────────────────
pub use crate::keys::{ChannelKeys, Role, SemaphoreKind};
