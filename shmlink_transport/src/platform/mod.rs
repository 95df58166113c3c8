//! Platform-specific kernel primitives

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::*;

#[cfg(not(target_os = "linux"))]
compile_error!("shmlink_transport requires Linux System V IPC (semtimedop)");
