//! The shared slot.
//!
//! A 64-byte System V segment holding one `control` word and up to 56
//! payload bytes. There is no lock on the memory: the turn semaphores
//! guarantee only one side touches it at a time, and every semaphore
//! operation is a syscall, which orders the accesses across processes.

use crate::control::Control;
use crate::error::{LinkError, LinkResult};
use crate::platform;
use shmlink_common::consts::{PAYLOAD_CAPACITY, SEGMENT_SIZE};
use shmlink_common::keys::ChannelKeys;
use static_assertions::const_assert_eq;
use std::ptr::{NonNull, addr_of, addr_of_mut};
use std::sync::atomic::{Ordering, fence};
use tracing::{debug, warn};

/// Bit-exact segment layout.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SlotLayout {
    /// Sentinel, payload length or end of stream (native byte order).
    pub control: i64,
    /// Chunk bytes; only the first `control` are meaningful.
    pub payload: [u8; PAYLOAD_CAPACITY],
}

const_assert_eq!(core::mem::size_of::<SlotLayout>(), SEGMENT_SIZE);
const_assert_eq!(core::mem::offset_of!(SlotLayout, payload), 8);

/// An attached segment. Detached on drop, never removed.
pub struct Segment {
    key: i32,
    id: i32,
    slot: NonNull<SlotLayout>,
}

impl Segment {
    /// Get or create the segment keyed by `keys` and attach it.
    pub fn attach(keys: &ChannelKeys) -> LinkResult<Self> {
        let key = keys.segment();
        let id = platform::shm_get(key, SEGMENT_SIZE)
            .map_err(|e| LinkError::sys("shmget", format!("segment {key:#x}"), e))?;
        let addr = platform::shm_attach(id)
            .map_err(|e| LinkError::sys("shmat", format!("segment {key:#x}"), e))?;
        debug!("Attached segment key={:#x} id={} at {:p}", key, id, addr);

        Ok(Self {
            key,
            id,
            slot: addr.cast::<SlotLayout>(),
        })
    }

    /// Kernel id of the segment.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Read and decode `control`.
    pub fn read_control(&self) -> Control {
        fence(Ordering::Acquire);
        let raw = unsafe { addr_of!((*self.slot.as_ptr()).control).read_volatile() };
        Control::decode(raw)
    }

    /// Encode and write `control`.
    pub fn write_control(&mut self, control: Control) {
        unsafe { addr_of_mut!((*self.slot.as_ptr()).control).write_volatile(control.encode()) };
        fence(Ordering::Release);
    }

    /// Copy the first `buf.len()` payload bytes out of the slot.
    pub fn read_payload(&self, buf: &mut [u8]) {
        assert!(buf.len() <= PAYLOAD_CAPACITY);
        fence(Ordering::Acquire);
        unsafe {
            let src = addr_of!((*self.slot.as_ptr()).payload).cast::<u8>();
            std::ptr::copy_nonoverlapping(src, buf.as_mut_ptr(), buf.len());
        }
    }

    /// Copy `data` into the start of the payload.
    pub fn write_payload(&mut self, data: &[u8]) {
        assert!(data.len() <= PAYLOAD_CAPACITY);
        unsafe {
            let dst = addr_of_mut!((*self.slot.as_ptr()).payload).cast::<u8>();
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
        fence(Ordering::Release);
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        if let Err(e) = unsafe { platform::shm_detach(self.slot.cast::<u8>()) } {
            warn!("shmdt failed on segment {:#x}: {}", self.key, e);
        }
    }
}
