//! Linux System V semaphore and shared memory calls
//!
//! Thin wrappers returning `nix::Result`; callers attach the resource name
//! when turning them into `LinkError`s.

use nix::errno::Errno;
use nix::unistd::getpid;
use shmlink_common::consts::IPC_MODE;
use std::ptr::NonNull;
use std::time::{Duration, Instant};

/// Build one semaphore operation on semaphore 0 of a set.
pub fn sembuf(op: i16, undo: bool) -> libc::sembuf {
    libc::sembuf {
        sem_num: 0,
        sem_op: op,
        sem_flg: if undo { libc::SEM_UNDO as libc::c_short } else { 0 },
    }
}

/// Get or create a one-semaphore set.
pub fn sem_get(key: libc::key_t) -> nix::Result<i32> {
    let rc = unsafe { libc::semget(key, 1, libc::IPC_CREAT | IPC_MODE) };
    Errno::result(rc)
}

/// Look up an existing set without creating it.
pub fn sem_lookup(key: libc::key_t) -> nix::Result<Option<i32>> {
    let rc = unsafe { libc::semget(key, 0, 0) };
    match Errno::result(rc) {
        Ok(id) => Ok(Some(id)),
        Err(Errno::ENOENT) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Apply `ops` atomically without a deadline. Only used for operations
/// that cannot block (positive increments).
pub fn sem_op(id: i32, ops: &mut [libc::sembuf]) -> nix::Result<()> {
    let rc = unsafe { libc::semop(id, ops.as_mut_ptr(), ops.len()) };
    Errno::result(rc).map(drop)
}

/// Apply `ops` atomically, blocking for at most `timeout`.
///
/// `EINTR` is retried against the original deadline. Expiry surfaces as
/// `Errno::EAGAIN`; a timeout that cannot be represented as a deadline or
/// a `timespec` is `Errno::EINVAL`.
pub fn sem_timed_op(id: i32, ops: &mut [libc::sembuf], timeout: Duration) -> nix::Result<()> {
    let deadline = Instant::now().checked_add(timeout).ok_or(Errno::EINVAL)?;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Errno::EAGAIN);
        }
        let ts = libc::timespec {
            tv_sec: libc::time_t::try_from(remaining.as_secs()).map_err(|_| Errno::EINVAL)?,
            tv_nsec: remaining.subsec_nanos() as libc::c_long,
        };
        let rc = unsafe {
            libc::syscall(
                libc::SYS_semtimedop,
                id,
                ops.as_mut_ptr(),
                ops.len(),
                &ts as *const libc::timespec,
            )
        };
        match Errno::result(rc) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Overwrite the semaphore value (`SETVAL`).
pub fn sem_set_value(id: i32, value: i32) -> nix::Result<()> {
    let rc = unsafe { libc::semctl(id, 0, libc::SETVAL, value) };
    Errno::result(rc).map(drop)
}

/// Read the semaphore value (`GETVAL`).
pub fn sem_get_value(id: i32) -> nix::Result<i32> {
    let rc = unsafe { libc::semctl(id, 0, libc::GETVAL) };
    Errno::result(rc)
}

/// Remove the set (`IPC_RMID`).
pub fn sem_remove(id: i32) -> nix::Result<()> {
    let rc = unsafe { libc::semctl(id, 0, libc::IPC_RMID) };
    Errno::result(rc).map(drop)
}

/// Get or create a shared memory segment of at least `size` bytes.
pub fn shm_get(key: libc::key_t, size: usize) -> nix::Result<i32> {
    let rc = unsafe { libc::shmget(key, size, libc::IPC_CREAT | IPC_MODE) };
    Errno::result(rc)
}

/// Look up an existing segment without creating it.
pub fn shm_lookup(key: libc::key_t) -> nix::Result<Option<i32>> {
    let rc = unsafe { libc::shmget(key, 0, 0) };
    match Errno::result(rc) {
        Ok(id) => Ok(Some(id)),
        Err(Errno::ENOENT) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Attach a segment at a kernel-chosen address.
pub fn shm_attach(id: i32) -> nix::Result<NonNull<u8>> {
    let addr = unsafe { libc::shmat(id, std::ptr::null(), 0) };
    if addr as isize == -1 {
        return Err(Errno::last());
    }
    NonNull::new(addr.cast::<u8>()).ok_or(Errno::EFAULT)
}

/// Detach a segment previously returned by [`shm_attach`].
///
/// # Safety
///
/// `addr` must come from `shm_attach` and must not be used afterwards.
pub unsafe fn shm_detach(addr: NonNull<u8>) -> nix::Result<()> {
    let rc = unsafe { libc::shmdt(addr.as_ptr().cast::<libc::c_void>()) };
    Errno::result(rc).map(drop)
}

/// Mark a segment for removal (`IPC_RMID`). It disappears once the last
/// process detaches.
pub fn shm_remove(id: i32) -> nix::Result<()> {
    let rc = unsafe { libc::shmctl(id, libc::IPC_RMID, std::ptr::null_mut()) };
    Errno::result(rc).map(drop)
}

/// Get current process ID
pub fn current_pid() -> i32 {
    getpid().as_raw()
}
