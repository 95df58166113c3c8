//! Shared helpers: per-test key sets that never collide with the default
//! base key or with other test binaries, removed again on drop.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shmlink_common::config::ChannelConfig;
use shmlink_common::keys::ChannelKeys;
use shmlink_transport::remove_resources;
use std::io::{self, Write};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

pub const GENEROUS: Duration = Duration::from_secs(5);

/// A private key set for one test.
pub struct TestKeys {
    keys: ChannelKeys,
}

impl TestKeys {
    pub fn new() -> Self {
        static NEXT: AtomicI32 = AtomicI32::new(0);
        let slot = NEXT.fetch_add(1, Ordering::SeqCst);
        let pid = (std::process::id() & 0xFFFF) as i32;
        let base = 0x3000_0000 + (pid << 12) + slot * 8 + 4;
        let keys = ChannelKeys::new(base).expect("test base key");
        remove_resources(&keys).expect("remove stale resources");
        Self { keys }
    }

    pub fn keys(&self) -> ChannelKeys {
        self.keys
    }

    pub fn config(&self, timeout: Duration) -> ChannelConfig {
        ChannelConfig::with_timeout(self.keys.base(), timeout)
    }
}

impl Drop for TestKeys {
    fn drop(&mut self) {
        let _ = remove_resources(&self.keys);
    }
}

/// Sink remembering the size of every write call.
#[derive(Default)]
pub struct ChunkRecorder {
    pub data: Vec<u8>,
    pub writes: Vec<usize>,
    pub flushed: bool,
}

impl Write for ChunkRecorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        self.writes.push(buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushed = true;
        Ok(())
    }
}

/// Deterministic pseudo-random payload.
pub fn payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}
