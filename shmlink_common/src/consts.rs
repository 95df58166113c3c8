//! Protocol-wide constants.
//!
//! Single source of truth for segment geometry, sentinel values and
//! default timing. Both roles import from here; nothing is negotiated
//! at runtime.

use static_assertions::const_assert_eq;

/// Total size of the shared segment in bytes.
pub const SEGMENT_SIZE: usize = 64;

/// Size of the leading `control` word (signed 64-bit, native byte order).
pub const CONTROL_SIZE: usize = core::mem::size_of::<i64>();

/// Usable payload bytes per transfer turn.
pub const PAYLOAD_CAPACITY: usize = SEGMENT_SIZE - CONTROL_SIZE;

const_assert_eq!(PAYLOAD_CAPACITY, 56);

/// Default base key. Every semaphore and the segment sit at fixed
/// offsets around it.
pub const DEFAULT_BASE_KEY: i32 = 0xDED;

/// Default ceiling for every blocking semaphore operation, in seconds.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 60;

/// Largest accepted wait ceiling, in seconds (one day).
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// `control` value written by the producer to open the handshake.
pub const PRODUCER_HELLO: i64 = -1;

/// `control` value written by the consumer to answer the handshake.
pub const CONSUMER_HELLO: i64 = -2;

/// `control` value written by the consumer after each delivered chunk.
pub const CONSUMER_ACK: i64 = -3;

/// `control` value meaning the producer's source is exhausted.
pub const END_OF_STREAM: i64 = 0;

/// Permission bits for every IPC object (owner read/write).
pub const IPC_MODE: i32 = 0o600;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_fills_rest_of_segment() {
        assert_eq!(CONTROL_SIZE + PAYLOAD_CAPACITY, SEGMENT_SIZE);
        assert_eq!(CONTROL_SIZE, 8);
    }

    #[test]
    fn sentinels_are_distinct_and_negative() {
        let sentinels = [PRODUCER_HELLO, CONSUMER_HELLO, CONSUMER_ACK];
        for (i, a) in sentinels.iter().enumerate() {
            assert!(*a < END_OF_STREAM);
            for b in &sentinels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn default_timeout_is_one_minute() {
        assert_eq!(DEFAULT_WAIT_TIMEOUT_SECS, 60);
        assert!(DEFAULT_WAIT_TIMEOUT_SECS <= MAX_WAIT_TIMEOUT_SECS);
    }
}
