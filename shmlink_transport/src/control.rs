//! The `control` word.
//!
//! The first eight bytes of the segment carry either a handshake sentinel
//! or a payload length. Protocol code only ever sees [`Control`]; the raw
//! `i64` exists at the segment boundary alone.

use shmlink_common::consts::{
    CONSUMER_ACK, CONSUMER_HELLO, END_OF_STREAM, PAYLOAD_CAPACITY, PRODUCER_HELLO,
};
use std::fmt;

/// Reserved negative `control` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Producer opened the handshake.
    ProducerHello,
    /// Consumer answered the handshake.
    ConsumerHello,
    /// Consumer delivered the previous chunk.
    ConsumerAck,
}

impl Sentinel {
    /// Wire value.
    pub const fn raw(self) -> i64 {
        match self {
            Self::ProducerHello => PRODUCER_HELLO,
            Self::ConsumerHello => CONSUMER_HELLO,
            Self::ConsumerAck => CONSUMER_ACK,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.raw())
    }
}

/// Decoded `control` word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Handshake or acknowledgement marker.
    Sentinel(Sentinel),
    /// `1..=PAYLOAD_CAPACITY` payload bytes follow.
    Length(u32),
    /// Byte source exhausted.
    EndOfStream,
    /// Anything else; always fatal to the reader.
    Invalid(i64),
}

impl Control {
    /// Decode a raw `control` value.
    pub const fn decode(raw: i64) -> Self {
        match raw {
            END_OF_STREAM => Self::EndOfStream,
            PRODUCER_HELLO => Self::Sentinel(Sentinel::ProducerHello),
            CONSUMER_HELLO => Self::Sentinel(Sentinel::ConsumerHello),
            CONSUMER_ACK => Self::Sentinel(Sentinel::ConsumerAck),
            n if n > 0 && n <= PAYLOAD_CAPACITY as i64 => Self::Length(n as u32),
            other => Self::Invalid(other),
        }
    }

    /// Encode for the wire.
    pub const fn encode(self) -> i64 {
        match self {
            Self::Sentinel(s) => s.raw(),
            Self::Length(n) => n as i64,
            Self::EndOfStream => END_OF_STREAM,
            Self::Invalid(raw) => raw,
        }
    }

    /// `control` for a chunk of `len` bytes, `EndOfStream` for zero.
    ///
    /// `len` must not exceed [`PAYLOAD_CAPACITY`].
    pub fn for_chunk(len: usize) -> Self {
        debug_assert!(len <= PAYLOAD_CAPACITY);
        match len {
            0 => Self::EndOfStream,
            n => Self::Length(n as u32),
        }
    }
}
