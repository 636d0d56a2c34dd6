//! The circulating token and its wire format.
//!
//! A token travels between workers as a single fixed-size frame:
//!
//! ```text
//! +---------------------------+
//! | counter: u64, big-endian  |   8 bytes
//! +---------------------------+
//! ```
//!
//! Frames of any other length are rejected; reads are atomic per frame.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

/// Size of an encoded token in bytes.
pub const TOKEN_WIRE_SIZE: usize = std::mem::size_of::<u64>();

/// The single mobile counter circulating through the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u64);

impl Token {
    /// The value vertex 0 seeds the ring with.
    pub const SEED: Self = Self(1);

    /// The counter value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The token after one hop.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Encode as a wire frame.
    pub fn encode(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TOKEN_WIRE_SIZE);
        buf.put_u64(self.0);
        buf.freeze()
    }

    /// Decode a wire frame, or `None` if it is not exactly one token long.
    pub fn decode(frame: &[u8]) -> Option<Self> {
        if frame.len() != TOKEN_WIRE_SIZE {
            return None;
        }
        let mut frame = frame;
        Some(Self(frame.get_u64()))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_big_endian() {
        let frame = Token(0x0102).encode();
        assert_eq!(frame.len(), TOKEN_WIRE_SIZE);
        assert_eq!(&frame[..], &[0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(Token::decode(&frame), Some(Token(0x0102)));
    }

    #[test]
    fn short_and_long_frames_rejected() {
        assert_eq!(Token::decode(&[0, 1, 2]), None);
        assert_eq!(Token::decode(&[0; TOKEN_WIRE_SIZE + 1]), None);
        assert_eq!(Token::decode(&[]), None);
    }

    #[test]
    fn next_increments() {
        assert_eq!(Token::SEED.next(), Token(2));
        assert_eq!(Token(u64::MAX).next(), Token(0));
    }
}
