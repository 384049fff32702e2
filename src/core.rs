//! The J1708 message: the unit moved between the bus engine, the queues and
//! the host bridge.
//!
//! A message holds 2 to 21 bytes. Byte 0 is the Message Identifier (MID).
//! Anything outside those bounds is refused at construction, so a queued
//! `Message` is always valid.
use crate::error::MessageError;

/// Shortest valid J1708 message (MID + one byte).
pub const J1708_MSG_MIN_SIZE: usize = 2;
/// Longest valid J1708 message, per SAE J1708.
pub const J1708_MSG_MAX_SIZE: usize = 21;

//==================================================================================MESSAGE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    len: usize,
    data: [u8; J1708_MSG_MAX_SIZE],
}

impl Message {
    /// Copy `bytes` into a new message.
    ///
    /// Fails with [`MessageError::InvalidLength`] when the slice is shorter
    /// than [`J1708_MSG_MIN_SIZE`] or longer than [`J1708_MSG_MAX_SIZE`].
    pub fn new(bytes: &[u8]) -> Result<Self, MessageError> {
        if !(J1708_MSG_MIN_SIZE..=J1708_MSG_MAX_SIZE).contains(&bytes.len()) {
            return Err(MessageError::InvalidLength { len: bytes.len() });
        }
        let mut data = [0u8; J1708_MSG_MAX_SIZE];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            len: bytes.len(),
            data,
        })
    }

    /// Build a message from `payload` (MID first) and append its J1708 checksum.
    ///
    /// `payload` may hold 1 to 20 bytes.
    pub fn with_checksum(payload: &[u8]) -> Result<Self, MessageError> {
        if payload.is_empty() || payload.len() >= J1708_MSG_MAX_SIZE {
            return Err(MessageError::InvalidLength {
                len: payload.len() + 1,
            });
        }
        let mut data = [0u8; J1708_MSG_MAX_SIZE];
        data[..payload.len()].copy_from_slice(payload);
        data[payload.len()] = checksum_of(payload);
        Self::new(&data[..payload.len() + 1])
    }

    /// Message Identifier (first byte).
    #[inline]
    pub fn mid(&self) -> u8 {
        self.data[0]
    }

    /// Number of bytes in the message.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a message carries at least two bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// `true` when the last byte is the checksum of the preceding ones,
    /// i.e. every byte sums to zero modulo 256.
    pub fn has_valid_checksum(&self) -> bool {
        self.as_slice()
            .iter()
            .fold(0u8, |acc, byte| acc.wrapping_add(*byte))
            == 0
    }
}

impl TryFrom<&[u8]> for Message {
    type Error = MessageError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

//==================================================================================CHECKSUM
/// J1708 checksum: two's complement of the byte sum, modulo 256.
pub fn checksum_of(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte))
        .wrapping_neg()
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;
