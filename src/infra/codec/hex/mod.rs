//! Conversion between raw J1708 messages and the host `$…*` hex frames.
//!
//! ```text
//! Message [0x01, 0xAA, 0xBB]  <->  "$01AABB*"
//! ```
//!
//! Encoding always emits uppercase digits; decoding accepts both cases.
use crate::core::{Message, J1708_MSG_MAX_SIZE};
use crate::error::{FrameError, MessageError};
use ::hex::FromHexError;

/// Start-of-frame delimiter on the host link.
pub const HOST_MSG_START: u8 = b'$';
/// End-of-frame delimiter on the host link.
pub const HOST_MSG_END: u8 = b'*';
/// Two hex characters per bus byte plus both delimiters.
pub const HOST_MAX_FRAME_SIZE: usize = J1708_MSG_MAX_SIZE * 2 + 2;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

//==================================================================================HOST_FRAME
/// One encoded host frame, delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostFrame {
    len: usize,
    data: [u8; HOST_MAX_FRAME_SIZE],
}

impl Default for HostFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl HostFrame {
    /// Empty frame buffer.
    pub const fn new() -> Self {
        Self {
            len: 0,
            data: [0; HOST_MAX_FRAME_SIZE],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == HOST_MAX_FRAME_SIZE
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Append one byte; returns `false` once the buffer is full.
    #[inline]
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.data[self.len] = byte;
        self.len += 1;
        true
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl AsRef<[u8]> for HostFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

//==================================================================================ENCODE
/// Encode `msg` as `$` + uppercase hex + `*`.
pub fn encode(msg: &Message) -> HostFrame {
    let mut frame = HostFrame::new();
    frame.push(HOST_MSG_START);
    for byte in msg.as_slice() {
        frame.push(HEX_DIGITS[(byte >> 4) as usize]);
        frame.push(HEX_DIGITS[(byte & 0x0F) as usize]);
    }
    frame.push(HOST_MSG_END);
    frame
}

//==================================================================================DECODE
/// Decode a complete host frame (delimiters included) into a message.
pub fn decode(frame: &[u8]) -> Result<Message, FrameError> {
    let Some((&first, rest)) = frame.split_first() else {
        return Err(FrameError::MissingStart);
    };
    if first != HOST_MSG_START {
        return Err(FrameError::MissingStart);
    }
    let Some((&last, body)) = rest.split_last() else {
        return Err(FrameError::MissingEnd);
    };
    if last != HOST_MSG_END {
        return Err(FrameError::MissingEnd);
    }
    if body.len() % 2 != 0 {
        return Err(FrameError::OddLength { len: body.len() });
    }

    let byte_count = body.len() / 2;
    if byte_count > J1708_MSG_MAX_SIZE {
        return Err(MessageError::InvalidLength { len: byte_count }.into());
    }

    let mut bytes = [0u8; J1708_MSG_MAX_SIZE];
    ::hex::decode_to_slice(body, &mut bytes[..byte_count]).map_err(|err| match err {
        // Positions count from the `$`.
        FromHexError::InvalidHexCharacter { c, index } => FrameError::InvalidHexDigit {
            digit: c as u8,
            position: index + 1,
        },
        _ => FrameError::OddLength { len: body.len() },
    })?;

    Ok(Message::new(&bytes[..byte_count])?)
}
