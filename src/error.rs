//! Error definitions shared across library modules.
//!
//! Bus-side anomalies (malformed windows, collisions, queue overflow) are not
//! errors: the engine drops or retries them and only counts them in
//! [`BusStats`](crate::protocol::bridge::BusStats). The types below cover the
//! places where a caller can act on a failure.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while building a J1708 message.
pub enum MessageError {
    /// J1708 messages carry 2 to 21 bytes.
    #[error("Invalid J1708 message length: {len}")]
    InvalidLength { len: usize },
}

//================================================================================HOST_FRAME_ERROR

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Reasons a host `$…*` frame is rejected by the decoder.
pub enum FrameError {
    /// Frame does not begin with `$`.
    #[error("Missing start delimiter")]
    MissingStart,
    /// Frame does not end with `*`.
    #[error("Missing end delimiter")]
    MissingEnd,
    /// Hex body length is odd: a byte would be split in half.
    #[error("Odd hex body length: {len}")]
    OddLength { len: usize },
    /// Character outside `[0-9A-Fa-f]` in the hex body.
    #[error("Invalid hex digit {digit:#04x} at {position}")]
    InvalidHexDigit { digit: u8, position: usize },
    /// Decoded bytes do not form a valid J1708 message.
    #[error(transparent)]
    Message(#[from] MessageError),
}

//==================================================================================BRIDGE_ERROR
#[derive(Error, Debug)]
/// Errors that stop the host bridge loop.
pub enum BridgeError<E: core::fmt::Debug> {
    /// The host link failed while reading.
    #[error("Host link read error: {0:?}")]
    Read(E),
    /// The host link failed while writing.
    #[error("Host link write error: {0:?}")]
    Write(E),
}
