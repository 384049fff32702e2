//! Host stream accumulator: slices the raw byte stream coming from the host
//! link into complete `$…*` frames.
//!
//! Bytes outside a frame are noise and are ignored. A `$` seen in the middle
//! of a frame restarts it; a frame that outgrows
//! [`HOST_MAX_FRAME_SIZE`](super::hex::HOST_MAX_FRAME_SIZE) is
//! abandoned and the accumulator waits for the next `$`.
use super::hex::{HostFrame, HOST_MSG_END, HOST_MSG_START};

//==================================================================================Enums and Structs
#[derive(Debug, PartialEq, Eq)]
pub enum AccumulateResult {
    /// Byte outside a frame, or the frame it belonged to was dropped.
    Ignored,
    /// Byte stored, frame still open.
    Consumed,
    /// End delimiter reached: the complete frame, delimiters included.
    FrameComplete(HostFrame),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum AccumulatorState {
    Hunting,
    InFrame,
}

/// Stateful splitter fed one byte at a time.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    state: AccumulatorState,
    frame: HostFrame,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAccumulator {
    pub const fn new() -> Self {
        Self {
            state: AccumulatorState::Hunting,
            frame: HostFrame::new(),
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = AccumulatorState::Hunting;
        self.frame.clear();
    }

    //==================================================================================Process Functions
    pub fn process_byte(&mut self, byte: u8) -> AccumulateResult {
        if byte == HOST_MSG_START {
            self.frame.clear();
            self.frame.push(byte);
            self.state = AccumulatorState::InFrame;
            return AccumulateResult::Consumed;
        }

        if self.state == AccumulatorState::Hunting {
            return AccumulateResult::Ignored;
        }

        if !self.frame.push(byte) {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Host frame exceeds {} bytes, dropping",
                super::hex::HOST_MAX_FRAME_SIZE
            );
            self.reset();
            return AccumulateResult::Ignored;
        }

        if byte == HOST_MSG_END {
            let complete = self.frame;
            self.reset();
            return AccumulateResult::FrameComplete(complete);
        }

        AccumulateResult::Consumed
    }
}
