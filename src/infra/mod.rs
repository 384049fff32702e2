//! Infrastructure shared by the protocol layer: the bounded message queue
//! crossing the interrupt/main-loop boundary, and the host framing codec.
pub mod codec;
pub mod queue;
