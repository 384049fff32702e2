//! `korri-j1708` library: a `no_std` SAE J1708 bus engine. It turns a raw
//! half-duplex 9600 baud UART into a message-framed, collision-aware
//! transport, and bridges those messages to a host link using the `$…*`
//! ASCII hex framing.
#![no_std]
//==================================================================================
/// Core data types: the J1708 `Message` and its size bounds.
pub mod core;
/// Errors for message construction, host framing and the host bridge.
pub mod error;
/// Building blocks: the bounded message queue and the host hex codec.
pub mod infra;
/// J1708 protocol: timing and priority rules, hardware seams, the bus engine
/// and the host bridge.
pub mod protocol;
//==================================================================================
