//! Boundary between the interrupt-driven bus engine and the main loop.
//!
//! * [`BusChannels`] is the only state the two sides share: one queue per
//!   direction, a signal raised on inbound traffic, and read-only mirrors of
//!   the engine state and counters.
//! * [`BusHandle`] is the main-loop view used to read and write messages.
//! * [`HostBridge`] moves messages between the channels and a [`HostLink`]
//!   using the `$…*` hex framing.
//!
//! [`HostLink`]: crate::protocol::transport::traits::host_link::HostLink

mod channels;
mod host;

pub use channels::{BusChannels, BusHandle, BusStats};
pub use host::HostBridge;
