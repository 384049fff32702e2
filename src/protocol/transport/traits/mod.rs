//! Abstraction traits used by the transport layer (bus UART, bit timers,
//! host link).
pub mod bit_timer;
pub mod host_link;
pub mod uart;
