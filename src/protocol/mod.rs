//! J1708 protocol components: bus timing and priority rules with their
//! hardware seams, the interrupt-driven bus engine, and the host bridge.
pub mod bridge;
pub mod engine;
pub mod transport;
