//! Byte-level access to the half-duplex J1708 UART (9600 8N1, single wire).
//!
//! The engine is written once against this trait; each board provides its
//! own backend. Inbound events travel the other way: the backend's receive
//! and transmit-complete interrupts call
//! [`BusEngine::on_byte_received`](crate::protocol::engine::BusEngine::on_byte_received)
//! and [`BusEngine::on_byte_sent`](crate::protocol::engine::BusEngine::on_byte_sent).
//!
//! The line is half-duplex: every byte handed to [`Transport::send_byte`]
//! is received back as an echo, and the engine relies on that echo.

/// Contract called from interrupt context; implementations must not block.
pub trait Transport {
    /// Load one byte into the transmitter and enable the transmit-complete
    /// interrupt.
    fn send_byte(&mut self, byte: u8);
    /// Stop driving the line: cancel any byte not yet started and disable the
    /// transmit-complete interrupt. Called when a collision is detected.
    fn abort_transmit(&mut self);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_byte(&mut self, byte: u8) {
        (**self).send_byte(byte)
    }

    fn abort_transmit(&mut self) {
        (**self).abort_transmit()
    }
}
