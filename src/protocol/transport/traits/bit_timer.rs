//! One-shot countdown timer counting fractions of a bit-time.
//!
//! Two independent instances drive the engine: one closes messages after
//! [`EOM_TICKS`](crate::protocol::transport::EOM_TICKS) of silence, the other
//! times the collision backoff. The backend's timer interrupt calls
//! [`BusEngine::on_eom_timer`](crate::protocol::engine::BusEngine::on_eom_timer)
//! or [`BusEngine::on_collision_timer`](crate::protocol::engine::BusEngine::on_collision_timer).
//!
//! Contract:
//! - one fire per countdown that runs to completion;
//! - `restart` cancels the pending fire and schedules a fresh one `ticks`
//!   ticks later;
//! - `stop` cancels the pending fire, nothing is invoked;
//! - fires of the same timer are never reordered or coalesced.

/// Contract called from interrupt context; implementations must not block.
pub trait BitTimer {
    /// Count at `tick_hz` and fire once after `ticks` ticks. Does not start
    /// the countdown; a running countdown keeps its deadline until the next
    /// `restart`.
    fn configure(&mut self, tick_hz: u32, ticks: u32);
    /// Reset the count to zero and start counting.
    fn restart(&mut self);
    /// Cancel a pending fire. The engine stops both timers on
    /// [`BusEngine::reset`](crate::protocol::engine::BusEngine::reset).
    fn stop(&mut self);
}

impl<T: BitTimer + ?Sized> BitTimer for &mut T {
    fn configure(&mut self, tick_hz: u32, ticks: u32) {
        (**self).configure(tick_hz, ticks)
    }

    fn restart(&mut self) {
        (**self).restart()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
