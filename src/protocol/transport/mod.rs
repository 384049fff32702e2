//! J1708 transport layer: line settings, bit-time arithmetic, message
//! priority, and the hardware abstraction traits.
//!
//! ## J1708 Timing Constants
//!
//! J1708 has no framing bytes: a message ends when the line has been idle
//! long enough. Both the end-of-message (EOM) window and the collision
//! backoff are expressed in *bit-times* (~104 µs at 9600 baud) and counted by
//! a [`BitTimer`](traits::bit_timer::BitTimer) running at [`TIMER_FREQ_HZ`].
use embassy_time::Duration;

pub mod priority;
pub mod traits;

use priority::Priority;

/// SAE J1708 line rate: 9600 baud, 8 data bits, no parity, 1 stop bit.
pub const J1708_BAUD: u32 = 9600;

/// Tick rate the bit timers are configured with.
///
/// 48 kHz gives an exact integer number of ticks per bit-time and keeps the
/// hardware prescaler within 16 bits on the reference STM32 targets.
pub const TIMER_FREQ_HZ: u32 = 48_000;

/// Timer ticks per bit-time (5 at 48 kHz / 9600 baud).
pub const TICKS_PER_BIT: u32 = TIMER_FREQ_HZ / J1708_BAUD;

/// Bus silence, in bit-times, that marks the end of a message.
///
/// # J1708 Compliance
///
/// - The standard requires at least 10 bit-times of idle between messages.
/// - One extra bit-time is added: measured on hardware, an exact 10 cuts
///   slow transmitters off before their last byte.
pub const EOM_BITS: u32 = 10 + 1;

/// [`EOM_BITS`] expressed in timer ticks.
pub const EOM_TICKS: u32 = EOM_BITS * TICKS_PER_BIT;

/// Backoff after a collision, in bit-times: the EOM window plus two
/// bit-times per priority level.
///
/// Priority 1 waits 13 bit-times, priority 8 waits 27, so a numerically
/// lower (more urgent) message always gets back on the bus first.
pub const fn collision_bits(priority: Priority) -> u32 {
    EOM_BITS + priority.get() as u32 * 2
}

/// [`collision_bits`] expressed in timer ticks.
pub const fn collision_ticks(priority: Priority) -> u32 {
    collision_bits(priority) * TICKS_PER_BIT
}

//==================================================================================DURATIONS
/// Duration of `ticks` timer ticks at [`TIMER_FREQ_HZ`], truncated to the microsecond.
pub const fn ticks_to_duration(ticks: u32) -> Duration {
    Duration::from_micros(ticks as u64 * 1_000_000 / TIMER_FREQ_HZ as u64)
}

/// One bit-time (~104 µs).
pub const fn bit_time() -> Duration {
    ticks_to_duration(TICKS_PER_BIT)
}

/// Silence that closes a message (~1.15 ms).
pub const fn eom_duration() -> Duration {
    ticks_to_duration(EOM_TICKS)
}

/// Collision backoff for `priority` (~1.35 ms for priority 1, ~2.81 ms for priority 8).
pub const fn collision_duration(priority: Priority) -> Duration {
    ticks_to_duration(collision_ticks(priority))
}
