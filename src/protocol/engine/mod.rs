//! J1708 bus engine: message framing from inter-byte silence, echo-based
//! collision detection, and priority backoff with retry.
//!
//! The engine owns every piece of bus-side state (receive assembly, transmit
//! session, both timers, the UART). It is driven exclusively by four
//! interrupt entry points, which must be bound by the board support code:
//!
//! | Interrupt                 | Method                                   |
//! |---------------------------|------------------------------------------|
//! | UART receive complete     | [`BusEngine::on_byte_received`]          |
//! | UART transmit complete    | [`BusEngine::on_byte_sent`]              |
//! | EOM timer fire            | [`BusEngine::on_eom_timer`]              |
//! | Collision timer fire      | [`BusEngine::on_collision_timer`]        |
//!
//! UART interrupts must have strictly higher priority than both timers; the
//! handlers never nest. Typical firmware keeps the engine in a
//! `Mutex<CriticalSectionRawMutex, RefCell<Option<BusEngine<…>>>>` and
//! borrows it from each handler.
//!
//! The main loop never touches the engine state: it exchanges messages
//! through [`BusChannels`]. An idle bus raises no interrupt, so queued
//! traffic is kicked from the main loop under the same lock: either a task
//! awaiting [`BusChannels::wait_outbound`] then calling
//! [`BusEngine::poll_outbound`], or [`BusEngine::service_outbound`] on every
//! pass of a polling loop.
//!
//! ```text
//!            byte                 EOM (2..=21 bytes -> inbound)
//!   Idle ───────────► Receiving ───────────────────────────► Idle
//!    │ outbound                                               │
//!    ▼                 echo mismatch / bad echo at EOM        │
//!   Transmitting ──────────────────────────────► CollisionWait
//!    ▲  │ EOM, echo == message (-> inbound)            │
//!    │  └──────────────────────────────► Idle          │
//!    └────────────── collision timer ──────────────────┘
//! ```
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::core::{Message, J1708_MSG_MAX_SIZE};
use crate::protocol::bridge::BusChannels;
use crate::protocol::transport::{
    collision_ticks,
    priority::Priority,
    traits::{bit_timer::BitTimer, uart::Transport},
    EOM_TICKS, TIMER_FREQ_HZ,
};

mod config;

pub use config::EngineConfig;

/// One byte of headroom past the longest message, so an overlong window is
/// still seen as overlong.
const RX_ASSEMBLY_SIZE: usize = J1708_MSG_MAX_SIZE + 1;

//==================================================================================Enums and Structs
/// Engine state, mirrored into [`BusChannels`] for the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Bus silent, nothing in flight.
    #[default]
    Idle,
    /// Collecting bytes from another node until the EOM timer fires.
    Receiving,
    /// Sending a message and checking every echoed byte.
    Transmitting,
    /// Collision detected; waiting out the priority backoff before retrying.
    CollisionWait,
}

/// Bytes heard since the last EOM fire.
#[derive(Debug, Clone, Copy)]
struct ReceiveAssembly {
    buffer: [u8; RX_ASSEMBLY_SIZE],
    count: usize,
    /// Set when the window overlapped a collision; such a window is never
    /// turned into a message.
    tainted: bool,
}

impl ReceiveAssembly {
    const fn new() -> Self {
        Self {
            buffer: [0; RX_ASSEMBLY_SIZE],
            count: 0,
            tainted: false,
        }
    }

    /// Store `byte`; past the buffer only the count keeps growing.
    fn push(&mut self, byte: u8) {
        if self.count < RX_ASSEMBLY_SIZE {
            self.buffer[self.count] = byte;
        }
        self.count = self.count.saturating_add(1);
    }

    fn len(&self) -> usize {
        self.count
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.count.min(RX_ASSEMBLY_SIZE)]
    }

    /// Empty the window and hand back what it held.
    fn take(&mut self) -> Self {
        core::mem::replace(self, Self::new())
    }
}

/// Message currently owned by the transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitSession {
    /// Message being sent; never modified across retries.
    pub message: Message,
    /// Index of the next byte to hand to the UART.
    pub cursor: usize,
    /// Bytes of this attempt the UART reported as fully shifted onto the
    /// wire; the running total is [`BusStats::tx_bytes`](crate::protocol::bridge::BusStats::tx_bytes).
    pub(crate) on_wire: usize,
    /// Collisions suffered by this message so far.
    pub retries: u32,
}

impl TransmitSession {
    const fn new(message: Message) -> Self {
        Self {
            message,
            cursor: 0,
            on_wire: 0,
            retries: 0,
        }
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.on_wire = 0;
    }
}

//==================================================================================BUS_ENGINE
/// Interrupt-driven J1708 state machine.
///
/// * `T` – half-duplex UART backend
/// * `E` – end-of-message timer
/// * `C` – collision backoff timer
/// * `M`, `IN`, `OUT` – raw mutex and depths of the shared queues
pub struct BusEngine<'a, T, E, C, M, const IN: usize, const OUT: usize>
where
    T: Transport,
    E: BitTimer,
    C: BitTimer,
    M: RawMutex,
{
    transport: T,
    eom_timer: E,
    collision_timer: C,
    channels: &'a BusChannels<M, IN, OUT>,
    config: EngineConfig,
    state: BusState,
    rx: ReceiveAssembly,
    tx: Option<TransmitSession>,
}

impl<'a, T, E, C, M, const IN: usize, const OUT: usize> BusEngine<'a, T, E, C, M, IN, OUT>
where
    T: Transport,
    E: BitTimer,
    C: BitTimer,
    M: RawMutex,
{
    /// Take ownership of the hardware, configure both timers and start idle.
    pub fn new(
        transport: T,
        mut eom_timer: E,
        mut collision_timer: C,
        channels: &'a BusChannels<M, IN, OUT>,
        config: EngineConfig,
    ) -> Self {
        eom_timer.configure(TIMER_FREQ_HZ, EOM_TICKS);
        collision_timer.configure(TIMER_FREQ_HZ, collision_ticks(Priority::LOWEST));
        channels.publish_state(BusState::Idle);

        Self {
            transport,
            eom_timer,
            collision_timer,
            channels,
            config,
            state: BusState::Idle,
            rx: ReceiveAssembly::new(),
            tx: None,
        }
    }

    pub fn state(&self) -> BusState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Message in flight or waiting to be retried, if any.
    pub fn transmit_session(&self) -> Option<&TransmitSession> {
        self.tx.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn eom_timer(&self) -> &E {
        &self.eom_timer
    }

    pub fn collision_timer(&self) -> &C {
        &self.collision_timer
    }

    //==================================================================================Interrupt entry points
    /// UART receive-complete interrupt.
    ///
    /// Every byte is buffered and restarts the EOM timer. While transmitting,
    /// the byte is our own echo and is compared with what was sent.
    pub fn on_byte_received(&mut self, byte: u8) {
        self.rx.push(byte);
        self.eom_timer.restart();

        match self.state {
            BusState::Idle => self.set_state(BusState::Receiving),
            BusState::Receiving => {}
            BusState::Transmitting => self.check_echo(byte),
            // Backoff counts from bus silence: any traffic pushes it out.
            BusState::CollisionWait => self.collision_timer.restart(),
        }
    }

    /// UART transmit-complete interrupt.
    pub fn on_byte_sent(&mut self) {
        if self.state != BusState::Transmitting {
            return;
        }
        if let Some(session) = self.tx.as_mut() {
            if session.on_wire < session.cursor {
                session.on_wire += 1;
                self.channels
                    .update_stats(|stats| stats.tx_bytes = stats.tx_bytes.wrapping_add(1));
            }
        }
    }

    /// EOM timer fire: the bus has been silent for [`EOM_TICKS`].
    pub fn on_eom_timer(&mut self) {
        let window = self.rx.take();

        match self.state {
            BusState::Idle => {}
            BusState::Receiving => {
                self.deliver(&window);
                self.set_state(BusState::Idle);
                self.start_next_transmission();
            }
            BusState::Transmitting => self.confirm_transmission(&window),
            // Traffic from other nodes while backing off; tainted windows are dropped.
            BusState::CollisionWait => self.deliver(&window),
        }
    }

    /// Collision timer fire: the backoff has elapsed.
    pub fn on_collision_timer(&mut self) {
        if self.state != BusState::CollisionWait {
            return;
        }
        if !self.rx.is_empty() {
            // Bus still busy: wait for a full silent backoff.
            self.collision_timer.restart();
            return;
        }

        if self.tx.is_some() {
            #[cfg(feature = "defmt")]
            defmt::debug!("Backoff elapsed, retransmitting from byte 0");
            self.begin_transmission();
        } else {
            self.set_state(BusState::Idle);
            self.start_next_transmission();
        }
    }

    //==================================================================================Main loop entry point
    /// Start sending the next outbound message if the bus is idle.
    ///
    /// Returns `true` when a transmission was started.
    pub fn poll_outbound(&mut self) -> bool {
        self.start_next_transmission()
    }

    /// Polling main-loop variant of [`poll_outbound`](Self::poll_outbound):
    /// only acts when traffic was queued since the last call.
    ///
    /// A notification consumed while the bus is busy is not lost: the engine
    /// drains the outbound queue itself at every return to idle.
    pub fn service_outbound(&mut self) -> bool {
        self.channels.take_outbound_ready() && self.start_next_transmission()
    }

    /// Drop everything in flight and return to idle: both timers stopped,
    /// transmitter released, partial window and current message discarded.
    /// Queued traffic is kept.
    ///
    /// For board code re-initialising the UART or recovering from a line fault.
    pub fn reset(&mut self) {
        self.eom_timer.stop();
        self.collision_timer.stop();
        self.transport.abort_transmit();
        self.rx = ReceiveAssembly::new();
        if self.tx.take().is_some() {
            #[cfg(feature = "defmt")]
            defmt::info!("Engine reset, message in flight dropped");
            self.channels.update_stats(|stats| {
                stats.tx_abandoned = stats.tx_abandoned.wrapping_add(1);
            });
        }
        self.set_state(BusState::Idle);
    }

    //==================================================================================Internals
    fn set_state(&mut self, state: BusState) {
        self.state = state;
        self.channels.publish_state(state);
    }

    fn check_echo(&mut self, byte: u8) {
        let echo_index = self.rx.len() - 1;
        let Some(session) = self.tx.as_mut() else {
            self.set_state(BusState::Receiving);
            return;
        };

        let expected = if echo_index < session.cursor {
            session.message.as_slice().get(echo_index).copied()
        } else {
            // Byte we never sent: another node is talking.
            None
        };

        if expected == Some(byte) {
            if session.cursor < session.message.len() {
                let next = session.message.as_slice()[session.cursor];
                session.cursor += 1;
                self.transport.send_byte(next);
            }
            // Last byte echoed: the EOM fire confirms the whole message.
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Collision at byte {}: sent {}, heard {:#x}",
                echo_index,
                expected,
                byte
            );
            self.rx.tainted = true;
            self.enter_collision_wait();
        }
    }

    fn confirm_transmission(&mut self, window: &ReceiveAssembly) {
        let Some(session) = self.tx else {
            self.deliver(window);
            self.set_state(BusState::Idle);
            self.start_next_transmission();
            return;
        };

        let fully_sent = session.cursor == session.message.len();
        let echo_matches = !window.tainted
            && window.len() == session.message.len()
            && window.as_slice() == session.message.as_slice();

        if fully_sent && echo_matches {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "Transmission of MID {:#x} confirmed after {} retries",
                session.message.mid(),
                session.retries
            );
            self.tx = None;
            self.channels
                .update_stats(|stats| stats.tx_messages = stats.tx_messages.wrapping_add(1));
            self.deliver(window);
            self.set_state(BusState::Idle);
            self.start_next_transmission();
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Echo mismatch at EOM: {} of {} bytes heard",
                window.len(),
                session.message.len()
            );
            if !window.is_empty() {
                self.channels
                    .update_stats(|stats| stats.rx_discarded = stats.rx_discarded.wrapping_add(1));
            }
            self.enter_collision_wait();
        }
    }

    /// Abort the transmission, rewind it and arm the priority backoff.
    fn enter_collision_wait(&mut self) {
        self.transport.abort_transmit();
        self.channels
            .update_stats(|stats| stats.collisions = stats.collisions.wrapping_add(1));

        let mut priority = Priority::LOWEST;
        if let Some(session) = self.tx.as_mut() {
            session.rewind();
            session.retries = session.retries.saturating_add(1);
            priority = self.config.priority.priority_of(&session.message);

            if let Some(max_retries) = self.config.max_retries {
                if session.retries > max_retries {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "Dropping MID {:#x} after {} collisions",
                        session.message.mid(),
                        session.retries
                    );
                    self.tx = None;
                    self.channels.update_stats(|stats| {
                        stats.tx_abandoned = stats.tx_abandoned.wrapping_add(1);
                    });
                }
            }
        }

        self.collision_timer
            .configure(TIMER_FREQ_HZ, collision_ticks(priority));
        self.collision_timer.restart();
        self.set_state(BusState::CollisionWait);
    }

    /// Push a closed window to the inbound queue when it forms a valid message.
    fn deliver(&mut self, window: &ReceiveAssembly) {
        if window.is_empty() {
            return;
        }
        if window.tainted {
            self.channels
                .update_stats(|stats| stats.rx_discarded = stats.rx_discarded.wrapping_add(1));
            return;
        }

        match Message::new(window.as_slice()) {
            Ok(message) if window.len() <= J1708_MSG_MAX_SIZE => {
                #[cfg(feature = "defmt")]
                defmt::trace!("Received {} bytes from MID {:#x}", message.len(), message.mid());
                self.channels.push_inbound(message);
            }
            _ => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Discarding {} byte window", window.len());
                self.channels
                    .update_stats(|stats| stats.rx_discarded = stats.rx_discarded.wrapping_add(1));
            }
        }
    }

    fn start_next_transmission(&mut self) -> bool {
        if self.state != BusState::Idle || self.tx.is_some() || !self.rx.is_empty() {
            return false;
        }
        let Some(message) = self.channels.pop_outbound() else {
            return false;
        };

        self.tx = Some(TransmitSession::new(message));
        self.begin_transmission();
        true
    }

    /// Send byte 0 of the current session; the echo drives the rest.
    ///
    /// The EOM timer is armed as well, so a byte that never echoes back ends
    /// the attempt like a collision instead of stalling the transmitter.
    fn begin_transmission(&mut self) {
        let Some(session) = self.tx.as_mut() else {
            return;
        };
        session.rewind();
        let first = session.message.as_slice()[0];
        session.cursor = 1;
        self.transport.send_byte(first);
        self.eom_timer.restart();
        self.set_state(BusState::Transmitting);
    }
}
