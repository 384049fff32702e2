//! Shared channels between interrupt context and the main loop.
//!
//! Firmware declares one `static` instance, hands `&BusChannels` to the
//! engine and a [`BusHandle`] to the main loop:
//!
//! ```rust,ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use korri_j1708::infra::queue::J1708_MSG_QUEUE_DEPTH;
//! use korri_j1708::protocol::bridge::BusChannels;
//!
//! static CHANNELS: BusChannels<CriticalSectionRawMutex, J1708_MSG_QUEUE_DEPTH, J1708_MSG_QUEUE_DEPTH> =
//!     BusChannels::new();
//! ```
use core::cell::Cell;

use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    signal::Signal,
};

use crate::core::Message;
use crate::infra::queue::MessageQueue;
use crate::protocol::engine::BusState;

//==================================================================================BUS_STATS
/// Counters published by the engine. They only ever grow (wrapping on overflow).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStats {
    /// Valid messages pushed to the inbound queue (own echoes included).
    pub rx_messages: u32,
    /// Closed windows dropped: wrong length or overlapping a collision.
    pub rx_discarded: u32,
    /// Inbound messages lost to queue overflow.
    pub rx_evicted: u32,
    /// Transmissions confirmed by their echo.
    pub tx_messages: u32,
    /// Outbound messages lost to queue overflow.
    pub tx_evicted: u32,
    /// Collisions detected (byte echo or whole-message echo).
    pub collisions: u32,
    /// Messages dropped after exceeding the retry bound.
    pub tx_abandoned: u32,
    /// Bytes the UART reported as fully shifted onto the wire.
    pub tx_bytes: u32,
}

impl BusStats {
    pub const fn new() -> Self {
        Self {
            rx_messages: 0,
            rx_discarded: 0,
            rx_evicted: 0,
            tx_messages: 0,
            tx_evicted: 0,
            collisions: 0,
            tx_abandoned: 0,
            tx_bytes: 0,
        }
    }
}

//==================================================================================BUS_CHANNELS
/// Everything shared between the engine (interrupt side) and the main loop.
///
/// Access discipline: the engine is the only producer of inbound messages,
/// of the state mirror and of the counters; the main loop is the only
/// producer of outbound messages. Every access goes through the raw mutex `M`.
pub struct BusChannels<M: RawMutex, const IN: usize, const OUT: usize> {
    inbound: MessageQueue<M, IN>,
    outbound: MessageQueue<M, OUT>,
    inbound_ready: Signal<M, ()>,
    outbound_ready: Signal<M, ()>,
    state: Mutex<M, Cell<BusState>>,
    stats: Mutex<M, Cell<BusStats>>,
}

impl<M: RawMutex, const IN: usize, const OUT: usize> Default for BusChannels<M, IN, OUT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const IN: usize, const OUT: usize> BusChannels<M, IN, OUT> {
    pub const fn new() -> Self {
        Self {
            inbound: MessageQueue::new(),
            outbound: MessageQueue::new(),
            inbound_ready: Signal::new(),
            outbound_ready: Signal::new(),
            state: Mutex::new(Cell::new(BusState::Idle)),
            stats: Mutex::new(Cell::new(BusStats::new())),
        }
    }

    /// Main-loop view of the channels.
    pub fn handle(&self) -> BusHandle<'_, M, IN, OUT> {
        BusHandle { channels: self }
    }

    /// Last state published by the engine.
    pub fn state(&self) -> BusState {
        self.state.lock(|state| state.get())
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> BusStats {
        self.stats.lock(|stats| stats.get())
    }

    /// Wait until the main loop queues outbound traffic.
    ///
    /// An idle bus raises no interrupt, so firmware runs a small task that
    /// awaits this and then calls
    /// [`BusEngine::poll_outbound`](crate::protocol::engine::BusEngine::poll_outbound)
    /// under the engine lock:
    ///
    /// ```rust,ignore
    /// loop {
    ///     CHANNELS.wait_outbound().await;
    ///     ENGINE.lock(|engine| {
    ///         if let Some(engine) = engine.borrow_mut().as_mut() {
    ///             engine.poll_outbound();
    ///         }
    ///     });
    /// }
    /// ```
    ///
    /// Polling main loops use
    /// [`BusEngine::service_outbound`](crate::protocol::engine::BusEngine::service_outbound)
    /// instead.
    pub async fn wait_outbound(&self) {
        self.outbound_ready.wait().await
    }

    //==================================================================================Engine side
    pub(crate) fn push_inbound(&self, message: Message) {
        let evicted = self.inbound.push(message).is_some();
        self.update_stats(|stats| {
            stats.rx_messages = stats.rx_messages.wrapping_add(1);
            if evicted {
                stats.rx_evicted = stats.rx_evicted.wrapping_add(1);
            }
        });
        self.inbound_ready.signal(());
    }

    pub(crate) fn pop_outbound(&self) -> Option<Message> {
        self.outbound.pop()
    }

    /// Consume a pending outbound notification.
    pub(crate) fn take_outbound_ready(&self) -> bool {
        self.outbound_ready.try_take().is_some()
    }

    pub(crate) fn publish_state(&self, state: BusState) {
        self.state.lock(|cell| cell.set(state));
    }

    pub(crate) fn update_stats(&self, update: impl FnOnce(&mut BusStats)) {
        self.stats.lock(|cell| {
            let mut stats = cell.get();
            update(&mut stats);
            cell.set(stats);
        });
    }
}

//==================================================================================BUS_HANDLE
/// Main-loop side of [`BusChannels`]: read what the bus delivered, queue what
/// the host wants sent.
pub struct BusHandle<'a, M: RawMutex, const IN: usize, const OUT: usize> {
    channels: &'a BusChannels<M, IN, OUT>,
}

impl<M: RawMutex, const IN: usize, const OUT: usize> Clone for BusHandle<'_, M, IN, OUT> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, const IN: usize, const OUT: usize> Copy for BusHandle<'_, M, IN, OUT> {}

impl<'a, M: RawMutex, const IN: usize, const OUT: usize> BusHandle<'a, M, IN, OUT> {
    /// `true` when at least one bus message is waiting.
    pub fn message_available(&self) -> bool {
        !self.channels.inbound.is_empty()
    }

    /// Oldest message received from the bus.
    pub fn read_message(&self) -> Option<Message> {
        self.channels.inbound.pop()
    }

    /// Wait until a bus message is available and return it.
    pub async fn wait_message(&self) -> Message {
        loop {
            if let Some(message) = self.channels.inbound.pop() {
                return message;
            }
            self.channels.inbound_ready.wait().await;
        }
    }

    /// Queue `message` for transmission. Never blocks: when the outbound
    /// queue is full its oldest entry is dropped.
    ///
    /// Raises the outbound notification so an idle engine is kicked through
    /// [`BusChannels::wait_outbound`] or
    /// [`BusEngine::service_outbound`](crate::protocol::engine::BusEngine::service_outbound).
    pub fn write_message(&self, message: Message) {
        if self.channels.outbound.push(message).is_some() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Outbound queue full, oldest message dropped");
            self.channels
                .update_stats(|stats| stats.tx_evicted = stats.tx_evicted.wrapping_add(1));
        }
        self.channels.outbound_ready.signal(());
    }

    /// Messages waiting to be transmitted.
    pub fn pending_outbound(&self) -> usize {
        self.channels.outbound.len()
    }

    pub fn state(&self) -> BusState {
        self.channels.state()
    }

    pub fn stats(&self) -> BusStats {
        self.channels.stats()
    }
}
