//! Bounded message queue shared between interrupt context and the main loop.
//!
//! One queue carries bus traffic to the host (UART interrupt produces, main
//! loop consumes), another carries host traffic to the bus (main loop
//! produces, UART interrupt consumes). A producer is never blocked and never
//! sees an error: pushing into a full queue evicts the oldest entry first.
//!
//! Every operation runs inside the raw mutex `M`. On hardware that is
//! [`CriticalSectionRawMutex`](embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex),
//! so the interrupt and the main loop can never observe a half-updated ring.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use heapless::Deque;

use crate::core::Message;

/// Default queue depth used by the firmware for both directions.
pub const J1708_MSG_QUEUE_DEPTH: usize = 64;

/// Fixed-capacity FIFO of [`Message`]s with overwrite-oldest semantics.
pub struct MessageQueue<M: RawMutex, const N: usize> {
    ring: Mutex<M, RefCell<Deque<Message, N>>>,
}

impl<M: RawMutex, const N: usize> Default for MessageQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> MessageQueue<M, N> {
    /// Empty queue; `const` so it can be placed in a `static`.
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Append `msg`. When the queue is full the oldest entry is evicted first
    /// and handed back so the caller may account for the loss.
    pub fn push(&self, msg: Message) -> Option<Message> {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            let evicted = if ring.is_full() {
                ring.pop_front()
            } else {
                None
            };
            // Only fails for a zero-capacity queue, where the message is lost.
            let _ = ring.push_back(msg);
            evicted
        })
    }

    /// Remove and return the oldest message.
    pub fn pop(&self) -> Option<Message> {
        self.ring.lock(|ring| ring.borrow_mut().pop_front())
    }

    /// Copy of the oldest message, left in place.
    pub fn peek(&self) -> Option<Message> {
        self.ring.lock(|ring| ring.borrow().front().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock(|ring| ring.borrow().is_empty())
    }

    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().len())
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop every queued message.
    pub fn clear(&self) {
        self.ring.lock(|ring| ring.borrow_mut().clear())
    }
}
