/// Test doubles: a tick-accurate simulated J1708 wire shared by several
/// engines, and an in-memory host link.
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use korri_j1708::protocol::{
    bridge::BusChannels,
    engine::{BusEngine, BusState, EngineConfig},
    transport::{
        traits::{bit_timer::BitTimer, host_link::HostLink, uart::Transport},
        TICKS_PER_BIT, TIMER_FREQ_HZ,
    },
};
use tokio::sync::mpsc;

/// Start bit, 8 data bits, stop bit.
pub const BYTE_TICKS: u64 = 10 * TICKS_PER_BIT as u64;

const FOREIGN_SENDER: usize = usize::MAX;

pub type SimChannels = BusChannels<CriticalSectionRawMutex, 16, 16>;
pub type SimEngine<'a> = BusEngine<'a, SimUart, SimTimer, SimTimer, CriticalSectionRawMutex, 16, 16>;

//==================================================================================WIRE
#[derive(Debug, Clone, Copy)]
struct OnAir {
    sender: usize,
    byte: u8,
    start: u64,
    end: u64,
}

#[derive(Default)]
struct WireState {
    now: u64,
    on_air: Vec<OnAir>,
}

impl WireState {
    fn start(&mut self, sender: usize, byte: u8) {
        self.on_air.push(OnAir {
            sender,
            byte,
            start: self.now,
            end: self.now + BYTE_TICKS,
        });
    }

    /// Dominant zeros: overlapping bytes AND together.
    fn resolve(&self, target: &OnAir) -> u8 {
        self.on_air
            .iter()
            .filter(|other| other.start < target.end && other.end > target.start)
            .fold(target.byte, |acc, other| acc & other.byte)
    }
}

type Wire = Rc<RefCell<WireState>>;

//==================================================================================UART / TIMER
/// UART backend driving the simulated wire. Bytes cannot be recalled once
/// started, so `abort_transmit` only counts.
pub struct SimUart {
    id: usize,
    wire: Wire,
    pub aborts: u32,
}

impl Transport for SimUart {
    fn send_byte(&mut self, byte: u8) {
        self.wire.borrow_mut().start(self.id, byte);
    }

    fn abort_transmit(&mut self) {
        self.aborts += 1;
    }
}

/// One-shot timer on the simulated clock.
pub struct SimTimer {
    wire: Wire,
    ticks: u32,
    deadline: Rc<Cell<Option<u64>>>,
}

#[allow(dead_code)]
impl SimTimer {
    fn new(wire: Wire) -> (Self, Rc<Cell<Option<u64>>>) {
        let deadline = Rc::new(Cell::new(None));
        let timer = Self {
            wire,
            ticks: 0,
            deadline: deadline.clone(),
        };
        (timer, deadline)
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl BitTimer for SimTimer {
    fn configure(&mut self, tick_hz: u32, ticks: u32) {
        assert_eq!(tick_hz, TIMER_FREQ_HZ);
        self.ticks = ticks;
    }

    fn restart(&mut self) {
        let now = self.wire.borrow().now;
        self.deadline.set(Some(now + self.ticks as u64));
    }

    fn stop(&mut self) {
        self.deadline.set(None);
    }
}

//==================================================================================BUS
struct SimNode<'a> {
    engine: SimEngine<'a>,
    eom: Rc<Cell<Option<u64>>>,
    collision: Rc<Cell<Option<u64>>>,
}

/// Several engines on one wire, advanced one timer tick at a time.
/// Each tick runs every node's main-loop service first, then UART events,
/// then timer events.
pub struct SimBus<'a> {
    wire: Wire,
    nodes: Vec<SimNode<'a>>,
    foreign: VecDeque<u8>,
}

#[allow(dead_code)]
impl<'a> SimBus<'a> {
    pub fn new() -> Self {
        Self {
            wire: Rc::new(RefCell::new(WireState::default())),
            nodes: Vec::new(),
            foreign: VecDeque::new(),
        }
    }

    /// Attach an engine to the wire and return its node id.
    pub fn add_node(&mut self, channels: &'a SimChannels, config: EngineConfig) -> usize {
        let id = self.nodes.len();
        let uart = SimUart {
            id,
            wire: self.wire.clone(),
            aborts: 0,
        };
        let (eom_timer, eom) = SimTimer::new(self.wire.clone());
        let (collision_timer, collision) = SimTimer::new(self.wire.clone());
        let engine = BusEngine::new(uart, eom_timer, collision_timer, channels, config);
        self.nodes.push(SimNode {
            engine,
            eom,
            collision,
        });
        id
    }

    pub fn engine(&self, id: usize) -> &SimEngine<'a> {
        &self.nodes[id].engine
    }

    /// Main-loop kick after queueing outbound traffic.
    pub fn poll(&mut self, id: usize) -> bool {
        self.nodes[id].engine.poll_outbound()
    }

    pub fn now(&self) -> u64 {
        self.wire.borrow().now
    }

    /// Queue raw bytes from a node without an engine; they go out back to back.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.foreign.extend(bytes.iter().copied());
    }

    pub fn tick(&mut self) {
        for node in self.nodes.iter_mut() {
            node.engine.service_outbound();
        }

        // Bytes completing now, grouped by identical timing.
        let mut completed: Vec<(Vec<usize>, u8)> = Vec::new();
        {
            let mut wire = self.wire.borrow_mut();
            let now = wire.now;
            let mut seen_starts: Vec<u64> = Vec::new();
            for transmission in wire.on_air.iter().filter(|t| t.end == now) {
                if seen_starts.contains(&transmission.start) {
                    continue;
                }
                seen_starts.push(transmission.start);
                let senders = wire
                    .on_air
                    .iter()
                    .filter(|t| t.end == now && t.start == transmission.start)
                    .map(|t| t.sender)
                    .collect();
                completed.push((senders, wire.resolve(transmission)));
            }
            wire.on_air.retain(|t| t.end > now);

            let foreign_busy = wire.on_air.iter().any(|t| t.sender == FOREIGN_SENDER);
            if !foreign_busy {
                if let Some(byte) = self.foreign.pop_front() {
                    wire.start(FOREIGN_SENDER, byte);
                }
            }
        }

        for (senders, byte) in completed {
            for sender in senders {
                if let Some(node) = self.nodes.get_mut(sender) {
                    node.engine.on_byte_sent();
                }
            }
            for node in self.nodes.iter_mut() {
                node.engine.on_byte_received(byte);
            }
        }

        let now = self.now();
        for node in self.nodes.iter_mut() {
            if node.eom.get().is_some_and(|deadline| deadline <= now) {
                node.eom.set(None);
                node.engine.on_eom_timer();
            }
            if node.collision.get().is_some_and(|deadline| deadline <= now) {
                node.collision.set(None);
                node.engine.on_collision_timer();
            }
        }

        self.wire.borrow_mut().now += 1;
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Nothing on the wire, nothing queued to inject, no timer armed.
    pub fn is_quiet(&self) -> bool {
        self.wire.borrow().on_air.is_empty()
            && self.foreign.is_empty()
            && self
                .nodes
                .iter()
                .all(|node| node.eom.get().is_none() && node.collision.get().is_none())
    }

    /// Advance until the bus settles. Returns `false` if `max_ticks` ran out.
    pub fn run_until_quiet(&mut self, max_ticks: u64) -> bool {
        for _ in 0..max_ticks {
            self.tick();
            if self.is_quiet() {
                return true;
            }
        }
        false
    }

    pub fn all_idle(&self) -> bool {
        self.nodes
            .iter()
            .all(|node| node.engine.state() == BusState::Idle)
    }
}

//==================================================================================HOST LINK
/// Device side of an in-memory serial line to the host.
pub struct MockHostLink {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    pending: VecDeque<u8>,
}

/// Host side of the line, driven by the test.
pub struct MockHost {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[allow(dead_code)]
impl MockHostLink {
    /// Construct a pair of interconnected ends (device ↔ host).
    pub fn create_pair() -> (Self, MockHost) {
        let (device_tx, host_rx) = mpsc::unbounded_channel();
        let (host_tx, device_rx) = mpsc::unbounded_channel();

        let link = Self {
            rx: device_rx,
            tx: device_tx,
            pending: VecDeque::new(),
        };
        let host = MockHost {
            tx: host_tx,
            rx: host_rx,
        };
        (link, host)
    }
}

impl HostLink for MockHostLink {
    type Error = ();

    async fn read<'a>(&'a mut self, buf: &'a mut [u8]) -> Result<usize, Self::Error> {
        if self.pending.is_empty() {
            // `recv` is cancel-safe: nothing is lost if the bridge drops us.
            let chunk = self.rx.recv().await.ok_or(())?;
            self.pending.extend(chunk);
        }
        let mut len = 0;
        while len < buf.len() {
            match self.pending.pop_front() {
                Some(byte) => {
                    buf[len] = byte;
                    len += 1;
                }
                None => break,
            }
        }
        Ok(len)
    }

    async fn write<'a>(&'a mut self, data: &'a [u8]) -> Result<(), Self::Error> {
        self.tx.send(data.to_vec()).map_err(|_| ())
    }
}

#[allow(dead_code)]
impl MockHost {
    pub fn send(&self, bytes: &[u8]) {
        self.tx.send(bytes.to_vec()).unwrap();
    }

    /// Next chunk written by the device.
    pub async fn recv(&mut self) -> Vec<u8> {
        self.rx.recv().await.unwrap()
    }
}
