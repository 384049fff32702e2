//! Host bridge: forwards bus messages to the host as `$…*` hex frames and
//! queues valid host frames for transmission on the bus.
//!
//! Invalid host frames are dropped without any answer to the host.
use embassy_sync::blocking_mutex::raw::RawMutex;
use futures_util::{
    future::{select, Either},
    pin_mut,
};

use crate::core::Message;
use crate::error::BridgeError;
use crate::infra::codec::{
    accumulator::{AccumulateResult, FrameAccumulator},
    hex,
};
use crate::protocol::bridge::BusHandle;
use crate::protocol::transport::traits::host_link::HostLink;

/// Bytes requested from the host link per read.
const HOST_READ_CHUNK: usize = 64;

enum BridgeEvent {
    HostBytes(usize),
    BusMessage(Message),
}

/// Async pump between a [`HostLink`] and the bus channels.
pub struct HostBridge<'a, L: HostLink, M: RawMutex, const IN: usize, const OUT: usize> {
    link: L,
    handle: BusHandle<'a, M, IN, OUT>,
    accumulator: FrameAccumulator,
}

impl<'a, L, M, const IN: usize, const OUT: usize> HostBridge<'a, L, M, IN, OUT>
where
    L: HostLink,
    M: RawMutex,
{
    pub fn new(link: L, handle: BusHandle<'a, M, IN, OUT>) -> Self {
        Self {
            link,
            handle,
            accumulator: FrameAccumulator::new(),
        }
    }

    pub fn handle(&self) -> BusHandle<'a, M, IN, OUT> {
        self.handle
    }

    /// Run the bridge until the host link fails.
    pub async fn drive(mut self) -> Result<(), BridgeError<L::Error>> {
        let mut buffer = [0u8; HOST_READ_CHUNK];

        loop {
            let event = {
                let read_future = self.link.read(&mut buffer);
                let message_future = self.handle.wait_message();
                pin_mut!(read_future);
                pin_mut!(message_future);

                match select(read_future, message_future).await {
                    Either::Left((result, _pending_message)) => {
                        BridgeEvent::HostBytes(result.map_err(BridgeError::Read)?)
                    }
                    Either::Right((message, _pending_read)) => BridgeEvent::BusMessage(message),
                }
            };

            match event {
                BridgeEvent::HostBytes(len) => {
                    self.process_host_bytes(&buffer[..len]);
                }
                BridgeEvent::BusMessage(message) => {
                    self.forward_to_host(&message).await?;
                }
            }
        }
    }

    /// Feed raw host bytes through the frame accumulator and queue every
    /// valid frame for transmission. Returns the number of messages queued.
    ///
    /// Usable directly from a polling main loop without an executor.
    pub fn process_host_bytes(&mut self, bytes: &[u8]) -> usize {
        let mut queued = 0;
        for byte in bytes {
            if let AccumulateResult::FrameComplete(frame) = self.accumulator.process_byte(*byte) {
                match hex::decode(frame.as_slice()) {
                    Ok(message) => {
                        self.handle.write_message(message);
                        queued += 1;
                    }
                    Err(_err) => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("Dropping invalid host frame: {}", _err);
                    }
                }
            }
        }
        queued
    }

    /// Encode `message` and write it to the host.
    pub async fn forward_to_host(
        &mut self,
        message: &Message,
    ) -> Result<(), BridgeError<L::Error>> {
        let frame = hex::encode(message);
        self.link
            .write(frame.as_slice())
            .await
            .map_err(BridgeError::Write)
    }
}
