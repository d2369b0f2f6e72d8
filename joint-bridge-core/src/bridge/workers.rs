//! Worker loops and the inbound message handler
//!
//! Each loop owns the handles it needs; nothing is global. The stop flag is
//! checked before blocking and again right after every wake-up, so a
//! shutdown (stop flag + queue close) never leaves a worker parked.
//!
//! A worker that hits an error returns it and its thread ends. The other
//! workers are not told and keep running.

use super::types::{Counters, Shared, Value};
use crate::bus::{JointState, MessageHandler, OutboundSink};
use crate::peer::{format_value, PeerReader, PeerWriter};
use crate::queue::{QueueConsumer, QueueProducer};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Peer read -> outbound queue.
///
/// Ends on EOF (`Ok`) or on the first read error.
pub(crate) fn run_peer_ingest(
    reader: &mut dyn PeerReader,
    outbound: &QueueProducer<Value>,
    shared: &Shared,
) -> Result<()> {
    loop {
        if shared.stopping() {
            return Ok(());
        }
        let Some(value) = reader.read_value()? else {
            info!("Peer stream closed, no more input");
            return Ok(());
        };
        if shared.stopping() {
            debug!("Discarding {} read during shutdown", value);
            return Ok(());
        }

        debug!("Received from peer: {}", value);
        outbound.push(value);
        Counters::bump(&shared.counters.outbound_received);
    }
}

/// Outbound queue -> middleware publish
pub(crate) fn run_middleware_output(
    outbound: &QueueConsumer<Value>,
    sink: &dyn OutboundSink,
    topic: &str,
    joint_name: Option<&str>,
    shared: &Shared,
) -> Result<()> {
    loop {
        if shared.stopping() || !outbound.wait_for_not_empty() || shared.stopping() {
            return Ok(());
        }
        let value = outbound.pop()?;

        let mut msg = JointState::from_position(value);
        if let Some(name) = joint_name {
            msg = msg.with_name(name);
        }
        debug!("Publishing {} on {}", value, topic);
        sink.publish(topic, msg)?;
        Counters::bump(&shared.counters.outbound_forwarded);
    }
}

/// Inbound queue -> peer write
pub(crate) fn run_peer_output(
    inbound: &QueueConsumer<Value>,
    writer: &mut dyn PeerWriter,
    shared: &Shared,
) -> Result<()> {
    loop {
        if shared.stopping() || !inbound.wait_for_not_empty() || shared.stopping() {
            return Ok(());
        }
        let value = inbound.pop()?;

        debug!("Sending to peer: {}", format_value(value));
        writer.write_value(value)?;
        Counters::bump(&shared.counters.inbound_forwarded);
    }
}

/// Callback half of the middleware -> peer direction
///
/// Runs on the middleware's dispatch thread. It only pushes, which never
/// blocks.
#[derive(Clone)]
pub struct InboundHandler {
    inbound: QueueProducer<Value>,
    joint_index: usize,
    shared: Arc<Shared>,
}

impl InboundHandler {
    pub(crate) fn new(
        inbound: QueueProducer<Value>,
        joint_index: usize,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            inbound,
            joint_index,
            shared,
        }
    }

    /// Extract the configured joint position and queue it for the peer.
    ///
    /// Messages without that position are dropped and counted; they never
    /// reach the queue. Returns whether the value was queued.
    pub fn handle(&self, msg: &JointState) -> bool {
        match msg.position_at(self.joint_index) {
            Some(value) => {
                debug!("Received from middleware: {}", value);
                self.inbound.push(value);
                Counters::bump(&self.shared.counters.inbound_received);
                true
            }
            None => {
                warn!(
                    "Dropping joint state without position[{}] ({} positions)",
                    self.joint_index,
                    msg.position.len()
                );
                Counters::bump(&self.shared.counters.inbound_dropped);
                false
            }
        }
    }

    /// Wrap into a handler an event source can register
    pub fn into_message_handler(self) -> MessageHandler {
        Arc::new(move |msg: &JointState| {
            self.handle(msg);
        })
    }
}
