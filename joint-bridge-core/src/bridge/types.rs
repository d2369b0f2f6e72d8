//! Types shared by the bridge service and its workers

use crate::config::Config;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// One joint position. Passed by copy through the queues.
pub type Value = f64;

/// The three dedicated worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    /// Peer read -> outbound queue
    PeerIngest,
    /// Outbound queue -> middleware publish
    MiddlewareOutput,
    /// Inbound queue -> peer write
    PeerOutput,
}

impl WorkerRole {
    pub const ALL: [WorkerRole; 3] = [
        WorkerRole::PeerIngest,
        WorkerRole::MiddlewareOutput,
        WorkerRole::PeerOutput,
    ];

    /// OS thread name for this role
    pub fn thread_name(self) -> &'static str {
        match self {
            WorkerRole::PeerIngest => "peer-ingest",
            WorkerRole::MiddlewareOutput => "middleware-output",
            WorkerRole::PeerOutput => "peer-output",
        }
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.thread_name())
    }
}

/// Static settings of a bridge instance
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Topic the inbound handler subscribes to
    pub inbound_topic: String,
    /// Topic the middleware-output worker publishes on
    pub outbound_topic: String,
    /// Index into inbound `position` arrays
    pub joint_index: usize,
    /// Name attached to published messages
    pub joint_name: Option<String>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for BridgeOptions {
    fn from(config: &Config) -> Self {
        Self {
            inbound_topic: config.topics.inbound.clone(),
            outbound_topic: config.topics.outbound.clone(),
            joint_index: config.joint.index,
            joint_name: config.joint.name.clone(),
        }
    }
}

/// Point-in-time view of bridge traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Values read from the peer
    pub outbound_received: u64,
    /// Values published to the middleware
    pub outbound_forwarded: u64,
    /// Values waiting in the peer -> middleware queue
    pub outbound_pending: usize,
    /// Inbound messages accepted by the handler
    pub inbound_received: u64,
    /// Inbound messages dropped for lacking the joint position
    pub inbound_dropped: u64,
    /// Values written to the peer
    pub inbound_forwarded: u64,
    /// Values waiting in the middleware -> peer queue
    pub inbound_pending: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub outbound_received: AtomicU64,
    pub outbound_forwarded: AtomicU64,
    pub inbound_received: AtomicU64,
    pub inbound_dropped: AtomicU64,
    pub inbound_forwarded: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, outbound_pending: usize, inbound_pending: usize) -> BridgeStats {
        BridgeStats {
            outbound_received: self.outbound_received.load(Ordering::Relaxed),
            outbound_forwarded: self.outbound_forwarded.load(Ordering::Relaxed),
            outbound_pending,
            inbound_received: self.inbound_received.load(Ordering::Relaxed),
            inbound_dropped: self.inbound_dropped.load(Ordering::Relaxed),
            inbound_forwarded: self.inbound_forwarded.load(Ordering::Relaxed),
            inbound_pending,
        }
    }
}

/// State shared by every worker of one bridge
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub stop: AtomicBool,
    pub counters: Counters,
}

impl Shared {
    pub fn stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}
