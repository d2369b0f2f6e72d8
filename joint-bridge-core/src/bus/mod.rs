//! Middleware seam
//!
//! The bridge talks to the pub/sub middleware only through [`EventSource`]
//! (inbound callbacks) and [`OutboundSink`] (publish). [`LocalBus`] is an
//! in-process implementation of both.

pub mod events;
pub mod local;

pub use events::JointState;
pub use local::LocalBus;

use std::sync::Arc;

/// Handler invoked by an event source once per inbound message.
///
/// Runs on the source's dispatch thread and must not block.
pub type MessageHandler = Arc<dyn Fn(&JointState) + Send + Sync>;

/// Source of inbound structured messages
pub trait EventSource: Send + Sync {
    /// Register `handler` for every message arriving on `topic`
    fn subscribe(&self, topic: &str, handler: MessageHandler) -> crate::Result<()>;
}

/// Destination for outbound structured messages
pub trait OutboundSink: Send + Sync {
    /// Publish one message on `topic`. No acknowledgment is observed.
    fn publish(&self, topic: &str, msg: JointState) -> crate::Result<()>;
}

impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    fn subscribe(&self, topic: &str, handler: MessageHandler) -> crate::Result<()> {
        (**self).subscribe(topic, handler)
    }
}

impl<T: OutboundSink + ?Sized> OutboundSink for Arc<T> {
    fn publish(&self, topic: &str, msg: JointState) -> crate::Result<()> {
        (**self).publish(topic, msg)
    }
}
