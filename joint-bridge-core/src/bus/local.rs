//! In-process pub/sub bus

use super::events::JointState;
use super::{EventSource, MessageHandler, OutboundSink};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// In-process message bus implementing both sides of the middleware seam
///
/// Dispatch is synchronous: `publish` calls every handler subscribed to the
/// topic on the publishing thread, in subscription order.
#[derive(Clone, Default)]
pub struct LocalBus {
    /// Handlers by topic
    subscribers: Arc<RwLock<HashMap<String, Vec<MessageHandler>>>>,
    /// Total messages published
    published: Arc<AtomicU64>,
    /// When set, every publish fails
    failing: Arc<AtomicBool>,
}

impl LocalBus {
    /// Create a new bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe with a plain closure
    pub fn subscribe_fn<F>(&self, topic: impl Into<String>, handler: F)
    where
        F: Fn(&JointState) + Send + Sync + 'static,
    {
        let topic = topic.into();
        debug!("Subscribing handler to topic: {}", topic);
        self.subscribers
            .write()
            .entry(topic)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Number of handlers registered for `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.read().get(topic).map_or(0, Vec::len)
    }

    /// Total number of successful publishes
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Make every subsequent publish fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl EventSource for LocalBus {
    fn subscribe(&self, topic: &str, handler: MessageHandler) -> crate::Result<()> {
        debug!("Subscribing handler to topic: {}", topic);
        self.subscribers
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }
}

impl OutboundSink for LocalBus {
    fn publish(&self, topic: &str, msg: JointState) -> crate::Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(crate::Error::Publish(format!(
                "bus rejected message on {}",
                topic
            )));
        }

        // Handlers may publish themselves, so release the lock before calling
        let handlers = self
            .subscribers
            .read()
            .get(topic)
            .cloned()
            .unwrap_or_default();

        self.published.fetch_add(1, Ordering::Relaxed);
        if handlers.is_empty() {
            trace!("No subscribers for topic: {}", topic);
            return Ok(());
        }

        for handler in &handlers {
            handler(&msg);
        }
        Ok(())
    }
}
