//! Bridge construction, worker spawning and shutdown

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use super::types::{BridgeOptions, BridgeStats, Shared, Value, WorkerRole};
use super::workers::{run_middleware_output, run_peer_ingest, run_peer_output, InboundHandler};
use crate::bus::{EventSource, OutboundSink};
use crate::config::Config;
use crate::peer::{PeerReader, PeerWriter};
use crate::queue::{channel, QueueConsumer, QueueProducer};
use crate::{Error, Result};

/// Bidirectional bridge between an external peer and the middleware
///
/// Owns both direction channels. Values from the peer travel through the
/// outbound queue to the middleware; values from the middleware travel
/// through the inbound queue to the peer. Each queue has exactly one
/// consumer thread.
pub struct Bridge {
    options: BridgeOptions,
    outbound_tx: QueueProducer<Value>,
    outbound_rx: QueueConsumer<Value>,
    inbound_tx: QueueProducer<Value>,
    inbound_rx: QueueConsumer<Value>,
    shared: Arc<Shared>,
}

impl Bridge {
    /// Create a bridge with both queues empty and no workers running
    pub fn new(options: BridgeOptions) -> Self {
        let (outbound_tx, outbound_rx) = channel();
        let (inbound_tx, inbound_rx) = channel();
        Self {
            options,
            outbound_tx,
            outbound_rx,
            inbound_tx,
            inbound_rx,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Create a bridge from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(BridgeOptions::from(config))
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Producer handle of the peer -> middleware queue
    pub fn outbound_sender(&self) -> QueueProducer<Value> {
        self.outbound_tx.clone()
    }

    /// Handler feeding the middleware -> peer queue
    pub fn inbound_handler(&self) -> InboundHandler {
        InboundHandler::new(
            self.inbound_tx.clone(),
            self.options.joint_index,
            Arc::clone(&self.shared),
        )
    }

    pub fn stats(&self) -> BridgeStats {
        self.shared
            .counters
            .snapshot(self.outbound_tx.len(), self.inbound_tx.len())
    }

    /// Register the inbound handler and spawn the three workers.
    ///
    /// The queue consumers move into their worker threads, which is what
    /// keeps each queue single-consumer.
    pub fn start<R, W, S>(
        self,
        reader: R,
        writer: W,
        source: &dyn EventSource,
        sink: S,
    ) -> Result<RunningBridge>
    where
        R: PeerReader + 'static,
        W: PeerWriter + 'static,
        S: OutboundSink + 'static,
    {
        source.subscribe(
            &self.options.inbound_topic,
            self.inbound_handler().into_message_handler(),
        )?;
        info!(
            "Bridge subscribed to {}, publishing on {}",
            self.options.inbound_topic, self.options.outbound_topic
        );

        let Bridge {
            options,
            outbound_tx,
            outbound_rx,
            inbound_tx,
            inbound_rx,
            shared,
        } = self;

        let mut running = RunningBridge {
            options,
            outbound_tx,
            inbound_tx,
            shared,
            workers: Vec::with_capacity(WorkerRole::ALL.len()),
        };

        let shared = Arc::clone(&running.shared);
        let tx = running.outbound_tx.clone();
        let mut reader = reader;
        running.spawn(WorkerRole::PeerIngest, move || {
            run_peer_ingest(&mut reader, &tx, &shared)
        })?;

        let shared = Arc::clone(&running.shared);
        let topic = running.options.outbound_topic.clone();
        let joint_name = running.options.joint_name.clone();
        running.spawn(WorkerRole::MiddlewareOutput, move || {
            run_middleware_output(
                &outbound_rx,
                &sink,
                &topic,
                joint_name.as_deref(),
                &shared,
            )
        })?;

        let shared = Arc::clone(&running.shared);
        let mut writer = writer;
        running.spawn(WorkerRole::PeerOutput, move || {
            run_peer_output(&inbound_rx, &mut writer, &shared)
        })?;

        info!("Bridge started");
        Ok(running)
    }
}

/// A started bridge holding the join handles of its workers
pub struct RunningBridge {
    options: BridgeOptions,
    outbound_tx: QueueProducer<Value>,
    inbound_tx: QueueProducer<Value>,
    shared: Arc<Shared>,
    workers: Vec<(WorkerRole, JoinHandle<Result<()>>)>,
}

impl RunningBridge {
    fn spawn<F>(&mut self, role: WorkerRole, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(role.thread_name().to_string())
            .spawn(move || {
                info!("Worker {} started", role);
                let result = body();
                match &result {
                    Ok(()) => info!("Worker {} stopped", role),
                    Err(e) => error!("Worker {} failed: {}", role, e),
                }
                result
            });

        match handle {
            Ok(handle) => {
                self.workers.push((role, handle));
                Ok(())
            }
            Err(e) => {
                // Do not leave already spawned workers parked forever
                self.shared.request_stop();
                self.outbound_tx.close();
                self.inbound_tx.close();
                Err(Error::Io(e))
            }
        }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    pub fn stats(&self) -> BridgeStats {
        self.shared
            .counters
            .snapshot(self.outbound_tx.len(), self.inbound_tx.len())
    }

    /// Producer handle of the peer -> middleware queue
    pub fn outbound_sender(&self) -> QueueProducer<Value> {
        self.outbound_tx.clone()
    }

    /// Handler feeding the middleware -> peer queue
    pub fn inbound_handler(&self) -> InboundHandler {
        InboundHandler::new(
            self.inbound_tx.clone(),
            self.options.joint_index,
            Arc::clone(&self.shared),
        )
    }

    /// Whether the worker for `role` is still running
    pub fn is_worker_alive(&self, role: WorkerRole) -> bool {
        self.workers
            .iter()
            .any(|(r, handle)| *r == role && !handle.is_finished())
    }

    /// Roles whose workers are still running
    pub fn alive_workers(&self) -> Vec<WorkerRole> {
        self.workers
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(role, _)| *role)
            .collect()
    }

    /// Stop the workers and join them.
    ///
    /// Sets the stop flag and closes both queues so the output workers wake
    /// up and exit. A peer ingest worker blocked in a read cannot be
    /// interrupted; it is joined only if it has already finished and is
    /// otherwise left to end with the process.
    pub fn shutdown(self) -> Result<()> {
        info!("Shutting down bridge");
        self.shared.request_stop();
        self.outbound_tx.close();
        self.inbound_tx.close();

        let mut panicked = Vec::new();
        for (role, handle) in self.workers {
            if role == WorkerRole::PeerIngest && !handle.is_finished() {
                warn!("Worker {} is blocked on the peer, detaching it", role);
                continue;
            }
            if handle.join().is_err() {
                error!("Worker {} panicked", role);
                panicked.push(role.to_string());
            }
        }

        if panicked.is_empty() {
            info!("Bridge stopped");
            Ok(())
        } else {
            Err(Error::Channel(format!(
                "workers panicked: {}",
                panicked.join(", ")
            )))
        }
    }
}
