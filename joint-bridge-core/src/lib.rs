//! Core of joint-bridge
//!
//! A thread-safe bidirectional bridge that forwards joint values between an
//! external peer (a newline-delimited numeric stream) and a pub/sub
//! middleware, with one blocking queue per direction.

pub mod bridge;
pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod peer;
pub mod queue;

pub use bridge::{Bridge, BridgeOptions, BridgeStats, RunningBridge, WorkerRole};
pub use error::{Error, Result};
pub use queue::BlockingQueue;
