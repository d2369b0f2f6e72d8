//! The bidirectional bridge
//!
//! ```text
//! peer --read--> [outbound queue] --pop--> middleware publish
//! middleware callback --push--> [inbound queue] --pop--> peer write
//! ```

pub mod service;
pub mod types;
pub mod workers;

pub use service::{Bridge, RunningBridge};
pub use types::{BridgeOptions, BridgeStats, Value, WorkerRole};
pub use workers::InboundHandler;
