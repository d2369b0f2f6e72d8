//! Error types for joint-bridge

use thiserror::Error;

/// The main error type for joint-bridge operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Peer stream I/O errors (including a closed stream on write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent something that is not a decimal number
    #[error("Parse error: invalid number {token:?}")]
    Parse { token: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// `pop` was called on an empty queue
    #[error("pop called on an empty queue")]
    EmptyQueue,

    /// Outbound sink rejected a message
    #[error("Publish error: {0}")]
    Publish(String),

    /// Channel / worker errors
    #[error("Channel error: {0}")]
    Channel(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A specialized Result type for joint-bridge operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
