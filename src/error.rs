//! Error types for keywatch

use thiserror::Error;

use crate::platform::PlatformError;

/// Main error type for keywatch
#[derive(Error, Debug)]
pub enum Error {
    /// Worker process could not be spawned
    #[error("Failed to spawn worker process: {0}")]
    Spawn(String),

    /// Command sent while the worker process is not running
    #[error("Worker process is not running")]
    WorkerNotRunning,

    /// Transport layer error (stdio pipes, queue plumbing)
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON decode error when parsing protocol messages
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for a response
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error surfaced by the messaging platform
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Result type alias for keywatch operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a spawn error
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
