use crate::config::ConfigError;
use crate::sender::{ChannelError, CodecError};
use thiserror::Error;

/// Synchronous failures of the batch engine.
///
/// Upload outcomes never surface here; they are logged and counted by the
/// per-record delivery task.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel setup failed: {0}")]
    Channel(#[from] ChannelError),

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("No tokio runtime available to run uploads")]
    NoRuntime,

    #[error("Shutdown timed out with {pending} uploads still in flight")]
    ShutdownTimeout { pending: usize },
}
