use super::pattern::PatternError;
use thiserror::Error;

/// Rejections raised before an event reaches the batch engine.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("the event name must be provided")]
    EmptyEventName,

    #[error("invalid parameters: device_id and user_id cannot both be empty")]
    MissingIdentity,

    #[error("invalid event name: {0}")]
    InvalidEventName(String),

    #[error("invalid property key: {0}")]
    InvalidPropertyKey(String),

    #[error("pattern unavailable: {0}")]
    Pattern(#[from] PatternError),
}

/// Top-level error type for the shipper.
#[derive(Error, Debug)]
pub enum ShipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] crate::buffer::EngineError),

    #[error("Transport error: {0}")]
    Channel(#[from] crate::sender::ChannelError),
}
