use thiserror::Error;

/// Errors that can occur during alert broadcast delivery.
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("broadcast channel closed")]
    ChannelClosed,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}
