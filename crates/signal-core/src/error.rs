use thiserror::Error;

/// Error taxonomy shared across the signal pipeline.
///
/// `Fetch` and `Notification` are always recoverable: callers degrade to a
/// cached/fallback value or log and continue. `Validation` and `NotFound`
/// are surfaced to the requesting caller as rejections.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl SignalError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        SignalError::Fetch(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        SignalError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        SignalError::NotFound(msg.into())
    }
}
