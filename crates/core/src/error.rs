use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("track source failed: {0}")]
    Source(String),
    #[error("status publish failed: {0}")]
    Publish(String),
    #[error("status clear failed: {0}")]
    Clear(String),
    #[error("expected a track source to be set")]
    NoSource,
}
