use thiserror::Error;

/// Fatal engine errors. Request failures are not errors at this level:
/// they are recorded as failed outcomes and the run keeps going. A user
/// that misses the stop grace period is reported in the `StopReport`,
/// not raised.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration detected before any user spawns.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
