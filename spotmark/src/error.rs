//! Engine error types.

use thiserror::Error;

/// Errors surfaced by engine construction and control operations.
///
/// Invalid spot coordinates are never an error; they are counted and
/// excluded as normal control flow.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The coordinator was built with an empty strategy set.
    #[error("no selection strategies registered")]
    NoStrategies,

    /// The engine has been shut down and no longer accepts requests.
    #[error("engine is shut down")]
    ShutDown,
}
