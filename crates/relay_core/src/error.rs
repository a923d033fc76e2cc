//! Relay error types

use thiserror::Error;

/// Relay assembly errors
///
/// Once running, the relay reports failures only through logs and metrics.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Mapping store could not be opened or seeded
    #[error("routing setup failed: {0}")]
    Routing(#[from] routing::RoutingError),

    /// Quiescence window must be positive
    #[error("quiescence window must be greater than zero")]
    ZeroWindow,
}

/// Relay Result alias
pub type Result<T> = std::result::Result<T, RelayError>;
