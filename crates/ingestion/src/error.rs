//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Replay file could not be opened or read
    #[error("failed to read replay file {path}: {source}")]
    ReplayIo {
        /// Replay file path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Replay speed multiplier must be positive and finite
    #[error("invalid replay speed {0}, expected a positive multiplier")]
    InvalidSpeed(f64),

    /// A recorded delay scaled by the speed does not fit a `Duration`
    #[error("line {line}: delay of {delay_ms}ms at speed {speed} is out of range")]
    DelayOutOfRange { line: usize, delay_ms: u64, speed: f64 },
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
