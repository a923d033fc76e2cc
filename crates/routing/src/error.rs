//! Routing error types

use std::path::PathBuf;

use thiserror::Error;

/// Routing errors
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Mapping file could not be read or written
    #[error("mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping file is not a JSON object of channel ids
    #[error("malformed mapping file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Background reload task failed to run
    #[error("reload task failed: {0}")]
    ReloadTask(String),
}

impl RoutingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Routing Result alias
pub type Result<T> = std::result::Result<T, RoutingError>;
