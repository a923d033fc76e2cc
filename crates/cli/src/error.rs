//! Error types for CLI operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration failed validation after CLI overrides were applied
    #[error("Invalid override: {message}")]
    InvalidOverride { message: String },

    /// Replay feed could not be loaded
    #[error("Failed to load event feed {}: {message}", path.display())]
    EventFeed { path: PathBuf, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl AsRef<Path>) -> Self {
        Self::ConfigNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn invalid_override(message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            message: message.into(),
        }
    }

    pub fn event_feed(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::EventFeed {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}
