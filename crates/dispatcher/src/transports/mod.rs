//! Transport implementations
//!
//! Contains LogTransport and RecordingTransport.

mod log;
mod recording;

pub use self::log::LogTransport;
pub use self::recording::{CallKind, RecordedCall, RecordingTransport};

use contracts::{TransportConfig, TransportKind};

use crate::error::DispatcherError;

/// Build the transport named by configuration
pub fn create_transport(config: &TransportConfig) -> Result<LogTransport, DispatcherError> {
    if config.name.trim().is_empty() {
        return Err(DispatcherError::transport_creation(
            &config.name,
            "transport name cannot be empty",
        ));
    }
    match config.kind {
        TransportKind::Log => Ok(LogTransport::new(&config.name)),
    }
}
