//! RelayConfig - Config Loader output
//!
//! Describes the whole relay: album window, routing store, transport and
//! optional seed routes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::ChannelId;

/// Default album quiescence window
pub const DEFAULT_QUIESCENCE_WINDOW_MS: u64 = 1500;

/// Upper bound accepted for the quiescence window
pub const MAX_QUIESCENCE_WINDOW_MS: u64 = 60_000;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Album reassembly and queue settings
    #[serde(default)]
    pub relay: RelaySettings,

    /// Mapping store settings
    #[serde(default)]
    pub routing: RoutingSettings,

    /// Outbound transport
    #[serde(default)]
    pub transport: TransportConfig,

    /// Seed routes merged into the mapping store at startup
    #[serde(default)]
    pub routes: Vec<RouteSeed>,
}

/// Album reassembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Wait after an album's first item before it is considered complete
    #[serde(default = "default_quiescence_window_ms")]
    pub quiescence_window_ms: u64,

    /// Capacity of the inbound event queue
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

impl RelaySettings {
    /// Quiescence window as a `Duration`
    pub fn quiescence_window(&self) -> Duration {
        Duration::from_millis(self.quiescence_window_ms)
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            quiescence_window_ms: default_quiescence_window_ms(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

fn default_quiescence_window_ms() -> u64 {
    DEFAULT_QUIESCENCE_WINDOW_MS
}

fn default_event_queue_capacity() -> usize {
    256
}

/// Mapping store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// JSON file holding `source -> destination` pairs
    #[serde(default = "default_mapping_file")]
    pub mapping_file: PathBuf,

    /// Periodic reload interval in seconds (0 = disabled)
    #[serde(default = "default_reload_interval_secs")]
    pub reload_interval_secs: u64,
}

impl RoutingSettings {
    /// Reload interval, `None` when periodic reload is disabled
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            mapping_file: default_mapping_file(),
            reload_interval_secs: default_reload_interval_secs(),
        }
    }
}

fn default_mapping_file() -> PathBuf {
    PathBuf::from("mappings.json")
}

fn default_reload_interval_secs() -> u64 {
    5
}

/// Transport type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Log every copy via tracing
    #[default]
    Log,
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Transport type
    #[serde(default)]
    pub kind: TransportKind,

    /// Transport name (logs/metrics)
    #[serde(default = "default_transport_name")]
    pub name: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            name: default_transport_name(),
        }
    }
}

fn default_transport_name() -> String {
    "log".to_string()
}

/// Statically configured route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSeed {
    pub source: ChannelId,
    pub destination: ChannelId,
}
