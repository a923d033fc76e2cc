//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Feed counters shared between a source task and its owner
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Events emitted onto the channel
    pub events_emitted: AtomicU64,

    /// Replay lines that could not be parsed
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an emitted event
    pub fn record_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_feed_events_total").increment(1);
    }

    /// Record a skipped replay line
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_feed_parse_errors_total").increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_emitted: u64,
    pub parse_errors: u64,
}
