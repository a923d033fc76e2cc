//! Dispatch metrics for observability

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use observability::{RelayStatsAggregator, RelaySummary};

/// Delivery outcome counters
///
/// Every record is published to the `metrics` facade and aggregated in memory
/// for the end-of-run summary.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    stats: Mutex<RelayStatsAggregator>,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    fn stats(&self) -> MutexGuard<'_, RelayStatsAggregator> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_single(&self, delivered: bool) {
        observability::record_single_forwarded(delivered);
        self.stats().record_single(delivered);
    }

    pub fn record_group(&self, delivered: bool, items: usize) {
        observability::record_group_forwarded(delivered, items);
        self.stats().record_group(delivered, items);
    }

    /// Record a rate-limit signal and the wait it imposed
    pub fn record_rate_limited(&self, wait: Duration) {
        observability::record_rate_limited(wait);
        self.stats().record_rate_limit(wait);
    }

    /// Delivery part of the run summary
    pub fn summary(&self) -> RelaySummary {
        self.stats().summary()
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let stats = self.stats();
        MetricsSnapshot {
            singles_delivered: stats.singles_delivered,
            singles_failed: stats.singles_failed,
            groups_delivered: stats.groups_delivered,
            groups_failed: stats.groups_failed,
            group_items: stats.group_items(),
            rate_limited: stats.rate_limit_waits.count(),
            rate_limit_wait_ms: (stats.rate_limit_waits.total() * 1000.0).round() as u64,
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub singles_delivered: u64,
    pub singles_failed: u64,
    pub groups_delivered: u64,
    pub groups_failed: u64,
    pub group_items: u64,
    pub rate_limited: u64,
    pub rate_limit_wait_ms: u64,
}
