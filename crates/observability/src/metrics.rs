//! Relay metrics
//!
//! Facade functions publishing to whatever `metrics` recorder is installed,
//! plus an in-memory aggregator for end-of-run summaries.

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Record an inbound event
pub fn record_event_received() {
    counter!("relay_events_received_total").increment(1);
}

/// Record an event dropped because its source has no route
pub fn record_routing_miss() {
    counter!("relay_routing_misses_total").increment(1);
}

/// Record the outcome of a single forward
pub fn record_single_forwarded(delivered: bool) {
    counter!("relay_singles_forwarded_total", "status" => status(delivered)).increment(1);
}

/// Record the outcome of an album forward
pub fn record_group_forwarded(delivered: bool, size: usize) {
    counter!("relay_groups_forwarded_total", "status" => status(delivered)).increment(1);
    histogram!("relay_group_size").record(size as f64);
}

/// Record a rate-limit signal that was waited out
pub fn record_rate_limited(wait: Duration) {
    counter!("relay_rate_limited_total").increment(1);
    histogram!("relay_rate_limit_wait_seconds").record(wait.as_secs_f64());
}

/// Record the number of albums currently buffered
pub fn record_pending_groups(groups: usize) {
    gauge!("relay_pending_groups").set(groups as f64);
}

fn status(delivered: bool) -> &'static str {
    if delivered {
        "ok"
    } else {
        "failed"
    }
}

/// Relay statistics aggregator
///
/// Aggregates delivery outcomes in memory for summaries.
#[derive(Debug, Clone, Default)]
pub struct RelayStatsAggregator {
    pub singles_delivered: u64,
    pub singles_failed: u64,
    pub groups_delivered: u64,
    pub groups_failed: u64,

    /// Items per forwarded album
    pub group_sizes: RunningStats,

    /// Rate-limit waits in seconds
    pub rate_limit_waits: RunningStats,
}

impl RelayStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_single(&mut self, delivered: bool) {
        if delivered {
            self.singles_delivered += 1;
        } else {
            self.singles_failed += 1;
        }
    }

    pub fn record_group(&mut self, delivered: bool, size: usize) {
        if delivered {
            self.groups_delivered += 1;
        } else {
            self.groups_failed += 1;
        }
        self.group_sizes.push(size as f64);
    }

    pub fn record_rate_limit(&mut self, wait: Duration) {
        self.rate_limit_waits.push(wait.as_secs_f64());
    }

    /// Items across all forwarded albums
    pub fn group_items(&self) -> u64 {
        (self.group_sizes.mean() * self.group_sizes.count() as f64).round() as u64
    }

    /// Generate summary report
    pub fn summary(&self) -> RelaySummary {
        let attempts =
            self.singles_delivered + self.singles_failed + self.groups_delivered + self.groups_failed;
        let failures = self.singles_failed + self.groups_failed;
        RelaySummary {
            events_received: 0,
            routing_misses: 0,
            singles_delivered: self.singles_delivered,
            singles_failed: self.singles_failed,
            groups_delivered: self.groups_delivered,
            groups_failed: self.groups_failed,
            failure_rate: if attempts > 0 {
                failures as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            group_size: StatsSummary::from(&self.group_sizes),
            rate_limit_wait_s: StatsSummary::from(&self.rate_limit_waits),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Relay run summary
#[derive(Debug, Clone, Default)]
pub struct RelaySummary {
    pub events_received: u64,
    pub routing_misses: u64,
    pub singles_delivered: u64,
    pub singles_failed: u64,
    pub groups_delivered: u64,
    pub groups_failed: u64,
    pub failure_rate: f64,
    pub group_size: StatsSummary,
    pub rate_limit_wait_s: StatsSummary,
}

impl RelaySummary {
    /// Attach inbound counters, which the relay tracks separately
    pub fn with_ingress(mut self, events_received: u64, routing_misses: u64) -> Self {
        self.events_received = events_received;
        self.routing_misses = routing_misses;
        self
    }
}

impl std::fmt::Display for RelaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Relay Summary ===")?;
        writeln!(f, "Events received: {}", self.events_received)?;
        writeln!(f, "Routing misses: {}", self.routing_misses)?;
        writeln!(
            f,
            "Singles: {} delivered, {} failed",
            self.singles_delivered, self.singles_failed
        )?;
        writeln!(
            f,
            "Albums: {} delivered, {} failed",
            self.groups_delivered, self.groups_failed
        )?;
        writeln!(f, "Failure rate: {:.2}%", self.failure_rate)?;
        writeln!(f, "Album size: {}", self.group_size)?;
        writeln!(f, "Rate-limit wait (s): {}", self.rate_limit_wait_s)?;
        Ok(())
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sum of all samples
    pub fn total(&self) -> f64 {
        self.mean() * self.count as f64
    }
}
