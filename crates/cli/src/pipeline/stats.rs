//! Run statistics.

use std::fmt;
use std::time::Duration;

use observability::RelaySummary;

/// Why a run ended before its feed was exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `--timeout` elapsed
    Timeout,
    /// Ctrl+C or SIGTERM
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Shutdown => write!(f, "shutdown signal"),
        }
    }
}

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Events pulled from the feed
    pub events_handled: u64,

    /// Forward tasks awaited while draining
    pub tasks_drained: usize,

    /// Feed lines skipped as malformed
    pub replay_skipped: u64,

    /// Albums still buffered when the run was cut short
    pub pending_groups_abandoned: usize,

    /// Album items held by those albums
    pub events_abandoned: usize,

    /// Forward and completion tasks still running when the run was cut short
    pub tasks_abandoned: usize,

    /// Set when the run was cut short
    pub stopped: Option<StopReason>,

    /// Total duration of the run
    pub duration: Duration,

    /// Delivery and ingress counters
    pub summary: RelaySummary,
}

impl RunStats {
    /// Events handled per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_handled as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Relay Run ===\n");
        println!("Overview");
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Events handled: {}", self.events_handled);
        println!("   Throughput: {:.2} events/s", self.throughput());
        println!("   Tasks drained: {}", self.tasks_drained);
        if self.replay_skipped > 0 {
            println!("   Feed lines skipped: {}", self.replay_skipped);
        }
        if let Some(reason) = self.stopped {
            println!(
                "   Stopped by {}: {} album(s) with {} item(s) abandoned, {} task(s) cancelled",
                reason, self.pending_groups_abandoned, self.events_abandoned, self.tasks_abandoned
            );
        }

        println!();
        print!("{}", self.summary);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let stats = RunStats {
            events_handled: 50,
            duration: Duration::from_secs(10),
            ..Default::default()
        };
        assert!((stats.throughput() - 5.0).abs() < 1e-10);
        assert_eq!(RunStats::default().throughput(), 0.0);
    }
}
