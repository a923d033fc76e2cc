//! Relay orchestrator - wires the feed, relay and reload task together.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{InboundEvent, RelayConfig};
use ingestion::JsonlReplaySource;
use relay_core::Relay;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{RunStats, StopReason};
use crate::error::CliError;

/// Run configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated relay configuration (CLI overrides applied)
    pub relay: RelayConfig,

    /// Recorded feed to replay (None = idle until shutdown)
    pub events: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = original speed)
    pub speed: f64,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Relay run orchestrator
pub struct RelayPipeline {
    config: PipelineConfig,
}

impl RelayPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the feed ends and pending albums are delivered, until the
    /// timeout, or until `shutdown` resolves
    ///
    /// Stats are returned in every case; albums still buffered when the run
    /// is cut short are counted in `pending_groups_abandoned`.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        let start_time = Instant::now();
        let relay_config = &self.config.relay;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let transport = dispatcher::create_transport(&relay_config.transport)
            .context("Failed to create transport")?;
        let relay = Arc::new(
            Relay::from_config(relay_config, transport).context("Failed to assemble relay")?,
        );

        info!(
            routes = relay.routing().len(),
            window_ms = relay.window().as_millis() as u64,
            transport = %relay_config.transport.name,
            "Relay ready"
        );

        let reload_task = relay_config
            .routing
            .reload_interval()
            .map(|interval| relay.spawn_reload(interval));

        let capacity = relay_config.relay.event_queue_capacity;
        let (events_rx, feed, _idle_tx) = match &self.config.events {
            Some(path) => {
                let feed = JsonlReplaySource::load(path, self.config.speed)
                    .map_err(|e| CliError::event_feed(path, e.to_string()))?;
                info!(
                    path = %path.display(),
                    events = feed.len(),
                    skipped = feed.skipped(),
                    speed = self.config.speed,
                    "Replaying event feed"
                );
                (feed.start(capacity), Some(feed), None)
            }
            None => {
                warn!("No event feed given, relay idles until shutdown");
                let (tx, rx) = mpsc::channel::<InboundEvent>(1);
                (rx, None, Some(tx))
            }
        };

        let processing = {
            let relay = Arc::clone(&relay);
            async move {
                let handled = relay.run(events_rx).await;
                info!(
                    pending_groups = relay.pending_groups(),
                    "Feed finished, draining pending albums"
                );
                let drained = relay.drain().await;
                (handled, drained)
            }
        };

        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        let mut stats = RunStats::default();
        tokio::select! {
            (handled, drained) = processing => {
                stats.events_handled = handled;
                stats.tasks_drained = drained;
            }
            _ = deadline => {
                warn!(timeout_secs = timeout.map(|t| t.as_secs()), "Relay timed out");
                stats.stopped = Some(StopReason::Timeout);
            }
            _ = shutdown => {
                warn!("Received shutdown signal, stopping relay...");
                stats.stopped = Some(StopReason::Shutdown);
            }
        }

        if let Some(task) = reload_task {
            task.abort();
        }
        if let Some(feed) = &feed {
            feed.stop();
            stats.replay_skipped = feed.skipped();
        }

        if stats.stopped.is_some() {
            stats.pending_groups_abandoned = relay.pending_groups();
            stats.events_abandoned = relay.buffered_events();
            stats.tasks_abandoned = relay.in_flight();
        }
        stats.summary = relay.summary();
        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            events = stats.summary.events_received,
            "Relay shutdown complete"
        );

        Ok(stats)
    }
}
