//! Scripted event source
//!
//! Replays a fixed list of events with per-step delays. Used by tests and by
//! the replay source, which compiles its file into a script.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ChannelId, EventId, InboundEvent, MediaType, Payload};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::metrics::IngestionMetrics;

/// One scripted emission
#[derive(Debug, Clone)]
pub struct ScriptStep {
    /// Wait before emitting, relative to the previous step
    pub delay: Duration,
    /// Event to emit
    pub event: InboundEvent,
}

/// Scripted event source
///
/// # Examples
/// ```ignore
/// let source = ScriptedSource::new()
///     .text(Duration::ZERO, chat, 1, "hello")
///     .album(Duration::from_millis(100), chat, 2, "g1", 4, Duration::from_millis(50));
/// let mut rx = source.start(16, None);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: Vec<ScriptStep>,
    running: Arc<AtomicBool>,
}

impl ScriptedSource {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Script from prepared steps
    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Append an arbitrary event
    pub fn push(mut self, delay: Duration, event: InboundEvent) -> Self {
        self.steps.push(ScriptStep { delay, event });
        self
    }

    /// Append a plain text event
    pub fn text(self, delay: Duration, source: ChannelId, id: EventId, text: &str) -> Self {
        self.push(delay, InboundEvent::single(source, id, Payload::text(text)))
    }

    /// Append `count` photo items of one album, `spacing` apart
    ///
    /// Item ids are `first_id..first_id + count`; the first item carries the
    /// caption, like an album sent from a client.
    pub fn album(
        mut self,
        delay: Duration,
        source: ChannelId,
        first_id: EventId,
        group_id: &str,
        count: usize,
        spacing: Duration,
    ) -> Self {
        for i in 0..count {
            let id = first_id + i as EventId;
            let caption = (i == 0).then(|| format!("album {group_id}"));
            let payload = Payload::media(MediaType::Photo, format!("photo-{source}-{id}"), caption);
            let step_delay = if i == 0 { delay } else { spacing };
            self.steps.push(ScriptStep {
                delay: step_delay,
                event: InboundEvent::grouped(source, id, group_id, payload),
            });
        }
        self
    }

    /// Scripted steps
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Number of scripted events
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Start emitting; returns the feed receiver
    ///
    /// The channel closes after the last step, which is how consumers detect
    /// the end of a finite feed.
    ///
    /// # Arguments
    /// * `channel_capacity` - channel capacity
    /// * `metrics` - optional shared metrics
    pub fn start(
        &self,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> mpsc::Receiver<InboundEvent> {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let steps = self.steps.clone();
        let running = self.running.clone();
        let metrics = metrics.unwrap_or_else(|| Arc::new(IngestionMetrics::new()));

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            debug!(steps = steps.len(), "scripted source started");

            for step in steps {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                let (source, id) = (step.event.source, step.event.id);
                if tx.send(step.event).await.is_err() {
                    debug!("scripted source channel closed");
                    break;
                }
                metrics.record_emitted();
                trace!(%source, id, "scripted event sent");
            }

            running.store(false, Ordering::SeqCst);
            debug!("scripted source finished");
        });

        rx
    }

    /// Stop emitting after the current step
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the emitter task is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
