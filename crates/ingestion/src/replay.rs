//! JSONL replay source
//!
//! Each line is one inbound event plus an optional `delay_ms` relative to the
//! previous line:
//!
//! ```text
//! {"source": -1001, "id": 10, "group_id": "g1", "payload": {"kind": "text", "text": "hi"}, "delay_ms": 200}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Malformed lines are
//! logged, counted and skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use contracts::InboundEvent;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;
use crate::scripted::{ScriptStep, ScriptedSource};

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    #[serde(flatten)]
    event: InboundEvent,
    #[serde(default)]
    delay_ms: u64,
}

/// Event source replaying a recorded JSONL feed
#[derive(Debug)]
pub struct JsonlReplaySource {
    script: ScriptedSource,
    skipped: u64,
    metrics: Arc<IngestionMetrics>,
}

impl JsonlReplaySource {
    /// Load a replay file
    ///
    /// `speed` divides every recorded delay: `2.0` replays twice as fast.
    pub fn load(path: impl AsRef<Path>, speed: f64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IngestionError::ReplayIo {
            path: path.to_path_buf(),
            source,
        })?;

        let source = Self::parse(BufReader::new(file), speed).map_err(|e| match e {
            IngestionError::ReplayIo { source, .. } => IngestionError::ReplayIo {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!(
            path = %path.display(),
            events = source.len(),
            skipped = source.skipped,
            "replay file loaded"
        );
        Ok(source)
    }

    /// Parse replay lines from any reader
    pub fn parse(reader: impl BufRead, speed: f64) -> Result<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(IngestionError::InvalidSpeed(speed));
        }

        let metrics = Arc::new(IngestionMetrics::new());
        let mut steps = Vec::new();
        let mut skipped = 0u64;

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| IngestionError::ReplayIo {
                path: Default::default(),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match serde_json::from_str::<ReplayRecord>(trimmed) {
                Ok(record) => steps.push(ScriptStep {
                    delay: scale(record.delay_ms, speed).ok_or(
                        IngestionError::DelayOutOfRange {
                            line: index + 1,
                            delay_ms: record.delay_ms,
                            speed,
                        },
                    )?,
                    event: record.event,
                }),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping malformed replay line");
                    metrics.record_parse_error();
                    skipped += 1;
                }
            }
        }

        Ok(Self {
            script: ScriptedSource::from_steps(steps),
            skipped,
            metrics,
        })
    }

    /// Lines skipped as malformed
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Number of events that will be replayed
    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Shared feed metrics
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Start replaying; the receiver closes after the last event
    pub fn start(&self, channel_capacity: usize) -> mpsc::Receiver<InboundEvent> {
        self.script
            .start(channel_capacity, Some(Arc::clone(&self.metrics)))
    }

    pub fn stop(&self) {
        self.script.stop();
    }
}

fn scale(delay_ms: u64, speed: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(delay_ms as f64 / 1000.0 / speed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ChannelId;
    use std::io::Cursor;
    use std::io::Write;

    const FEED: &str = r#"
# album of two, then a text
{"source": -100, "id": 1, "group_id": "g", "payload": {"kind": "media", "media": {"media_type": "photo", "file_id": "a"}, "caption": "hi"}}
{"source": -100, "id": 2, "group_id": "g", "payload": {"kind": "media", "media": {"media_type": "photo", "file_id": "b"}}, "delay_ms": 100}
{"source": -100, "id": 3, "payload": {"kind": "text", "text": "later"}, "delay_ms": 2000}
"#;

    #[test]
    fn test_parse_feed() {
        let source = JsonlReplaySource::parse(Cursor::new(FEED), 1.0).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.skipped(), 0);

        let steps = source.script.steps();
        assert_eq!(steps[0].event.source, ChannelId::new(-100));
        assert!(steps[0].event.is_grouped());
        assert!(!steps[2].event.is_grouped());
        assert_eq!(steps[1].delay, Duration::from_millis(100));
        assert_eq!(steps[2].delay, Duration::from_secs(2));
    }

    #[test]
    fn test_speed_scales_delays() {
        let source = JsonlReplaySource::parse(Cursor::new(FEED), 4.0).unwrap();
        assert_eq!(source.script.steps()[2].delay, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_speed_rejected() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = JsonlReplaySource::parse(Cursor::new(FEED), speed).unwrap_err();
            assert!(matches!(err, IngestionError::InvalidSpeed(_)));
        }
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let feed = "{\"source\": 1, \"id\": 1, \"payload\": {\"kind\": \"text\", \"text\": \"ok\"}}\nnot json\n{\"id\": 2}\n";
        let source = JsonlReplaySource::parse(Cursor::new(feed), 1.0).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source.skipped(), 2);
        assert_eq!(source.metrics().snapshot().parse_errors, 2);
    }

    #[test]
    fn test_tiny_speed_overflowing_delay_rejected() {
        let feed = r#"{"source": -1, "id": 1, "payload": {"kind": "text", "text": "x"}, "delay_ms": 1000}"#;
        let err = JsonlReplaySource::parse(Cursor::new(feed), 1e-20).unwrap_err();
        assert!(matches!(
            err,
            IngestionError::DelayOutOfRange {
                line: 1,
                delay_ms: 1000,
                ..
            }
        ));
    }

    #[test]
    fn test_tiny_speed_with_zero_delays_accepted() {
        let feed = r#"{"source": -1, "id": 1, "payload": {"kind": "text", "text": "x"}}"#;
        let source = JsonlReplaySource::parse(Cursor::new(feed), 1e-20).unwrap();
        assert_eq!(source.script.steps()[0].delay, Duration::ZERO);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonlReplaySource::load(dir.path().join("absent.jsonl"), 1.0).unwrap_err();
        assert!(matches!(err, IngestionError::ReplayIo { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_and_replay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FEED.as_bytes()).unwrap();

        let source = JsonlReplaySource::load(file.path(), 1.0).unwrap();
        let mut rx = source.start(8);

        let mut ids = Vec::new();
        while let Some(event) = rx.recv().await {
            ids.push(event.id);
        }
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(source.metrics().snapshot().events_emitted, 3);
    }
}
