//! # Ingestion
//!
//! Inbound event feeds for the relay.
//!
//! Responsibilities:
//! - Emit `InboundEvent`s onto a bounded tokio channel
//! - Scripted feeds for tests and demos (`ScriptedSource`)
//! - Recorded JSONL feeds with time scaling (`JsonlReplaySource`)
//!
//! A feed ends by closing its channel; the consumer drains pending albums
//! when `recv` returns `None`.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::JsonlReplaySource;
//!
//! let source = JsonlReplaySource::load("feed.jsonl", 1.0)?;
//! let mut rx = source.start(256);
//! while let Some(event) = rx.recv().await {
//!     relay.handle_event(event).await;
//! }
//! ```

mod error;
mod metrics;
mod replay;
mod scripted;

pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use replay::JsonlReplaySource;
pub use scripted::{ScriptStep, ScriptedSource};
