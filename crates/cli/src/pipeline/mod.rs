//! Relay run orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{PipelineConfig, RelayPipeline};
pub use stats::{RunStats, StopReason};
