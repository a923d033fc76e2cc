//! # Dispatcher
//!
//! Outbound delivery module.
//!
//! Responsibilities:
//! - Forward singles immediately and completed albums via their representative
//! - Wait out one rate-limit signal per call, then give up
//! - Log and count failures without propagating them

pub mod dispatcher;
pub mod error;
pub mod invoker;
pub mod metrics;
pub mod transports;

pub use contracts::{GroupSink, Transport};
pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
pub use invoker::RateLimitedInvoker;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use transports::{create_transport, CallKind, LogTransport, RecordedCall, RecordingTransport};
