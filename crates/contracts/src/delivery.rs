//! Delivery outcomes reported by a transport

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::{ChannelId, EventId};

/// Transient "slow down" signal carrying the mandated wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSignal {
    /// Seconds the caller must wait before the next attempt
    pub wait_secs: u64,
}

impl RateLimitSignal {
    pub fn new(wait_secs: u64) -> Self {
        Self { wait_secs }
    }

    /// Wait as a `Duration`
    #[inline]
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

/// Message created in the destination channel by a successful copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredRef {
    pub channel: ChannelId,
    pub message_id: EventId,
}

/// Transport failure taxonomy
///
/// Only `RateLimited` is transient; everything else is terminal for the
/// attempt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Transport asked the caller to wait before retrying
    #[error("rate limited: retry after {}s", .0.wait_secs)]
    RateLimited(RateLimitSignal),

    /// Destination does not exist or is not reachable
    #[error("invalid destination channel {0}")]
    InvalidDestination(ChannelId),

    /// Relay account lacks rights in the destination
    #[error("permission denied in channel {0}")]
    PermissionDenied(ChannelId),

    /// Transport refused the content
    #[error("payload rejected: {0}")]
    PayloadRejected(String),

    /// Any other transport failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Shorthand for a rate-limit failure
    pub fn rate_limited(wait_secs: u64) -> Self {
        Self::RateLimited(RateLimitSignal::new(wait_secs))
    }

    /// Rate-limit signal, if this failure is transient
    pub fn rate_limit(&self) -> Option<RateLimitSignal> {
        match self {
            Self::RateLimited(signal) => Some(*signal),
            _ => None,
        }
    }
}
