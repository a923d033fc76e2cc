//! RateLimitedInvoker - one bounded retry on "slow down" signals

use std::future::Future;
use std::sync::Arc;

use contracts::DeliveryError;
use tracing::warn;

use crate::metrics::DispatchMetrics;

/// Runs a transport call, honouring at most one rate-limit signal
///
/// A `RateLimited(n)` failure suspends the calling task for `n` seconds and
/// retries once; whatever the retry returns is final. Any other failure is
/// returned immediately.
#[derive(Debug, Clone, Default)]
pub struct RateLimitedInvoker {
    metrics: Arc<DispatchMetrics>,
}

impl RateLimitedInvoker {
    pub fn new(metrics: Arc<DispatchMetrics>) -> Self {
        Self { metrics }
    }

    /// Invoke `request`, retrying once after a rate-limit wait
    ///
    /// `operation` only labels log lines.
    pub async fn invoke<T, F, Fut>(
        &self,
        operation: &'static str,
        mut request: F,
    ) -> Result<T, DeliveryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DeliveryError>>,
    {
        let err = match request().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(signal) = err.rate_limit() else {
            return Err(err);
        };

        self.metrics.record_rate_limited(signal.wait());
        warn!(
            operation,
            retry_after_secs = signal.wait_secs,
            "rate limited, waiting before retry"
        );
        tokio::time::sleep(signal.wait()).await;

        request().await.inspect_err(|e| {
            if let Some(again) = e.rate_limit() {
                warn!(
                    operation,
                    retry_after_secs = again.wait_secs,
                    "rate limit persisted after retry"
                );
            }
        })
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }
}
