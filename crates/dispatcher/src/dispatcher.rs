//! Dispatcher - forwards singles and completed albums to their destination

use std::sync::Arc;

use contracts::{DeliveredRef, GroupSink, InboundEvent, Route, Transport};
use observability::RelaySummary;
use tracing::{debug, info, instrument, warn};

use crate::invoker::RateLimitedInvoker;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};

/// Routes events to a transport through the rate-limit invoker
///
/// Failures are logged and counted, never returned to the caller: a failed
/// album still lets the scheduler tear its buffer entry down.
#[derive(Debug)]
pub struct Dispatcher<T> {
    transport: T,
    invoker: RateLimitedInvoker,
    metrics: Arc<DispatchMetrics>,
}

impl<T> Dispatcher<T>
where
    T: Transport + Sync,
{
    pub fn new(transport: T) -> Self {
        let metrics = Arc::new(DispatchMetrics::new());
        Self {
            transport,
            invoker: RateLimitedInvoker::new(Arc::clone(&metrics)),
            metrics,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Delivery part of the run summary
    pub fn summary(&self) -> RelaySummary {
        self.metrics.summary()
    }

    /// Copy one event to `route.destination`
    ///
    /// Returns the delivered message, or `None` after logging the failure.
    #[instrument(
        name = "dispatcher_send_single",
        skip(self, route, event),
        fields(
            source = %route.source,
            dest = %route.destination,
            event_id = event.id,
        )
    )]
    pub async fn send_single(&self, route: Route, event: &InboundEvent) -> Option<DeliveredRef> {
        let result = self
            .invoker
            .invoke("copy_single", || {
                self.transport.copy_single(route.destination, event)
            })
            .await;

        self.metrics.record_single(result.is_ok());
        match result {
            Ok(delivered) => {
                debug!(message_id = delivered.message_id, "Single forwarded");
                Some(delivered)
            }
            Err(e) => {
                warn!(error = %e, "Failed to forward single");
                None
            }
        }
    }

    /// Copy a completed album to `route.destination`
    ///
    /// The first event in `events` (the first to arrive) is the
    /// representative handed to the transport.
    #[instrument(
        name = "dispatcher_send_group",
        skip(self, route, events),
        fields(
            source = %route.source,
            dest = %route.destination,
            group_id = events.first().and_then(|e| e.group_id.as_deref()).unwrap_or(""),
            items = events.len(),
        )
    )]
    pub async fn send_group(
        &self,
        route: Route,
        events: &[InboundEvent],
    ) -> Option<Vec<DeliveredRef>> {
        let Some(representative) = events.first() else {
            debug!("Empty album, nothing to forward");
            return None;
        };

        let result = self
            .invoker
            .invoke("copy_group", || {
                self.transport
                    .copy_group(route.destination, route.source, representative.id)
            })
            .await;

        self.metrics.record_group(result.is_ok(), events.len());
        match result {
            Ok(delivered) => {
                info!(
                    representative = representative.id,
                    delivered = delivered.len(),
                    "Album forwarded"
                );
                Some(delivered)
            }
            Err(e) => {
                warn!(
                    representative = representative.id,
                    error = %e,
                    "Failed to forward album"
                );
                None
            }
        }
    }
}

impl<T> GroupSink for Dispatcher<T>
where
    T: Transport + Sync,
{
    async fn send_group(&self, route: Route, events: Vec<InboundEvent>) {
        Dispatcher::send_group(self, route, &events).await;
    }
}
