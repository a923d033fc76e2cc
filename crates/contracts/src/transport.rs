//! Transport and GroupSink traits - the relay's outbound seams
//!
//! `Transport` is the external client performing the actual copies.
//! `GroupSink` is what the album engine hands completed albums to, so the
//! engine never depends on the dispatcher crate.

use crate::{ChannelId, DeliveredRef, DeliveryError, EventId, InboundEvent, Route};

/// Outbound transport client
///
/// Implementations are shared across tasks, so every method takes `&self`.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Copy one event into `destination`
    ///
    /// # Errors
    /// `DeliveryError::RateLimited` when the transport asks to slow down,
    /// any other variant for terminal failures.
    async fn copy_single(
        &self,
        destination: ChannelId,
        event: &InboundEvent,
    ) -> Result<DeliveredRef, DeliveryError>;

    /// Copy a whole album, anchored on its representative event
    ///
    /// # Errors
    /// Same taxonomy as [`LocalTransport::copy_single`].
    async fn copy_group(
        &self,
        destination: ChannelId,
        source: ChannelId,
        representative: EventId,
    ) -> Result<Vec<DeliveredRef>, DeliveryError>;
}

/// Receiver of completed albums
///
/// Delivery failures are handled inside the sink; nothing flows back to the
/// caller.
#[trait_variant::make(GroupSink: Send)]
pub trait LocalGroupSink {
    async fn send_group(&self, route: Route, events: Vec<InboundEvent>);
}
