//! LogTransport - logs every copy via tracing

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{ChannelId, DeliveredRef, DeliveryError, EventId, InboundEvent, Payload, Transport};
use tracing::{info, instrument};

/// Transport that logs copies and returns synthetic delivered refs
///
/// Stands in for a network client when running the relay locally.
#[derive(Debug)]
pub struct LogTransport {
    name: String,
    next_message_id: AtomicU64,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_message_id: AtomicU64::new(1),
        }
    }

    fn delivered(&self, channel: ChannelId) -> DeliveredRef {
        DeliveredRef {
            channel,
            message_id: self.next_message_id.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_copy_single",
        skip(self, event),
        fields(transport = %self.name, source = %event.source, event_id = event.id)
    )]
    async fn copy_single(
        &self,
        destination: ChannelId,
        event: &InboundEvent,
    ) -> Result<DeliveredRef, DeliveryError> {
        let kind = match &event.payload {
            Payload::Text { .. } => "text",
            Payload::Media { .. } => "media",
        };
        let delivered = self.delivered(destination);
        info!(
            dest = %destination,
            kind,
            message_id = delivered.message_id,
            "Copied message"
        );
        Ok(delivered)
    }

    #[instrument(
        name = "log_transport_copy_group",
        skip(self),
        fields(transport = %self.name)
    )]
    async fn copy_group(
        &self,
        destination: ChannelId,
        source: ChannelId,
        representative: EventId,
    ) -> Result<Vec<DeliveredRef>, DeliveryError> {
        let delivered = self.delivered(destination);
        info!(
            dest = %destination,
            %source,
            representative,
            message_id = delivered.message_id,
            "Copied album"
        );
        Ok(vec![delivered])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_transport_assigns_increasing_ids() {
        let transport = LogTransport::new("test_log");
        let dest = ChannelId::new(-2);
        let event = InboundEvent::single(ChannelId::new(-1), 10, Payload::text("hi"));

        let first = transport.copy_single(dest, &event).await.unwrap();
        let second = transport.copy_group(dest, event.source, event.id).await.unwrap();

        assert_eq!(first.channel, dest);
        assert_eq!(second[0].message_id, first.message_id + 1);
    }

    #[test]
    fn test_log_transport_name() {
        let transport = LogTransport::new("my_logger");
        assert_eq!(transport.name(), "my_logger");
    }
}
