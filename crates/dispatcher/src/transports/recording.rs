//! RecordingTransport - records calls and plays back scripted outcomes

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{ChannelId, DeliveredRef, DeliveryError, EventId, InboundEvent, Transport};
use tokio::time::Instant;

/// Which primitive was called
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    Single {
        destination: ChannelId,
        source: ChannelId,
        event_id: EventId,
    },
    Group {
        destination: ChannelId,
        source: ChannelId,
        representative: EventId,
    },
}

/// One recorded transport call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Tokio clock reading, so paused-time tests can assert on it
    pub at: Instant,
}

/// In-memory transport for tests
///
/// Each primitive pops the next scripted failure from its own queue; an empty
/// queue means success.
#[derive(Debug)]
pub struct RecordingTransport {
    name: String,
    calls: Mutex<Vec<RecordedCall>>,
    single_failures: Mutex<VecDeque<DeliveryError>>,
    group_failures: Mutex<VecDeque<DeliveryError>>,
    next_message_id: AtomicU64,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new("recording")
    }
}

impl RecordingTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
            single_failures: Mutex::new(VecDeque::new()),
            group_failures: Mutex::new(VecDeque::new()),
            next_message_id: AtomicU64::new(1),
        }
    }

    /// Fail the next `copy_single` with `error`
    pub fn fail_next_single(&self, error: DeliveryError) {
        lock(&self.single_failures).push_back(error);
    }

    /// Fail the next `copy_group` with `error`
    pub fn fail_next_group(&self, error: DeliveryError) {
        lock(&self.group_failures).push_back(error);
    }

    /// All calls so far, in call order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn single_calls(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c.kind, CallKind::Single { .. }))
            .count()
    }

    pub fn group_calls(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c.kind, CallKind::Group { .. }))
            .count()
    }

    fn record(&self, kind: CallKind) {
        lock(&self.calls).push(RecordedCall {
            kind,
            at: Instant::now(),
        });
    }

    fn delivered(&self, channel: ChannelId) -> DeliveredRef {
        DeliveredRef {
            channel,
            message_id: self.next_message_id.fetch_add(1, Ordering::Relaxed),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn copy_single(
        &self,
        destination: ChannelId,
        event: &InboundEvent,
    ) -> Result<DeliveredRef, DeliveryError> {
        self.record(CallKind::Single {
            destination,
            source: event.source,
            event_id: event.id,
        });
        match lock(&self.single_failures).pop_front() {
            Some(error) => Err(error),
            None => Ok(self.delivered(destination)),
        }
    }

    async fn copy_group(
        &self,
        destination: ChannelId,
        source: ChannelId,
        representative: EventId,
    ) -> Result<Vec<DeliveredRef>, DeliveryError> {
        self.record(CallKind::Group {
            destination,
            source,
            representative,
        });
        match lock(&self.group_failures).pop_front() {
            Some(error) => Err(error),
            None => Ok(vec![self.delivered(destination)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Payload;

    #[tokio::test]
    async fn test_scripted_failures_are_consumed_in_order() {
        let transport = RecordingTransport::default();
        transport.fail_next_single(DeliveryError::rate_limited(3));

        let event = InboundEvent::single(ChannelId::new(1), 5, Payload::text("x"));
        let dest = ChannelId::new(2);

        assert_eq!(
            transport.copy_single(dest, &event).await,
            Err(DeliveryError::rate_limited(3))
        );
        assert!(transport.copy_single(dest, &event).await.is_ok());
        assert_eq!(transport.single_calls(), 2);
        assert_eq!(transport.group_calls(), 0);
    }

    #[tokio::test]
    async fn test_group_call_recorded() {
        let transport = RecordingTransport::default();
        transport
            .copy_group(ChannelId::new(9), ChannelId::new(1), 42)
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(
            calls[0].kind,
            CallKind::Group {
                destination: ChannelId::new(9),
                source: ChannelId::new(1),
                representative: 42,
            }
        );
    }
}
