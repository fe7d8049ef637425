use tokio::sync::broadcast;

use crate::Event;

/// Broadcast bus cloned into every pipeline stage.
///
/// `publish()` is sync and never blocks. Without subscribers events are
/// dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus holding up to `capacity` undelivered events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Accepts sub-enum values directly: `bus.publish(AbrEvent::Switched { .. })`.
    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    /// Slow subscribers see `RecvError::Lagged(n)` rather than blocking
    /// the pipeline.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AbrEvent, PipelineEvent};

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new(4);
        bus.publish(PipelineEvent::Finished {
            segments_played: 0,
            completed: true,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_each_receive() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let event = AbrEvent::Decision {
            segment_index: 0,
            bitrate_kbps: 1000,
            predicted_kbps: 1500.0,
            buffer_secs: 0.0,
        };
        bus.publish(event.clone());
        assert_eq!(rx1.recv().await.unwrap(), Event::Abr(event.clone()));
        assert_eq!(rx2.recv().await.unwrap(), Event::Abr(event));
    }

    #[tokio::test]
    async fn lagged_subscriber_gets_error() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for segment_index in 0..10 {
            bus.publish(PipelineEvent::FetchFailed {
                segment_index,
                error: "unavailable".into(),
            });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }

    #[test]
    fn clone_shares_channel() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.clone().publish(PipelineEvent::Finished {
            segments_played: 10,
            completed: true,
        });
        assert!(rx.try_recv().is_ok());
    }
}
