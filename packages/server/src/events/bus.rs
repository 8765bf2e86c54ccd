use tokio::sync::broadcast;
use tracing::debug;

use super::DomainEvent;

/// In-process publish/subscribe fabric.
///
/// Thin wrapper over a tokio broadcast channel. Delivery is best-effort
/// within the process: a subscriber that falls behind sees a lag error and
/// skips, it never blocks publishers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers. Publishing with no
    /// subscribers is not an error.
    pub fn publish(&self, event: DomainEvent) {
        debug!(topic = event.topic(), "Publishing domain event");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_completed(payment_id: i32) -> DomainEvent {
        DomainEvent::PaymentCompleted {
            payment_id,
            booking_id: Some(1),
            user_id: 1,
        }
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(payment_completed(7));

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                DomainEvent::PaymentCompleted { payment_id, .. } => assert_eq!(payment_id, 7),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        for id in 1..=5 {
            bus.publish(payment_completed(id));
        }

        for expected in 1..=5 {
            match rx.recv().await.unwrap() {
                DomainEvent::PaymentCompleted { payment_id, .. } => {
                    assert_eq!(payment_id, expected)
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new(16);
        bus.publish(payment_completed(1));
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(16);
        bus.publish(payment_completed(1));

        let mut rx = bus.subscribe();
        bus.publish(payment_completed(2));

        match rx.recv().await.unwrap() {
            DomainEvent::PaymentCompleted { payment_id, .. } => assert_eq!(payment_id, 2),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
