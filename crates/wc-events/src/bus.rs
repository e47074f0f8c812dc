use crate::types::EventRecord;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventRecord>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers that received the event. Having no
    /// subscribers is not an error here; the record is simply dropped.
    pub fn publish(&self, event: EventRecord) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventSource;

    #[tokio::test]
    async fn subscribers_receive_published_records() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let record = EventRecord::new(EventSource::Scheduler, None, serde_json::json!({"k": 1}));
        assert_eq!(bus.publish(record.clone()), 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received, record);
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::new(8);
        let record = EventRecord::new(EventSource::Ui, None, serde_json::Value::Null);
        assert_eq!(bus.publish(record), 0);
    }
}
