use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use signal_core::Broadcaster;

/// One dashboard event as it travels to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
pub struct WsEvent {
    pub event: String,
    pub payload: Value,
}

/// Fan-out bus between the engine loop and connected WebSocket clients.
/// Lossy by design: with no subscribers, or with a lagging one, events are
/// dropped rather than blocking the publishing tick.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WsEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.sender.subscribe()
    }
}

impl Broadcaster for EventBus {
    fn publish(&self, event: &str, payload: Value) {
        let _ = self.sender.send(WsEvent {
            event: event.to_string(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish("market_update", json!({"price": 19850.0}));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "market_update");
        assert_eq!(event.payload["price"], 19850.0);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new(16);
        bus.publish("new_signal", json!({}));
    }
}
