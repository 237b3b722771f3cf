//! Process-wide fan-out of outbound events.
//!
//! There is one `tokio::sync::broadcast` channel per process. Every live
//! connection holds a receiver and drops events whose [`Target`] it is not
//! part of, so joining a room is purely local to the connection.

use std::sync::Arc;

use market_common::Room;
use serde_json::Value;
use tokio::sync::broadcast;

/// Events buffered per receiver. A receiver that falls further behind gets
/// `RecvError::Lagged` and loses the overflow.
const CHANNEL_CAPACITY: usize = 4096;

/// Addressee of an outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Room(Room),
    /// Every live connection. Used for seller presence.
    All,
}

/// One outbound event as it travels through the hub.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub target: Target,
    /// Wire event name, e.g. `need:new`.
    pub event_name: String,
    pub data: Value,
}

#[derive(Clone)]
pub struct FanoutHub {
    sender: broadcast::Sender<Arc<RoomEvent>>,
}

impl Default for FanoutHub {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl FanoutHub {
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RoomEvent>> {
        self.sender.subscribe()
    }

    /// Publish `event`. Returns how many receivers were live.
    pub fn publish(&self, event: RoomEvent) -> usize {
        // No receivers just means nobody is connected.
        self.sender.send(Arc::new(event)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let hub = FanoutHub::default();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        let live = hub.publish(RoomEvent {
            target: Target::Room(Room::seller("sel_1")),
            event_name: "need:new".into(),
            data: Value::Null,
        });
        assert_eq!(live, 2);
        assert_eq!(a.recv().await.unwrap().event_name, "need:new");
        assert_eq!(b.recv().await.unwrap().target, Target::Room(Room::seller("sel_1")));
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let hub = FanoutHub::default();
        let live = hub.publish(RoomEvent {
            target: Target::All,
            event_name: "seller:offline".into(),
            data: Value::Null,
        });
        assert_eq!(live, 0);
    }
}
