//! Realtime gateway: authenticated WebSocket connections, room membership,
//! event routing and seller presence.

pub mod fanout;
pub mod membership;
pub mod outcome;
pub mod presence;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use fanout::{FanoutHub, RoomEvent, Target};
use outcome::Emission;
use registry::SessionRegistry;

/// The realtime server object. Created once at startup and shared through
/// `AppState`, so HTTP handlers emit through the same hub as socket handlers.
#[derive(Default)]
pub struct Gateway {
    hub: FanoutHub,
    sessions: SessionRegistry,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RoomEvent>> {
        self.hub.subscribe()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Serialize `payload` and put it on the hub for `target`.
    ///
    /// Returns `None` when the payload fails to encode; nothing is published.
    pub fn emit<T: Serialize>(
        &self,
        target: Target,
        event: &'static str,
        payload: &T,
    ) -> Option<Emission> {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(%event, error = %e, "failed to encode event payload");
                return None;
            }
        };
        self.hub.publish(RoomEvent {
            target: target.clone(),
            event_name: event.to_string(),
            data,
        });
        Some(Emission { event, target })
    }
}
