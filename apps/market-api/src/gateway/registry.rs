//! Registry of live gateway connections.

use std::sync::Arc;

use dashmap::DashMap;
use market_common::Room;

use super::session::GatewaySession;

/// Shared registry of all live gateway sessions, keyed by connection id.
///
/// Uses `DashMap` for shard-level concurrency; per-session room sets are
/// guarded inside [`GatewaySession`].
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<GatewaySession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection after a successful handshake.
    pub fn register(&self, session: Arc<GatewaySession>) {
        self.sessions.insert(session.connection_id.clone(), session);
    }

    /// Remove a connection. Returns the session if it was registered.
    pub fn remove(&self, connection_id: &str) -> Option<Arc<GatewaySession>> {
        self.sessions.remove(connection_id).map(|(_, s)| s)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Connection ids currently joined to `room`, sorted.
    pub fn connections_in(&self, room: &Room) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_member(room))
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of live connections authenticated as `user_id`.
    pub fn connections_for_user(&self, user_id: &str) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().principal.user_id() == user_id)
            .count()
    }
}
