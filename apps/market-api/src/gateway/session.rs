//! Per-connection gateway session state.

use std::collections::HashSet;

use market_common::Room;
use parking_lot::Mutex;

use crate::auth::principal::Principal;

use super::fanout::Target;

/// State for a single WebSocket connection.
pub struct GatewaySession {
    /// Unique connection identifier (`conn_` prefixed ULID).
    pub connection_id: String,
    /// Identity established at handshake. Never changes for the connection.
    pub principal: Principal,
    /// Rooms this connection has joined. Chat rooms are joined lazily, so
    /// this grows while the connection is live.
    rooms: Mutex<HashSet<Room>>,
}

impl GatewaySession {
    pub fn new(connection_id: String, principal: Principal) -> Self {
        Self {
            connection_id,
            principal,
            rooms: Mutex::new(HashSet::new()),
        }
    }

    /// Join a room. Returns `true` if the connection was not already a member.
    pub fn join(&self, room: Room) -> bool {
        self.rooms.lock().insert(room)
    }

    pub fn is_member(&self, room: &Room) -> bool {
        self.rooms.lock().contains(room)
    }

    /// Snapshot of joined rooms, sorted for stable output.
    pub fn rooms(&self) -> Vec<Room> {
        let mut rooms: Vec<Room> = self.rooms.lock().iter().cloned().collect();
        rooms.sort();
        rooms
    }

    /// Check whether this connection should receive an event with `target`.
    pub fn should_receive(&self, target: &Target) -> bool {
        match target {
            Target::All => true,
            Target::Room(room) => self.is_member(room),
        }
    }
}
