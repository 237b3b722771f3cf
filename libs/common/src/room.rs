//! Room keys used to scope realtime broadcasts.

use std::fmt;

use serde::{Serialize, Serializer};

/// A named subscription group a connection can join.
///
/// The string form (`user:{id}`, `seller:{id}`, `chat:{id}`) is part of the
/// wire contract and is not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    /// Personal room of a user, keyed by user id.
    User(String),
    /// Seller room, keyed by the seller profile id (not the user id).
    Seller(String),
    /// Per-order chat room.
    Chat(String),
}

impl Room {
    pub fn user(id: impl Into<String>) -> Self {
        Room::User(id.into())
    }

    pub fn seller(id: impl Into<String>) -> Self {
        Room::Seller(id.into())
    }

    pub fn chat(order_id: impl Into<String>) -> Self {
        Room::Chat(order_id.into())
    }

    /// Parse a room key such as `seller:sel_123`.
    pub fn parse(key: &str) -> Option<Self> {
        let (kind, id) = key.split_once(':')?;
        if id.is_empty() {
            return None;
        }
        match kind {
            "user" => Some(Room::User(id.to_string())),
            "seller" => Some(Room::Seller(id.to_string())),
            "chat" => Some(Room::Chat(id.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user:{id}"),
            Room::Seller(id) => write!(f, "seller:{id}"),
            Room::Chat(id) => write!(f, "chat:{id}"),
        }
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
