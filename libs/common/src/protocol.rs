//! Wire format shared by the gateway and its clients.
//!
//! Every frame is a JSON text message `{"event": "<name>", "data": {...}}`.
//! Payload field names are camelCase.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A single event frame, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }

    /// Build an envelope from a typed payload.
    pub fn from_payload<T: Serialize>(event: &str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self::new(event, serde_json::to_value(payload)?))
    }

    /// Decode the data field into a typed payload.
    pub fn payload<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }
}

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// Event names on the wire. Several names are used in both directions.
pub struct EventName;

impl EventName {
    pub const NEED_CREATE: &'static str = "need:create";
    pub const NEED_NEW: &'static str = "need:new";
    pub const NEED_OFFER: &'static str = "need:offer";
    pub const OFFER_SUBMIT: &'static str = "offer:submit";
    pub const OFFER_ACCEPT: &'static str = "offer:accept";
    pub const OFFER_REJECTED: &'static str = "offer:rejected";
    pub const ORDER_NEW: &'static str = "order:new";
    pub const ORDER_ASSIGN: &'static str = "order:assign";
    pub const ORDER_COMPLETE: &'static str = "order:complete";
    pub const ORDER_STATUS_CHANGED: &'static str = "order:status_changed";
    pub const CHAT_MESSAGE: &'static str = "chat:message";
    pub const CHAT_JOIN: &'static str = "chat:join";
    pub const SELLER_ONLINE: &'static str = "seller:online";
    pub const SELLER_OFFLINE: &'static str = "seller:offline";
    pub const CONNECTED: &'static str = "connected";
}

// ---------------------------------------------------------------------------
// Roles and statuses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Assigned => "assigned",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "assigned" => Ok(OrderStatus::Assigned),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedCreate {
    pub need_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSubmit {
    pub need_id: String,
    pub offer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferAccept {
    pub need_id: String,
    pub offer_id: String,
    pub order_id: String,
}

/// Used by `order:new`, `order:assign`, `order:complete` and `chat:join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRef {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSend {
    pub order_id: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Server → Client payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedNew {
    pub need_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedOffer {
    pub need_id: String,
    pub offer_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferAccepted {
    pub need_id: String,
    pub offer_id: String,
    pub order_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRejected {
    pub need_id: String,
    pub offer_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNew {
    pub order_id: String,
    pub order_number: String,
    pub customer_id: String,
    pub product_id: String,
    pub total_amount: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Payload of `order:assign` and `order:complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub order_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChanged {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub order_id: String,
    pub sender_id: String,
    pub sender_role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOnline {
    pub seller_id: String,
    pub store_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOffline {
    pub seller_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Sent once to a connection after its rooms are joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    pub connection_id: String,
    pub user_id: String,
    pub role: Role,
    pub rooms: Vec<String>,
}
