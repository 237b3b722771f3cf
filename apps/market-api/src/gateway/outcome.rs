//! Typed results of gateway handlers.
//!
//! Every handler is best-effort: a skipped notification is logged by the
//! connection loop and never propagated further.

use market_common::Room;

use crate::error::ApiError;

use super::fanout::Target;

/// One outbound event put on the broadcast hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub event: &'static str,
    pub target: Target,
}

/// Everything a handler emitted, in emission order.
#[derive(Debug, Default)]
pub struct Notified {
    pub emissions: Vec<Emission>,
}

impl Notified {
    /// Record an emission; a payload that failed to encode records nothing.
    pub fn push(&mut self, emission: Option<Emission>) {
        self.emissions.extend(emission);
    }

    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }

    /// Rooms that received `event`, in emission order.
    pub fn rooms_for(&self, event: &str) -> Vec<&Room> {
        self.emissions
            .iter()
            .filter(|e| e.event == event)
            .filter_map(|e| match &e.target {
                Target::Room(room) => Some(room),
                Target::All => None,
            })
            .collect()
    }
}

/// Why a handler sent nothing.
#[derive(Debug)]
pub enum Skipped {
    /// A correlating document does not exist.
    NotFound { kind: &'static str, id: String },
    /// The store failed; the error was already logged at the source.
    Storage(ApiError),
    /// The inbound payload did not decode.
    MalformedPayload { event: String, reason: String },
    /// The inbound event name is not routed.
    UnknownEvent(String),
    /// The handler does not apply to this principal.
    NotApplicable,
}

impl Skipped {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        Skipped::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Log the skip at a level matching its severity.
    pub fn log(&self, connection_id: &str, event: &str) {
        match self {
            Skipped::NotFound { kind, id } => {
                tracing::warn!(%connection_id, %event, %kind, %id, "notification skipped: not found");
            }
            Skipped::Storage(err) => {
                tracing::error!(%connection_id, %event, error = %err, "notification skipped: storage error");
            }
            Skipped::MalformedPayload { reason, .. } => {
                tracing::warn!(%connection_id, %event, %reason, "notification skipped: malformed payload");
            }
            Skipped::UnknownEvent(name) => {
                tracing::debug!(%connection_id, event = %name, "ignoring unknown event");
            }
            Skipped::NotApplicable => {}
        }
    }
}

impl From<ApiError> for Skipped {
    fn from(err: ApiError) -> Self {
        Skipped::Storage(err)
    }
}

pub type Outcome = Result<Notified, Skipped>;
