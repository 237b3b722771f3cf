//! The authenticated identity attached to a connection or request.

use market_common::{Role, Room};

/// Closed set of marketplace principals. Role-specific behaviour (which
/// rooms to join, whether presence is tracked) matches on this instead of
/// comparing role strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Customer { id: String },
    Seller { id: String },
    Admin { id: String },
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        let id = user_id.into();
        match role {
            Role::Customer => Principal::Customer { id },
            Role::Seller => Principal::Seller { id },
            Role::Admin => Principal::Admin { id },
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Principal::Customer { id } | Principal::Seller { id } | Principal::Admin { id } => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Customer { .. } => Role::Customer,
            Principal::Seller { .. } => Role::Seller,
            Principal::Admin { .. } => Role::Admin,
        }
    }

    /// The personal room every connection of this user joins.
    pub fn user_room(&self) -> Room {
        Room::user(self.user_id())
    }
}
