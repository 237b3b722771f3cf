//! Room membership for freshly authenticated connections.

use market_common::Room;

use crate::auth::principal::Principal;
use crate::AppState;

use super::outcome::{Notified, Outcome, Skipped};
use super::presence;
use super::session::GatewaySession;

/// Join a new connection to its rooms.
///
/// Every principal joins its `user:{id}` room first, unconditionally. Sellers
/// additionally resolve their seller profile, go online and join
/// `seller:{sellerId}`. A missing profile or a store failure is returned as a
/// skip; the connection keeps its user room either way.
pub async fn on_connect(state: &AppState, session: &GatewaySession) -> Outcome {
    session.join(session.principal.user_room());

    match &session.principal {
        Principal::Customer { .. } | Principal::Admin { .. } => Ok(Notified::default()),
        Principal::Seller { id: user_id } => {
            let seller = state
                .store
                .seller_by_user(user_id)
                .await?
                .ok_or_else(|| Skipped::not_found("seller", user_id))?;

            let notified = presence::mark_online(state, &seller).await?;
            session.join(Room::seller(&seller.id));

            tracing::debug!(
                connection_id = %session.connection_id,
                seller_id = %seller.id,
                "joined seller room"
            );
            Ok(notified)
        }
    }
}
