//! Seller presence: the `is_online` flag and its platform-wide broadcasts.
//!
//! Presence is a single boolean per seller with last-writer-wins semantics.
//! Every connect sets it, every disconnect clears it; a seller with two open
//! tabs goes offline when either tab closes.

use chrono::Utc;
use market_common::protocol::{SellerOffline, SellerOnline};
use market_common::EventName;

use crate::auth::principal::Principal;
use crate::models::seller::Seller;
use crate::AppState;

use super::fanout::Target;
use super::outcome::{Notified, Outcome, Skipped};

/// Persist `is_online = true` for `seller` and broadcast `seller:online`.
pub async fn mark_online(state: &AppState, seller: &Seller) -> Outcome {
    state.store.set_seller_online(&seller.id, true).await?;

    let emission = state.gateway.emit(
        Target::All,
        EventName::SELLER_ONLINE,
        &SellerOnline {
            seller_id: seller.id.clone(),
            store_name: seller.store_name.clone(),
            timestamp: Utc::now(),
        },
    );

    tracing::info!(seller_id = %seller.id, "seller online");
    Ok(Notified {
        emissions: emission.into_iter().collect(),
    })
}

/// Handle a closed connection. Sellers are marked offline and
/// `seller:offline` is broadcast; everyone else is a no-op.
pub async fn on_disconnect(state: &AppState, principal: &Principal) -> Outcome {
    let Principal::Seller { id: user_id } = principal else {
        return Err(Skipped::NotApplicable);
    };

    let seller = state
        .store
        .seller_by_user(user_id)
        .await?
        .ok_or_else(|| Skipped::not_found("seller", user_id))?;

    state.store.set_seller_online(&seller.id, false).await?;

    let emission = state.gateway.emit(
        Target::All,
        EventName::SELLER_OFFLINE,
        &SellerOffline {
            seller_id: seller.id.clone(),
            timestamp: Utc::now(),
        },
    );

    tracing::info!(
        seller_id = %seller.id,
        other_connections = state.gateway.sessions().connections_for_user(user_id),
        "seller offline"
    );
    Ok(Notified {
        emissions: emission.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MarketStore;
    use crate::gateway::testing::{seller, test_state, unavailable_state};

    #[tokio::test]
    async fn mark_online_sets_flag_and_broadcasts_globally() {
        let (state, store) = test_state();
        let s = seller("sel_1", "usr_1", false, true);
        store.insert_seller(s.clone());
        let mut rx = state.gateway.subscribe();

        let notified = mark_online(&state, &s).await.unwrap();
        assert_eq!(notified.emissions[0].target, Target::All);
        assert!(store.seller_by_id("sel_1").await.unwrap().unwrap().is_online);

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload.event_name, EventName::SELLER_ONLINE);
        assert_eq!(payload.data["sellerId"], "sel_1");
        assert_eq!(payload.data["storeName"], "sel_1 store");
    }

    #[tokio::test]
    async fn disconnect_marks_seller_offline_once() {
        let (state, store) = test_state();
        store.insert_seller(seller("sel_1", "usr_1", true, true));
        let principal = Principal::Seller { id: "usr_1".into() };

        let notified = on_disconnect(&state, &principal).await.unwrap();
        assert_eq!(notified.len(), 1);
        assert_eq!(notified.emissions[0].event, EventName::SELLER_OFFLINE);
        assert!(!store.seller_by_id("sel_1").await.unwrap().unwrap().is_online);
    }

    #[tokio::test]
    async fn disconnect_of_customer_is_not_applicable() {
        let (state, _store) = test_state();
        let principal = Principal::Customer { id: "usr_2".into() };
        assert!(matches!(
            on_disconnect(&state, &principal).await,
            Err(Skipped::NotApplicable)
        ));
    }

    #[tokio::test]
    async fn disconnect_without_seller_profile_is_not_found() {
        let (state, _store) = test_state();
        let principal = Principal::Seller { id: "usr_x".into() };
        match on_disconnect(&state, &principal).await {
            Err(Skipped::NotFound { kind, id }) => {
                assert_eq!(kind, "seller");
                assert_eq!(id, "usr_x");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnect_with_store_failure_broadcasts_nothing() {
        let state = unavailable_state();
        let mut rx = state.gateway.subscribe();
        let principal = Principal::Seller { id: "usr_1".into() };

        assert!(matches!(
            on_disconnect(&state, &principal).await,
            Err(Skipped::Storage(_))
        ));
        assert!(rx.try_recv().is_err());
    }
}
